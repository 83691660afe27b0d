use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Формат вывода логов
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Человекочитаемый, для разработки
    Pretty,
    /// Один JSON объект на строку, для production
    Json,
}

/// Logging setup shared by binaries and test suites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level when `RUST_LOG` is not set (`error` .. `trace`)
    pub level: String,
    pub format: LogFormat,
    /// Colored output (pretty format only)
    pub color_output: bool,
    pub include_line_numbers: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            color_output: true,
            include_line_numbers: cfg!(debug_assertions),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> anyhow::Result<Level> {
        self.level
            .parse::<Level>()
            .map_err(|_| anyhow::anyhow!("Invalid log level: {}", self.level))
    }

    fn env_filter(&self) -> anyhow::Result<EnvFilter> {
        let level = self.level()?;
        Ok(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase())))
    }
}

/// Инициализация глобального subscriber. `RUST_LOG` приоритетнее
/// `config.level`. Ошибка, если subscriber уже установлен.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = config.env_filter()?;

    match config.format {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_line_number(config.include_line_numbers);

            let subscriber = Registry::default().with(env_filter).with(json_layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_line_number(config.include_line_numbers)
                .with_ansi(config.color_output)
                .with_span_events(FmtSpan::CLOSE);

            let subscriber = Registry::default().with(env_filter).with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

/// Debug-level logging captured by the test harness. Safe to call from
/// every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

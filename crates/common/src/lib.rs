//! Pieces shared by every crate in the workspace.

pub mod logging;

pub use logging::{init_logging, init_test_logging, LogFormat, LoggingConfig};

use std::{collections::HashMap, sync::Arc};

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::factory::Value;

/// Singleton cache по идентификаторам.
///
/// Кроме самих экземпляров кэш выдаёт один construction guard на
/// идентификатор. Resolver держит guard, пока перепроверяет кэш и строит
/// значение: параллельные первые lookup'ы одного id создают его один раз,
/// несвязанные идентификаторы друг друга не блокируют.
pub struct InstanceCache {
    instances: RwLock<HashMap<String, Value>>,
    guards: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    stats: RwLock<CacheStats>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub stores: u64,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            guards: Mutex::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
        }
    }

    pub fn has_instance(&self, id: &str) -> bool {
        self.instances.read().contains_key(id)
    }

    /// Кэшированное значение для `id`, считается как cache hit.
    pub fn get_instance(&self, id: &str) -> Option<Value> {
        let cached = self.instances.read().get(id).cloned();
        if cached.is_some() {
            self.stats.write().hits += 1;
            debug!(service = id, "Singleton cache hit");
        }
        cached
    }

    /// Кэшированное значение без изменения статистики.
    pub fn peek(&self, id: &str) -> Option<Value> {
        self.instances.read().get(id).cloned()
    }

    /// Сохраняет `value`, если экземпляра ещё нет. Возвращает то, что лежит в кэше.
    pub fn store(&self, id: &str, value: Value) -> Value {
        let mut instances = self.instances.write();
        let cached = instances
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(service = id, "Cached as singleton");
                value
            })
            .clone();
        self.stats.write().stores += 1;
        cached
    }

    /// Construction guard для `id`, создаётся при первом обращении.
    pub fn construction_guard(&self, id: &str) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock();
        Arc::clone(guards.entry(id.to_string()).or_default())
    }

    pub fn guard_count(&self) -> usize {
        self.guards.lock().len()
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.read()
    }
}

impl Default for InstanceCache {
    fn default() -> Self {
        Self::new()
    }
}

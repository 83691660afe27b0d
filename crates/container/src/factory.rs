use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::container::Container;

/// Type-erased service value. Identity is `Arc::ptr_eq`.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Factory function producing a service from the container.
pub type Factory = Arc<dyn Fn(&Container) -> anyhow::Result<Value> + Send + Sync>;

/// Component lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// One instance per container, created on first lookup
    #[default]
    Singleton,
    /// New instance on every lookup, never cached
    Transient,
}

/// Wrap a typed factory closure into a [`Factory`].
pub fn factory<T, F>(f: F) -> Factory
where
    T: Any + Send + Sync,
    F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
{
    Arc::new(move |container| {
        let instance = f(container)?;
        Ok(Arc::new(instance) as Value)
    })
}

/// A registered factory together with its lifetime.
#[derive(Clone)]
pub struct Registration {
    pub factory: Factory,
    pub lifetime: Lifetime,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

/// One entry of a bulk registration.
///
/// Bootstrap code that assembles services from loosely typed sources may end
/// up with a plain value where a factory was expected; such entries are
/// rejected by [`Container::set_multiple`].
pub enum ServiceEntry {
    Factory(Factory),
    Value(Value),
}

impl ServiceEntry {
    pub fn factory<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        ServiceEntry::Factory(factory(f))
    }

    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        ServiceEntry::Value(Arc::new(value))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, ServiceEntry::Factory(_))
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceEntry::Factory(_) => f.write_str("ServiceEntry::Factory(..)"),
            ServiceEntry::Value(_) => f.write_str("ServiceEntry::Value(..)"),
        }
    }
}

/// Identifier -> factory mapping. Entries are overwritten, never removed.
#[derive(Debug, Default)]
pub struct FactoryRegistry {
    factories: HashMap<String, Registration>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a registration, returning `true` if it replaced an existing one.
    pub fn insert(&mut self, id: String, registration: Registration) -> bool {
        self.factories.insert(id, registration).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&Registration> {
        self.factories.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

use std::{
    any::{type_name, Any},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::{
    binding::BindingMap,
    builder::ContainerBuilder,
    cache::InstanceCache,
    config::ContainerConfig,
    errors::{ContainerError, ContainerResult},
    factory::{factory, Factory, FactoryRegistry, Lifetime, Registration, ServiceEntry, Value},
    registry::{Arguments, ConstructorParameter, StaticTypeRegistry, TypeRegistry},
    resolution::ResolutionFrame,
};

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Factories и bindings под одним lock: lookup не видит наполовину
/// применённую регистрацию.
#[derive(Debug, Default)]
pub(crate) struct Registrations {
    pub(crate) factories: FactoryRegistry,
    pub(crate) bindings: BindingMap,
}

/// How an uncached identifier is going to be produced.
enum Plan {
    Factory(Registration),
    Binding(String),
    Autowire,
    Missing,
}

#[derive(Debug, Default, Clone, Copy)]
struct ResolutionCounters {
    total: u64,
    failed: u64,
}

/// Статистика контейнера для диагностики
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStats {
    pub name: String,
    pub registered_factories: usize,
    pub bindings: usize,
    pub cached_instances: usize,
    pub total_resolutions: u64,
    pub failed_resolutions: u64,
    pub cache_hits: u64,
    pub construction_guards: usize,
}

/// Service container.
///
/// Lookup order for an identifier: singleton cache, registered factory,
/// binding (followed recursively), autowiring through the type registry.
/// Every non-transient result is cached under the identifier that was asked
/// for, and the cache wins over any later registration.
///
/// The container is `Send + Sync`; share it by reference or `Arc`.
pub struct Container {
    id: u64,
    config: ContainerConfig,
    registrations: RwLock<Registrations>,
    cache: InstanceCache,
    types: Arc<dyn TypeRegistry>,
    counters: RwLock<ResolutionCounters>,
}

impl Container {
    /// Empty container with default configuration and no known types.
    pub fn new() -> Self {
        Self::from_parts(ContainerConfig::default(), Arc::new(StaticTypeRegistry::new()))
    }

    /// Empty container autowiring through `registry`.
    pub fn with_type_registry<R>(registry: R) -> Self
    where
        R: TypeRegistry + 'static,
    {
        Self::from_parts(ContainerConfig::default(), Arc::new(registry))
    }

    /// Container pre-populated through [`set_multiple`](Self::set_multiple).
    pub fn with_services<I, S>(services: I) -> ContainerResult<Self>
    where
        I: IntoIterator<Item = (S, ServiceEntry)>,
        S: Into<String>,
    {
        let container = Self::new();
        container.set_multiple(services)?;
        Ok(container)
    }

    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn from_parts(config: ContainerConfig, types: Arc<dyn TypeRegistry>) -> Self {
        let container = Self {
            id: NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed),
            config,
            registrations: RwLock::new(Registrations::default()),
            cache: InstanceCache::new(),
            types,
            counters: RwLock::new(ResolutionCounters::default()),
        };
        info!(container = %container.config.name, "Container created");
        container
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn type_registry(&self) -> &Arc<dyn TypeRegistry> {
        &self.types
    }

    /// Register a singleton factory for `id`, replacing any previous factory.
    ///
    /// An instance already cached for `id` is not affected.
    pub fn set<T, F>(&self, id: impl Into<String>, f: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.set_factory(id, factory(f), Lifetime::Singleton);
    }

    pub fn set_with_lifetime<T, F>(&self, id: impl Into<String>, f: F, lifetime: Lifetime)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.set_factory(id, factory(f), lifetime);
    }

    /// Register an already type-erased factory.
    pub fn set_factory(&self, id: impl Into<String>, factory: Factory, lifetime: Lifetime) {
        let id = id.into();
        let replaced = self
            .registrations
            .write()
            .factories
            .insert(id.clone(), Registration { factory, lifetime });

        if replaced && self.config.warn_on_overwrite {
            warn!(service = %id, "Service is already registered, overwriting");
        }
        debug!(service = %id, ?lifetime, "Registered factory");
    }

    /// Register many services in iteration order.
    ///
    /// Stops at the first entry that is not callable and reports it as
    /// `NotCallable`; entries before it stay registered, entries after it
    /// are not registered.
    pub fn set_multiple<I, S>(&self, services: I) -> ContainerResult<()>
    where
        I: IntoIterator<Item = (S, ServiceEntry)>,
        S: Into<String>,
    {
        for (id, entry) in services {
            let id = id.into();
            match entry {
                ServiceEntry::Factory(factory) => {
                    self.set_factory(id, factory, Lifetime::Singleton)
                }
                ServiceEntry::Value(_) => {
                    warn!(service = %id, "Rejected non-callable service entry");
                    return Err(ContainerError::not_callable(id));
                }
            }
        }
        Ok(())
    }

    /// Bind an abstract identifier to a concrete name. Not validated here.
    pub fn bind(&self, abstract_id: impl Into<String>, concrete: impl Into<String>) {
        let abstract_id = abstract_id.into();
        let concrete = concrete.into();
        debug!(from = %abstract_id, to = %concrete, "Bound");
        self.registrations.write().bindings.bind(abstract_id, concrete);
    }

    /// Whether `id` can be looked up: cached, registered, bound, or a known
    /// type. Never constructs anything.
    pub fn has(&self, id: &str) -> bool {
        if self.cache.has_instance(id) {
            return true;
        }
        {
            let registrations = self.registrations.read();
            if registrations.factories.contains(id) || registrations.bindings.contains(id) {
                return true;
            }
        }
        self.types.contains(id)
    }

    /// Resolve `id`.
    pub fn get(&self, id: &str) -> ContainerResult<Value> {
        if let Some(instance) = self.cache.get_instance(id) {
            self.record(true);
            return Ok(instance);
        }

        let result = ResolutionFrame::enter(self.id, id, self.config.max_resolution_depth)
            .and_then(|_frame| self.lookup(id));

        match &result {
            Ok(_) => debug!(service = id, "Resolved"),
            Err(e) => debug!(service = id, category = e.category(), error = %e, "Resolution failed"),
        }
        self.record(result.is_ok());
        result
    }

    /// Resolve `id` and downcast it to `T`.
    pub fn get_as<T>(&self, id: &str) -> ContainerResult<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.get(id)?
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch(id, type_name::<T>()))
    }

    /// Resolve `id`, logging and discarding any failure.
    pub fn try_get(&self, id: &str) -> Option<Value> {
        match self.get(id) {
            Ok(instance) => Some(instance),
            Err(e) => {
                debug!(service = id, error = %e, "Failed to resolve optional service");
                None
            }
        }
    }

    /// Cached instance for `id`, if any. Does not construct.
    pub fn instance(&self, id: &str) -> Option<Value> {
        self.cache.peek(id)
    }

    /// All identifiers with a factory or binding, sorted.
    pub fn registered_ids(&self) -> Vec<String> {
        let registrations = self.registrations.read();
        let mut ids: Vec<String> = registrations
            .factories
            .ids()
            .chain(registrations.bindings.iter().map(|(from, _)| from))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn stats(&self) -> ContainerStats {
        let (registered_factories, bindings) = {
            let registrations = self.registrations.read();
            (registrations.factories.len(), registrations.bindings.len())
        };
        let counters = *self.counters.read();

        ContainerStats {
            name: self.config.name.clone(),
            registered_factories,
            bindings,
            cached_instances: self.cache.len(),
            total_resolutions: counters.total,
            failed_resolutions: counters.failed,
            cache_hits: self.cache.stats().hits,
            construction_guards: self.cache.guard_count(),
        }
    }

    pub(crate) fn registrations(&self) -> parking_lot::RwLockReadGuard<'_, Registrations> {
        self.registrations.read()
    }

    fn record(&self, success: bool) {
        let mut counters = self.counters.write();
        counters.total += 1;
        if !success {
            counters.failed += 1;
        }
    }

    fn plan(&self, id: &str) -> Plan {
        let registrations = self.registrations.read();
        if let Some(registration) = registrations.factories.get(id) {
            Plan::Factory(registration.clone())
        } else if let Some(concrete) = registrations.bindings.target(id) {
            Plan::Binding(concrete.to_string())
        } else if self.types.contains(id) {
            Plan::Autowire
        } else {
            Plan::Missing
        }
    }

    fn lookup(&self, id: &str) -> ContainerResult<Value> {
        // Guard создаётся только для id, которые есть чем произвести.
        match self.plan(id) {
            Plan::Missing => return Err(ContainerError::not_found(id)),
            Plan::Factory(registration) if registration.lifetime == Lifetime::Transient => {
                return self.invoke(id, &registration.factory);
            }
            _ => {}
        }

        let guard = self.cache.construction_guard(id);
        let _constructing = guard.lock();

        if let Some(instance) = self.cache.peek(id) {
            debug!(service = id, "Constructed concurrently, using cached instance");
            return Ok(instance);
        }

        let instance = match self.plan(id) {
            Plan::Factory(registration) => {
                let instance = self.invoke(id, &registration.factory)?;
                if registration.lifetime == Lifetime::Transient {
                    return Ok(instance);
                }
                instance
            }
            Plan::Binding(concrete) => {
                debug!(service = id, concrete = %concrete, "Following binding");
                self.get(&concrete)?
            }
            Plan::Autowire => self.autowire(id)?,
            Plan::Missing => return Err(ContainerError::not_found(id)),
        };

        Ok(self.cache.store(id, instance))
    }

    fn invoke(&self, id: &str, factory: &Factory) -> ContainerResult<Value> {
        debug!(service = id, "Invoking factory");
        factory(self).map_err(|e| ContainerError::from_factory(id, e))
    }

    fn autowire(&self, type_name: &str) -> ContainerResult<Value> {
        let instantiable = self
            .types
            .is_instantiable(type_name)
            .map_err(|e| ContainerError::reflection(type_name, e))?;
        if !instantiable {
            return Err(ContainerError::not_instantiable(type_name));
        }

        let parameters = self
            .types
            .constructor_parameters(type_name)
            .map_err(|e| ContainerError::reflection(type_name, e))?;

        let arguments = match parameters {
            None => Arguments::empty(type_name),
            Some(parameters) => {
                let mut values = Vec::with_capacity(parameters.len());
                for parameter in &parameters {
                    values.push(self.resolve_parameter(type_name, parameter)?);
                }
                Arguments::new(type_name, values)
            }
        };

        debug!(service = type_name, arguments = arguments.len(), "Autowiring");
        self.types
            .instantiate(type_name, arguments)
            .map_err(|e| ContainerError::reflection(type_name, e))
    }

    fn resolve_parameter(
        &self,
        declaring_type: &str,
        parameter: &ConstructorParameter,
    ) -> ContainerResult<Value> {
        if let Some(dependency) = parameter.dependency() {
            return self.get(dependency);
        }
        if let Some(default) = parameter.default_value() {
            return Ok(Arc::clone(default));
        }
        Err(ContainerError::unresolvable_parameter(
            parameter.name(),
            declaring_type,
        ))
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.config.name)
            .field("registrations", &*self.registrations.read())
            .field("cached_instances", &self.cache.len())
            .finish_non_exhaustive()
    }
}

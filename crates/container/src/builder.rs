use std::sync::Arc;

use crate::{
    config::ContainerConfig,
    container::Container,
    errors::ContainerResult,
    factory::ServiceEntry,
    registry::{StaticTypeRegistry, TypeDescriptor, TypeRegistry},
};

/// Step-by-step construction of a [`Container`].
///
/// Types added with [`with_type`](Self::with_type) go into a
/// [`StaticTypeRegistry`]; [`with_type_registry`](Self::with_type_registry)
/// replaces it with a custom implementation.
pub struct ContainerBuilder {
    config: ContainerConfig,
    types: StaticTypeRegistry,
    custom_types: Option<Arc<dyn TypeRegistry>>,
    services: Vec<(String, ServiceEntry)>,
    bindings: Vec<(String, String)>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
            types: StaticTypeRegistry::new(),
            custom_types: None,
            services: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.types.register(descriptor);
        self
    }

    pub fn with_type_registry<R>(mut self, registry: R) -> Self
    where
        R: TypeRegistry + 'static,
    {
        self.custom_types = Some(Arc::new(registry));
        self
    }

    pub fn with_service(mut self, id: impl Into<String>, entry: ServiceEntry) -> Self {
        self.services.push((id.into(), entry));
        self
    }

    pub fn with_binding(mut self, abstract_id: impl Into<String>, concrete: impl Into<String>) -> Self {
        self.bindings.push((abstract_id.into(), concrete.into()));
        self
    }

    /// Build the container; fails on the first non-callable service entry.
    pub fn build(self) -> ContainerResult<Container> {
        let types = match self.custom_types {
            Some(custom) => custom,
            None => Arc::new(self.types),
        };

        let container = Container::from_parts(self.config, types);
        container.set_multiple(self.services)?;
        for (abstract_id, concrete) in self.bindings {
            container.bind(abstract_id, concrete);
        }
        Ok(container)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Service container with lazy singleton factories, abstract-to-concrete
//! bindings and constructor autowiring.
//!
//! ```
//! use container::{ConstructorParameter, Container, TypeDescriptor, StaticTypeRegistry};
//!
//! struct Widget {
//!     name: String,
//! }
//!
//! let types = StaticTypeRegistry::new().with(
//!     TypeDescriptor::concrete("Widget", |args| {
//!         Ok(Widget { name: args.cloned::<String>(0)? })
//!     })
//!     .parameter(ConstructorParameter::builtin("name", "string").with_default("default".to_string())),
//! );
//!
//! let container = Container::with_type_registry(types);
//! let widget = container.get_as::<Widget>("Widget").unwrap();
//! assert_eq!(widget.name, "default");
//! ```

pub mod binding;
pub mod builder;
pub mod cache;
pub mod config;
pub mod container;
pub mod errors;
pub mod factory;
pub mod registry;
mod resolution;
pub mod validation;

pub use binding::BindingMap;
pub use builder::ContainerBuilder;
pub use cache::{CacheStats, InstanceCache};
pub use config::ContainerConfig;
pub use container::{Container, ContainerStats};
pub use errors::{ContainerContextExt, ContainerError, ContainerResult, ErrorKind, RegistryError};
pub use factory::{factory, Factory, FactoryRegistry, Lifetime, Registration, ServiceEntry, Value};
pub use registry::{
    Arguments, Constructor, ConstructorParameter, ParameterType, StaticTypeRegistry,
    TypeDescriptor, TypeRegistry,
};
pub use validation::{ValidationIssue, ValidationReport};

//! Type registry capability used for autowiring.
//!
//! Rust has no runtime reflection, so constructor metadata is supplied
//! explicitly: a [`TypeRegistry`] answers "is this type known, is it
//! instantiable, what does its constructor take" and builds instances from
//! already resolved arguments. [`StaticTypeRegistry`] is the hand-written
//! table implementation; other implementations (generated tables, plugin
//! registries) can be plugged into the container through the trait.

use std::{
    any::{type_name, Any},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use tracing::debug;

use crate::{errors::RegistryError, factory::Value};

/// Declared type of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// No declared type
    Untyped,
    /// Built-in/primitive type such as `string` or `int`; never looked up
    Builtin(String),
    /// Named service or class type, resolved through the container
    Named(String),
}

/// Read-only description of one constructor parameter.
#[derive(Debug, Clone)]
pub struct ConstructorParameter {
    name: String,
    ty: ParameterType,
    default: Option<Value>,
}

impl ConstructorParameter {
    /// Parameter whose type is resolved by the container.
    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Named(type_name.into()),
            default: None,
        }
    }

    pub fn builtin(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Builtin(type_name.into()),
            default: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParameterType::Untyped,
            default: None,
        }
    }

    pub fn with_default<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.default = Some(Arc::new(value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_type(&self) -> &ParameterType {
        &self.ty
    }

    /// Type name to resolve through the container, if any.
    pub fn dependency(&self) -> Option<&str> {
        match &self.ty {
            ParameterType::Named(name) => Some(name),
            ParameterType::Untyped | ParameterType::Builtin(_) => None,
        }
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Resolved constructor arguments, in declaration order.
#[derive(Debug)]
pub struct Arguments {
    type_name: String,
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(type_name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            type_name: type_name.into(),
            values,
        }
    }

    pub fn empty(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed access to the argument at `index`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, RegistryError> {
        let value = self.raw(index)?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| RegistryError::ArgumentType {
                type_name: self.type_name.clone(),
                index,
                expected: type_name::<T>().to_string(),
            })
    }

    /// Clone of the argument at `index`, for `Clone` payloads such as defaults.
    pub fn cloned<T: Any + Send + Sync + Clone>(&self, index: usize) -> Result<T, RegistryError> {
        self.get::<T>(index).map(|value| (*value).clone())
    }

    pub fn raw(&self, index: usize) -> Result<&Value, RegistryError> {
        self.values
            .get(index)
            .ok_or_else(|| RegistryError::MissingArgument {
                type_name: self.type_name.clone(),
                index,
            })
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Builds an instance from resolved arguments.
pub type Constructor = Arc<dyn Fn(&Arguments) -> anyhow::Result<Value> + Send + Sync>;

/// Introspection and instantiation of named types.
pub trait TypeRegistry: Send + Sync {
    /// Whether `type_name` names a known type (instantiable or not).
    fn contains(&self, type_name: &str) -> bool;

    fn is_instantiable(&self, type_name: &str) -> Result<bool, RegistryError>;

    /// Declared constructor parameters; `None` when the type declares no
    /// constructor and is built without arguments.
    fn constructor_parameters(
        &self,
        type_name: &str,
    ) -> Result<Option<Vec<ConstructorParameter>>, RegistryError>;

    fn instantiate(&self, type_name: &str, arguments: Arguments) -> Result<Value, RegistryError>;

    /// Names of all known types.
    fn type_names(&self) -> Vec<String>;
}

/// Constructor metadata for one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    name: String,
    parameters: Option<Vec<ConstructorParameter>>,
    constructor: Option<Constructor>,
}

impl TypeDescriptor {
    /// Concrete type without a declared constructor.
    pub fn concrete<T, F>(name: impl Into<String>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: None,
            constructor: Some(Arc::new(move |args| {
                let instance = build(args)?;
                Ok(Arc::new(instance) as Value)
            })),
        }
    }

    /// Abstract or interface-like type: known, but never instantiated.
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: None,
            constructor: None,
        }
    }

    /// Declare the next constructor parameter.
    pub fn parameter(mut self, parameter: ConstructorParameter) -> Self {
        self.parameters.get_or_insert_with(Vec::new).push(parameter);
        self
    }

    /// Declare an empty constructor, as opposed to no constructor at all.
    pub fn with_empty_constructor(mut self) -> Self {
        self.parameters.get_or_insert_with(Vec::new);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> Option<&[ConstructorParameter]> {
        self.parameters.as_deref()
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("instantiable", &self.is_instantiable())
            .finish()
    }
}

/// Hand-written constructor-metadata table.
#[derive(Debug, Default, Clone)]
pub struct StaticTypeRegistry {
    types: HashMap<String, TypeDescriptor>,
}

impl StaticTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the descriptor for its type name.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        debug!(type_name = descriptor.name(), "Registered type descriptor");
        self.types.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn descriptor(&self, type_name: &str) -> Result<&TypeDescriptor, RegistryError> {
        self.types
            .get(type_name)
            .ok_or_else(|| RegistryError::UnknownType {
                type_name: type_name.to_string(),
            })
    }
}

impl TypeRegistry for StaticTypeRegistry {
    fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn is_instantiable(&self, type_name: &str) -> Result<bool, RegistryError> {
        Ok(self.descriptor(type_name)?.is_instantiable())
    }

    fn constructor_parameters(
        &self,
        type_name: &str,
    ) -> Result<Option<Vec<ConstructorParameter>>, RegistryError> {
        Ok(self.descriptor(type_name)?.parameters.clone())
    }

    fn instantiate(&self, type_name: &str, arguments: Arguments) -> Result<Value, RegistryError> {
        let descriptor = self.descriptor(type_name)?;
        let constructor = descriptor
            .constructor
            .as_ref()
            .ok_or_else(|| RegistryError::Abstract {
                type_name: type_name.to_string(),
            })?;

        let expected = descriptor.parameters.as_ref().map_or(0, Vec::len);
        if arguments.len() != expected {
            return Err(RegistryError::ArityMismatch {
                type_name: type_name.to_string(),
                expected,
                actual: arguments.len(),
            });
        }

        constructor(&arguments).map_err(|e| RegistryError::Construction {
            type_name: type_name.to_string(),
            message: format!("{e:#}"),
        })
    }

    fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Widget {
        name: String,
    }

    fn widget_descriptor() -> TypeDescriptor {
        TypeDescriptor::concrete("Widget", |args| {
            Ok(Widget {
                name: args.cloned::<String>(0)?,
            })
        })
        .parameter(ConstructorParameter::builtin("name", "string").with_default("default".to_string()))
    }

    #[test]
    fn test_descriptor_metadata() {
        let registry = StaticTypeRegistry::new().with(widget_descriptor());

        assert!(registry.contains("Widget"));
        assert!(registry.is_instantiable("Widget").unwrap());

        let params = registry.constructor_parameters("Widget").unwrap().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name(), "name");
        assert_eq!(params[0].dependency(), None);
        assert!(params[0].has_default());
    }

    #[test]
    fn test_instantiate_checks_arity() {
        let registry = StaticTypeRegistry::new().with(widget_descriptor());

        let err = registry
            .instantiate("Widget", Arguments::empty("Widget"))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ArityMismatch {
                type_name: "Widget".into(),
                expected: 1,
                actual: 0,
            }
        );

        let value = registry
            .instantiate(
                "Widget",
                Arguments::new("Widget", vec![Arc::new("custom".to_string())]),
            )
            .unwrap();
        let widget = value.downcast::<Widget>().unwrap();
        assert_eq!(widget.name, "custom");
    }

    #[test]
    fn test_abstract_type() {
        let registry = StaticTypeRegistry::new().with(TypeDescriptor::abstract_type("Service"));

        assert!(registry.contains("Service"));
        assert!(!registry.is_instantiable("Service").unwrap());
        assert!(matches!(
            registry.instantiate("Service", Arguments::empty("Service")),
            Err(RegistryError::Abstract { .. })
        ));
    }

    #[test]
    fn test_unknown_type() {
        let registry = StaticTypeRegistry::new();
        assert!(!registry.contains("Ghost"));
        assert!(matches!(
            registry.is_instantiable("Ghost"),
            Err(RegistryError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_argument_type_mismatch() {
        let args = Arguments::new("Widget", vec![Arc::new(7_i64)]);
        let err = args.get::<String>(0).unwrap_err();
        assert!(matches!(err, RegistryError::ArgumentType { index: 0, .. }));
        assert!(matches!(
            args.get::<i64>(1),
            Err(RegistryError::MissingArgument { index: 1, .. })
        ));
    }
}

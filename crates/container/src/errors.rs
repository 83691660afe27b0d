//! Error handling for the container.
//!
//! Every failure a lookup can produce is a [`ContainerError`]. Variants are
//! grouped into three [`ErrorKind`]s:
//!
//! - **NotFound**: the identifier has no cached instance, no factory, no
//!   binding and does not name a known type.
//! - **ResolutionFailure**: registration or construction went wrong (a
//!   non-callable bulk entry, an abstract type, an unresolvable constructor
//!   parameter, a failing factory or type registry).
//! - **CyclicDependency**: an identifier was re-entered before its own
//!   construction finished.
//!
//! A chain that only gets too deep is `DepthExceeded`, a ResolutionFailure.
//!
//! Errors raised by nested lookups propagate unchanged, so the caller of the
//! top-level `get` sees the deepest failing identifier.

use anyhow::Context;
use thiserror::Error;

/// Semantic classification of a [`ContainerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ResolutionFailure,
    CyclicDependency,
}

/// Main error type of every container operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// Nothing knows how to produce the identifier
    #[error("Service [{id}] not found in the container")]
    NotFound { id: String },

    /// Bulk registration received an entry that cannot be invoked
    #[error("Service [{id}] must be a callable")]
    NotCallable { id: String },

    /// The type registry reports the type as abstract
    #[error("Type [{type_name}] is not instantiable")]
    NotInstantiable { type_name: String },

    /// Constructor parameter with no resolvable type and no default
    #[error("Cannot resolve dependency [{parameter}] for parameter [{declaring_type}:{parameter}]")]
    UnresolvableParameter {
        parameter: String,
        declaring_type: String,
    },

    /// The type registry itself failed while introspecting or instantiating
    #[error("Cannot resolve service [{id}]: {message}")]
    Reflection { id: String, message: String },

    /// A registered factory returned an error
    #[error("Factory for service [{id}] failed: {message}")]
    FactoryFailed { id: String, message: String },

    /// Typed access asked for a type the cached value does not have
    #[error("Service [{id}] is not of type {expected}")]
    TypeMismatch { id: String, expected: String },

    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// Resolution chain grew past the configured depth without repeating an id
    #[error("Resolution depth limit {limit} exceeded: {}", .chain.join(" -> "))]
    DepthExceeded { chain: Vec<String>, limit: usize },
}

impl ContainerError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn not_callable(id: impl Into<String>) -> Self {
        Self::NotCallable { id: id.into() }
    }

    pub fn not_instantiable(type_name: impl Into<String>) -> Self {
        Self::NotInstantiable {
            type_name: type_name.into(),
        }
    }

    pub fn unresolvable_parameter(
        parameter: impl Into<String>,
        declaring_type: impl Into<String>,
    ) -> Self {
        Self::UnresolvableParameter {
            parameter: parameter.into(),
            declaring_type: declaring_type.into(),
        }
    }

    /// Wrap a type registry failure with the identifier being resolved.
    pub fn reflection(id: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Reflection {
            id: id.into(),
            message: source.to_string(),
        }
    }

    /// Convert a factory failure.
    ///
    /// A factory that propagated a `ContainerError` from a nested lookup keeps
    /// that error as-is; anything else is wrapped with the factory's id.
    pub fn from_factory(id: &str, error: anyhow::Error) -> Self {
        match error.downcast_ref::<ContainerError>() {
            Some(inner) => inner.clone(),
            None => Self::FactoryFailed {
                id: id.to_string(),
                message: format!("{error:#}"),
            },
        }
    }

    pub fn type_mismatch(id: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected: expected.into(),
        }
    }

    pub fn cyclic(chain: Vec<String>) -> Self {
        Self::CyclicDependency { chain }
    }

    pub fn depth_exceeded(chain: Vec<String>, limit: usize) -> Self {
        Self::DepthExceeded { chain, limit }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            Self::NotCallable { .. }
            | Self::NotInstantiable { .. }
            | Self::UnresolvableParameter { .. }
            | Self::Reflection { .. }
            | Self::FactoryFailed { .. }
            | Self::TypeMismatch { .. }
            | Self::DepthExceeded { .. } => ErrorKind::ResolutionFailure,
        }
    }

    /// Short machine-friendly category, used as a structured log field.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::NotCallable { .. } => "registration",
            Self::NotInstantiable { .. } => "not_instantiable",
            Self::UnresolvableParameter { .. } => "parameter",
            Self::Reflection { .. } => "reflection",
            Self::FactoryFailed { .. } => "factory",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::CyclicDependency { .. } => "cycle",
            Self::DepthExceeded { .. } => "depth",
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The identifier (or type name) the error is about, if it names one.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Self::NotFound { id }
            | Self::NotCallable { id }
            | Self::Reflection { id, .. }
            | Self::FactoryFailed { id, .. }
            | Self::TypeMismatch { id, .. } => Some(id),
            Self::NotInstantiable { type_name } => Some(type_name),
            Self::UnresolvableParameter { declaring_type, .. } => Some(declaring_type),
            Self::CyclicDependency { chain } | Self::DepthExceeded { chain, .. } => {
                chain.first().map(String::as_str)
            }
        }
    }
}

/// Result alias for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Failures reported by a [`TypeRegistry`](crate::registry::TypeRegistry).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown type {type_name}")]
    UnknownType { type_name: String },

    #[error("type {type_name} is abstract")]
    Abstract { type_name: String },

    #[error("{type_name} expects {expected} constructor arguments, got {actual}")]
    ArityMismatch {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("{type_name}: argument #{index} is missing")]
    MissingArgument { type_name: String, index: usize },

    #[error("{type_name}: argument #{index} is not of type {expected}")]
    ArgumentType {
        type_name: String,
        index: usize,
        expected: String,
    },

    #[error("constructor of {type_name} failed: {message}")]
    Construction { type_name: String, message: String },
}

/// Helper trait adding container context to anyhow errors.
pub trait ContainerContextExt<T> {
    fn container_context(self, message: &str) -> anyhow::Result<T>;
    fn container_with_context<F>(self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ContainerContextExt<T> for ContainerResult<T> {
    fn container_context(self, message: &str) -> anyhow::Result<T> {
        self.map_err(anyhow::Error::from)
            .with_context(|| message.to_string())
    }

    fn container_with_context<F>(self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(anyhow::Error::from).with_context(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ContainerError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(
            ContainerError::not_callable("b").kind(),
            ErrorKind::ResolutionFailure
        );
        assert_eq!(
            ContainerError::cyclic(vec!["a".into(), "a".into()]).kind(),
            ErrorKind::CyclicDependency
        );
        assert_eq!(
            ContainerError::depth_exceeded(vec!["a".into(), "b".into()], 1).kind(),
            ErrorKind::ResolutionFailure
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let error = ContainerError::unresolvable_parameter("unresolvable", "Unresolvable");
        let message = error.to_string();
        assert!(message.contains("[unresolvable]"));
        assert!(message.contains("Unresolvable:unresolvable"));
        assert_eq!(error.identifier(), Some("Unresolvable"));

        let cycle = ContainerError::cyclic(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(cycle.to_string(), "Circular dependency detected: A -> B -> A");
    }

    #[test]
    fn test_factory_error_keeps_nested_container_error() {
        let nested: anyhow::Error = ContainerError::not_found("db").into();
        let converted = ContainerError::from_factory("repo", nested.context("building repo"));
        assert_eq!(converted, ContainerError::not_found("db"));

        let plain = ContainerError::from_factory("repo", anyhow::anyhow!("disk full"));
        match plain {
            ContainerError::FactoryFailed { id, message } => {
                assert_eq!(id, "repo");
                assert!(message.contains("disk full"));
            }
            other => panic!("Wrong error type: {other:?}"),
        }
    }

    #[test]
    fn test_error_chaining() {
        let result: ContainerResult<()> = Err(ContainerError::not_found("mailer"));

        let chained = result.container_context("During bootstrap");
        let error_msg = format!("{:#}", chained.unwrap_err());
        assert!(error_msg.contains("During bootstrap"));
        assert!(error_msg.contains("mailer"));
    }
}

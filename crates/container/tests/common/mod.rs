//! Shared fixtures for container integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use container::{ConstructorParameter, StaticTypeRegistry, TypeDescriptor};

pub fn init() {
    common::init_test_logging();
}

#[derive(Debug)]
pub struct StdLogger;

#[derive(Debug)]
pub struct ConfigClass {
    pub env: String,
}

#[derive(Debug)]
pub struct ClassWithDependency {
    pub dependency: Arc<StdLogger>,
}

#[derive(Debug)]
pub struct ClassWithMultipleDependencies {
    pub config: Arc<ConfigClass>,
    pub logger: Arc<StdLogger>,
}

#[derive(Debug)]
pub struct ClassWithDefaultParam {
    pub value: String,
}

#[derive(Debug)]
pub struct ClassWithUnresolvable {
    pub unresolvable: String,
}

/// Type table used by most tests:
///
/// - `TestInterface` (abstract), `AbstractService` (abstract)
/// - `StdLogger()`, `ConfigClass(env: string = "test")`
/// - `ClassWithDependency(dependency: TestInterface)`
/// - `ClassWithMultipleDependencies(config: ConfigClass, logger: TestInterface)`
/// - `ClassWithDefaultParam(value: string = "default")`
/// - `ClassWithUnresolvable(unresolvable: string)`
pub fn fixture_types() -> StaticTypeRegistry {
    StaticTypeRegistry::new()
        .with(TypeDescriptor::abstract_type("TestInterface"))
        .with(TypeDescriptor::abstract_type("AbstractService"))
        .with(TypeDescriptor::concrete("StdLogger", |_| Ok(StdLogger)))
        .with(
            TypeDescriptor::concrete("ConfigClass", |args| {
                Ok(ConfigClass {
                    env: args.cloned::<String>(0)?,
                })
            })
            .parameter(ConstructorParameter::builtin("env", "string").with_default("test".to_string())),
        )
        .with(
            TypeDescriptor::concrete("ClassWithDependency", |args| {
                Ok(ClassWithDependency {
                    dependency: args.get::<StdLogger>(0)?,
                })
            })
            .parameter(ConstructorParameter::typed("dependency", "TestInterface")),
        )
        .with(
            TypeDescriptor::concrete("ClassWithMultipleDependencies", |args| {
                Ok(ClassWithMultipleDependencies {
                    config: args.get::<ConfigClass>(0)?,
                    logger: args.get::<StdLogger>(1)?,
                })
            })
            .parameter(ConstructorParameter::typed("config", "ConfigClass"))
            .parameter(ConstructorParameter::typed("logger", "TestInterface")),
        )
        .with(
            TypeDescriptor::concrete("ClassWithDefaultParam", |args| {
                Ok(ClassWithDefaultParam {
                    value: args.cloned::<String>(0)?,
                })
            })
            .parameter(
                ConstructorParameter::builtin("value", "string").with_default("default".to_string()),
            ),
        )
        .with(
            TypeDescriptor::concrete("ClassWithUnresolvable", |args| {
                Ok(ClassWithUnresolvable {
                    unresolvable: args.cloned::<String>(0)?,
                })
            })
            .parameter(ConstructorParameter::builtin("unresolvable", "string")),
        )
}

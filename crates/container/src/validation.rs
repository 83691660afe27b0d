//! Статическая валидация зависимостей.
//!
//! Обходит bindings и метаданные конструкторов, ничего не создавая, и
//! сообщает о том, на чём споткнётся lookup: висячие bindings, отсутствующие
//! или неразрешимые параметры конструктора, абстрактные цели и циклы.
//! Factories непрозрачны и считаются листьями графа.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, warn};

use crate::{
    container::Container,
    errors::{ContainerError, ContainerResult},
    registry::ParameterType,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A binding points at something nothing can produce
    MissingTarget { binding: String, target: String },
    /// A constructor parameter names a type nothing can produce
    MissingDependency {
        type_name: String,
        parameter: String,
        dependency: String,
    },
    /// Built-in or untyped parameter without a default
    UnresolvableParameter { type_name: String, parameter: String },
    /// A binding or parameter ends at an abstract type
    NotInstantiable { type_name: String },
    /// The type registry failed to describe a type
    Introspection { type_name: String, message: String },
    Cycle { chain: Vec<String> },
}

impl ValidationIssue {
    fn into_error(self) -> ContainerError {
        match self {
            ValidationIssue::MissingTarget { target, .. } => ContainerError::not_found(target),
            ValidationIssue::MissingDependency { dependency, .. } => {
                ContainerError::not_found(dependency)
            }
            ValidationIssue::UnresolvableParameter {
                type_name,
                parameter,
            } => ContainerError::unresolvable_parameter(parameter, type_name),
            ValidationIssue::NotInstantiable { type_name } => {
                ContainerError::not_instantiable(type_name)
            }
            ValidationIssue::Introspection { type_name, message } => {
                ContainerError::reflection(type_name, message)
            }
            ValidationIssue::Cycle { chain } => ContainerError::cyclic(chain),
        }
    }
}

/// Outcome of [`Container::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// First issue as the error a lookup would have produced.
    pub fn into_result(self) -> ContainerResult<()> {
        match self.issues.into_iter().next() {
            Some(issue) => Err(issue.into_error()),
            None => Ok(()),
        }
    }
}

/// Граф зависимостей: identifier -> через что он резолвится.
#[derive(Debug, Default)]
struct DependencyGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        self.edges
            .entry(dependent.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for node in self.edges.keys() {
            if !visited.contains(node.as_str()) {
                self.dfs_find_cycles(node, &mut visited, &mut rec_stack, &mut path, &mut cycles);
            }
        }
        cycles
    }

    fn dfs_find_cycles<'a>(
        &'a self,
        node: &'a str,
        visited: &mut HashSet<&'a str>,
        rec_stack: &mut HashSet<&'a str>,
        path: &mut Vec<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        if let Some(deps) = self.edges.get(node) {
            for neighbor in deps {
                let neighbor = neighbor.as_str();
                if !visited.contains(neighbor) {
                    self.dfs_find_cycles(neighbor, visited, rec_stack, path, cycles);
                } else if rec_stack.contains(neighbor) {
                    if let Some(start) = path.iter().position(|&x| x == neighbor) {
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|s| s.to_string()).collect();
                        cycle.push(neighbor.to_string());
                        cycles.push(cycle);
                    }
                }
            }
        }

        rec_stack.remove(node);
        path.pop();
    }
}

impl Container {
    /// Проверка зарегистрированного графа без конструирования сервисов.
    pub fn validate(&self) -> ValidationReport {
        let (factories, bindings): (BTreeSet<String>, BTreeMap<String, String>) = {
            let registrations = self.registrations();
            (
                registrations.factories.ids().map(str::to_string).collect(),
                registrations
                    .bindings
                    .iter()
                    .map(|(from, to)| (from.to_string(), to.to_string()))
                    .collect(),
            )
        };
        let types = self.type_registry();

        let mut issues = Vec::new();
        let mut graph = DependencyGraph::default();
        let mut referenced = BTreeSet::new();

        // Кэшированный id или id с factory не доходит до binding/конструктора,
        // рёбер от него нет.
        let is_leaf = |id: &str| self.instance(id).is_some() || factories.contains(id);

        for (from, to) in &bindings {
            if is_leaf(from) {
                continue;
            }
            if self.has(to) {
                graph.add_dependency(from, to);
                referenced.insert(to.clone());
            } else {
                issues.push(ValidationIssue::MissingTarget {
                    binding: from.clone(),
                    target: to.clone(),
                });
            }
        }

        for type_name in types.type_names() {
            if is_leaf(&type_name) || bindings.contains_key(&type_name) {
                continue;
            }
            let parameters = match types.constructor_parameters(&type_name) {
                Ok(parameters) => parameters.unwrap_or_default(),
                Err(e) => {
                    issues.push(ValidationIssue::Introspection {
                        type_name: type_name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            for parameter in parameters {
                match parameter.parameter_type() {
                    ParameterType::Named(dependency) => {
                        if self.has(dependency) {
                            graph.add_dependency(&type_name, dependency);
                            referenced.insert(dependency.clone());
                        } else {
                            issues.push(ValidationIssue::MissingDependency {
                                type_name: type_name.clone(),
                                parameter: parameter.name().to_string(),
                                dependency: dependency.clone(),
                            });
                        }
                    }
                    ParameterType::Builtin(_) | ParameterType::Untyped => {
                        if !parameter.has_default() {
                            issues.push(ValidationIssue::UnresolvableParameter {
                                type_name: type_name.clone(),
                                parameter: parameter.name().to_string(),
                            });
                        }
                    }
                }
            }
        }

        for id in &referenced {
            if is_leaf(id) || bindings.contains_key(id) {
                continue;
            }
            if let Ok(false) = types.is_instantiable(id) {
                issues.push(ValidationIssue::NotInstantiable {
                    type_name: id.clone(),
                });
            }
        }

        for chain in graph.find_cycles() {
            issues.push(ValidationIssue::Cycle { chain });
        }

        if issues.is_empty() {
            debug!(container = self.name(), "Dependency validation passed");
        } else {
            warn!(
                container = self.name(),
                issues = issues.len(),
                "Dependency validation found problems"
            );
        }
        ValidationReport { issues }
    }
}

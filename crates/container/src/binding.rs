use std::collections::HashMap;

/// Abstract identifier -> concrete name edges.
///
/// Targets are not checked when bound; they may point at types that do not
/// exist yet or at other abstract identifiers.
#[derive(Debug, Default, Clone)]
pub struct BindingMap {
    bindings: HashMap<String, String>,
}

impl BindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previous target, if any.
    pub fn bind(&mut self, abstract_id: String, concrete: String) -> Option<String> {
        self.bindings.insert(abstract_id, concrete)
    }

    pub fn target(&self, abstract_id: &str) -> Option<&str> {
        self.bindings.get(abstract_id).map(String::as_str)
    }

    pub fn contains(&self, abstract_id: &str) -> bool {
        self.bindings.contains_key(abstract_id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }
}

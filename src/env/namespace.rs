/// The `using namespace X` search list (spec §4.3 "Namespaces and
/// using"). Unqualified lookup searches the current namespace, then
/// each `using`-ed namespace in declaration order.
#[derive(Debug, Clone, Default)]
pub struct NamespaceSearch {
    pub current: Option<String>,
    pub using: Vec<String>,
}

impl NamespaceSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_using(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        if !self.using.contains(&namespace) {
            self.using.push(namespace);
        }
    }

    /// The ordered list of namespace prefixes to try for an
    /// unqualified name: current namespace first, then each `using`
    /// in declaration order, then the root (unqualified) namespace.
    pub fn search_order(&self) -> Vec<Option<String>> {
        let mut order = Vec::new();
        if let Some(current) = &self.current {
            order.push(Some(current.clone()));
        }
        for ns in &self.using {
            order.push(Some(ns.clone()));
        }
        order.push(None);
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_order_prefers_current_then_using_then_root() {
        let mut ns = NamespaceSearch::new();
        ns.current = Some("app".to_owned());
        ns.add_using("std");
        ns.add_using("util");
        assert_eq!(
            ns.search_order(),
            vec![Some("app".to_owned()), Some("std".to_owned()), Some("util".to_owned()), None]
        );
    }
}

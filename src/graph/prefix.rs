//! Prefix bindings: short name → namespace IRI.

use std::collections::BTreeMap;

use oxigraph::model::NamedNode;

use crate::error::{ConfigError, ConfigResult};

/// Table of prefix bindings. Keys are unique; rebinding overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixMap {
    bindings: BTreeMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a prefix.
    ///
    /// Fails if the prefix is not a valid prefix name or the namespace is not
    /// an absolute IRI.
    pub fn bind(&mut self, prefix: &str, namespace: &str) -> ConfigResult<()> {
        if !is_prefix_name(prefix) {
            return Err(ConfigError::InvalidPrefix {
                prefix: prefix.to_string(),
            });
        }
        NamedNode::new(namespace).map_err(|e| ConfigError::InvalidNamespace {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
            message: e.to_string(),
        })?;
        self.bindings
            .insert(prefix.to_string(), namespace.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate bindings in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, ns)| (prefix.as_str(), ns.as_str()))
    }

    /// Expand `prefix:local` into an absolute IRI.
    ///
    /// Names whose prefix is unbound, and names that already look absolute
    /// (`scheme://...`), are returned unchanged.
    pub fn expand(&self, name: &str) -> String {
        if let Some((prefix, local)) = name.split_once(':') {
            if !local.starts_with("//") {
                if let Some(ns) = self.bindings.get(prefix) {
                    return format!("{ns}{local}");
                }
            }
        }
        name.to_string()
    }

    /// Compact an absolute IRI against the longest matching namespace.
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.bindings
            .iter()
            .filter_map(|(prefix, ns)| {
                let local = iri.strip_prefix(ns.as_str())?;
                is_local_name(local).then_some((prefix, ns.len(), local))
            })
            .max_by_key(|(_, ns_len, _)| *ns_len)
            .map(|(prefix, _, local)| format!("{prefix}:{local}"))
    }
}

fn is_prefix_name(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        None => true,
        Some(first) if first.is_ascii_alphabetic() => {
            !prefix.ends_with('.')
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        }
        Some(_) => false,
    }
}

/// Conservative subset of Turtle's PN_LOCAL that never needs escaping.
fn is_local_name(local: &str) -> bool {
    !local.starts_with('-')
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foaf() -> PrefixMap {
        let mut map = PrefixMap::new();
        map.bind("foaf", "http://xmlns.com/foaf/0.1/").unwrap();
        map.bind("ex", "http://ex.com/").unwrap();
        map
    }

    #[test]
    fn expand_bound_prefix() {
        let map = foaf();
        assert_eq!(map.expand("foaf:name"), "http://xmlns.com/foaf/0.1/name");
    }

    #[test]
    fn unbound_prefix_is_left_alone() {
        let map = foaf();
        assert_eq!(map.expand("dbo:Person"), "dbo:Person");
        assert_eq!(map.expand("http://ex.com/a"), "http://ex.com/a");
    }

    #[test]
    fn rebinding_overwrites() {
        let mut map = foaf();
        map.bind("ex", "http://example.org/").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.expand("ex:a"), "http://example.org/a");
    }

    #[test]
    fn invalid_namespace_rejected() {
        let mut map = PrefixMap::new();
        let err = map.bind("ex", "not an iri").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNamespace { .. }));
        assert!(map.is_empty());
    }

    #[test]
    fn invalid_prefix_rejected() {
        let mut map = PrefixMap::new();
        assert!(matches!(
            map.bind("1ex", "http://ex.com/"),
            Err(ConfigError::InvalidPrefix { .. })
        ));
        assert!(map.bind("", "http://ex.com/").is_ok());
    }

    #[test]
    fn compact_picks_longest_namespace() {
        let mut map = PrefixMap::new();
        map.bind("p", "http://www.wikidata.org/prop/").unwrap();
        map.bind("ps", "http://www.wikidata.org/prop/statement/").unwrap();
        assert_eq!(
            map.compact("http://www.wikidata.org/prop/statement/P31").as_deref(),
            Some("ps:P31")
        );
        assert_eq!(
            map.compact("http://www.wikidata.org/prop/P31").as_deref(),
            Some("p:P31")
        );
        assert!(map.compact("http://other.org/x").is_none());
    }
}

//! Knowledge graph construction model.
//!
//! Collaborators describe entities as [`TripleGroup`]s: a subject plus an
//! ordered list of `(predicate, object)` edges, where an object may itself be
//! a nested group rooted at a fresh anonymous node. A [`Graph`] flattens the
//! groups into a canonical flat triple set and renders it through
//! [`serialize`].
//!
//! - **Prefixes** ([`prefix::PrefixMap`]): short name → namespace bindings
//! - **Serialization** ([`serialize::Format`]): Turtle, N-Triples and JSON-LD
//! - **RDF bridge** ([`rdf`]): conversion to and from oxigraph terms

pub mod prefix;
pub mod rdf;
pub mod serialize;

use std::collections::HashSet;

use crate::error::{ConfigResult, GraphResult};
use crate::node::{BlankAllocator, Node};
use crate::vocab;

use self::prefix::PrefixMap;
use self::serialize::Format;

/// A flat triple (subject, predicate, object).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl Triple {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// The object position of an edge: a plain node or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Node(Node),
    Group(TripleGroup),
}

impl From<Node> for Object {
    fn from(node: Node) -> Self {
        Object::Node(node)
    }
}

impl From<TripleGroup> for Object {
    fn from(group: TripleGroup) -> Self {
        Object::Group(group)
    }
}

/// A subject with an ordered list of outgoing edges.
///
/// Nesting only happens by moving a group into an edge, so a group can never
/// reach one of its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct TripleGroup {
    subject: Node,
    edges: Vec<(Node, Object)>,
}

impl TripleGroup {
    pub fn new(subject: Node) -> Self {
        Self {
            subject,
            edges: Vec::new(),
        }
    }

    /// Append an edge.
    pub fn add_property(&mut self, predicate: Node, object: impl Into<Object>) -> &mut Self {
        self.edges.push((predicate, object.into()));
        self
    }

    /// Builder form of [`add_property`](Self::add_property).
    pub fn with_property(mut self, predicate: Node, object: impl Into<Object>) -> Self {
        self.add_property(predicate, object);
        self
    }

    pub fn subject(&self) -> &Node {
        &self.subject
    }

    pub fn edges(&self) -> &[(Node, Object)] {
        &self.edges
    }

    /// Number of edges in this group and every nested group.
    pub fn edge_count(&self) -> usize {
        self.edges
            .iter()
            .map(|(_, object)| match object {
                Object::Node(_) => 1,
                Object::Group(nested) => 1 + nested.edge_count(),
            })
            .sum()
    }
}

/// A set of flattened triples plus the prefix bindings used to render them.
///
/// Triples keep their insertion order; duplicates are dropped, so registering
/// the same group twice leaves the graph unchanged.
#[derive(Debug, Default)]
pub struct Graph {
    prefixes: PrefixMap,
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    blanks: BlankAllocator,
}

impl Graph {
    /// Create an empty graph with no bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the Wikibase namespaces bound.
    pub fn with_wikibase_prefixes() -> Self {
        let mut graph = Self::new();
        for (prefix, namespace) in vocab::PREFIXES {
            // Constant table; every entry is a valid absolute IRI.
            let _ = graph.prefixes.bind(prefix, namespace);
        }
        graph
    }

    /// Register or overwrite a prefix binding.
    pub fn bind(&mut self, prefix: &str, namespace: &str) -> ConfigResult<()> {
        self.prefixes.bind(prefix, namespace)
    }

    /// Mint a fresh anonymous node, unique within this graph.
    pub fn blank(&self) -> Node {
        Node::Anonymous(self.blanks.next_id())
    }

    /// Flatten `group` into the triple set.
    ///
    /// Depth-first, pre-order: a nested group's linking edge is inserted
    /// before the nested group's own edges.
    pub fn add_triples(&mut self, group: &TripleGroup) {
        for (predicate, object) in &group.edges {
            match object {
                Object::Node(node) => {
                    self.insert(Triple::new(
                        group.subject.clone(),
                        predicate.clone(),
                        node.clone(),
                    ));
                }
                Object::Group(nested) => {
                    self.insert(Triple::new(
                        group.subject.clone(),
                        predicate.clone(),
                        nested.subject.clone(),
                    ));
                    self.add_triples(nested);
                }
            }
        }
    }

    /// Insert a single flat triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Flattened triples in canonical (insertion) order.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    /// Expand a prefixed name against this graph's bindings.
    pub fn expand(&self, name: &str) -> String {
        self.prefixes.expand(name)
    }

    /// Render the graph in the given format.
    pub fn serialize(&self, format: Format) -> String {
        match format {
            Format::Turtle => serialize::to_turtle(&self.triples, &self.prefixes),
            Format::NTriples => serialize::to_ntriples(&self.triples, &self.prefixes),
            Format::JsonLd => serialize::to_json_ld(&self.triples, &self.prefixes),
        }
    }

    /// Render the graph in a format named by string (`ttl`, `nt`, `json-ld`, ...).
    pub fn serialize_as(&self, format: &str) -> GraphResult<String> {
        Ok(self.serialize(format.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::LiteralType;

    fn foaf_graph() -> Graph {
        let mut g = Graph::new();
        g.bind("ex", "http://ex.com/").unwrap();
        g.bind("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .unwrap();
        g.bind("foaf", "http://xmlns.com/foaf/0.1/").unwrap();
        g
    }

    fn john(g: &Graph) -> TripleGroup {
        let alfred = TripleGroup::new(g.blank())
            .with_property(Node::named("rdf:type"), Node::named("foaf:Person"))
            .with_property(Node::named("foaf:name"), Node::literal("Alfred"))
            .with_property(
                Node::named("foaf:age"),
                Node::typed("36", LiteralType::Int),
            );

        TripleGroup::new(Node::named("ex:john"))
            .with_property(Node::named("rdf:type"), Node::named("foaf:Person"))
            .with_property(Node::named("foaf:name"), Node::literal("John"))
            .with_property(
                Node::named("foaf:age"),
                Node::typed("12", LiteralType::Int),
            )
            .with_property(Node::named("foaf:knows"), alfred)
    }

    #[test]
    fn nested_group_flattens_to_seven_triples() {
        let mut g = foaf_graph();
        let t = john(&g);
        assert_eq!(t.edge_count(), 7);
        g.add_triples(&t);
        assert_eq!(g.len(), 7);
    }

    #[test]
    fn re_adding_same_group_is_idempotent() {
        let mut g = foaf_graph();
        let t = john(&g);
        g.add_triples(&t);
        g.add_triples(&t);
        assert_eq!(g.len(), 7);
    }

    #[test]
    fn nested_subject_precedes_its_properties() {
        let mut g = foaf_graph();
        let t = john(&g);
        g.add_triples(&t);

        let knows = g
            .triples()
            .iter()
            .position(|t| t.predicate == Node::named("foaf:knows"))
            .unwrap();
        let nested = g.triples()[knows].object.clone();
        assert!(nested.is_anonymous());
        let first_nested = g
            .triples()
            .iter()
            .position(|t| t.subject == nested)
            .unwrap();
        assert_eq!(first_nested, knows + 1);
    }

    #[test]
    fn deep_nesting_counts_every_edge() {
        let mut g = Graph::new();
        let mut group = TripleGroup::new(g.blank())
            .with_property(Node::named("http://ex.com/leaf"), Node::literal("x"));
        for _ in 0..5 {
            group = TripleGroup::new(g.blank())
                .with_property(Node::named("http://ex.com/v"), Node::literal("y"))
                .with_property(Node::named("http://ex.com/child"), group);
        }
        let expected = group.edge_count();
        g.add_triples(&group);
        assert_eq!(expected, 11);
        assert_eq!(g.len(), expected);
    }

    #[test]
    fn blank_nodes_are_unique_per_graph() {
        let g = Graph::new();
        let a = g.blank();
        let b = g.blank();
        assert_ne!(a, b);
    }

    #[test]
    fn bind_rejects_invalid_namespace() {
        let mut g = Graph::new();
        assert!(g.bind("ex", "::nope").is_err());
    }

    #[test]
    fn wikibase_prefixes_bound() {
        let g = Graph::with_wikibase_prefixes();
        assert_eq!(g.expand("wd:Q42"), "http://www.wikidata.org/entity/Q42");
    }
}

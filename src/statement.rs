//! Builder for reified Wikibase statements.
//!
//! A [`Statement`] produces the shape the truthy engine consumes:
//!
//! ```text
//! wd:Q1  p:P2  wds:Q1-abc .
//! wds:Q1-abc  wikibase:rank wikibase:NormalRank ;
//!             ps:P2  <value> ;
//!             psn:P2 <normalized> ;          # optional
//!             pq:P585 <time> ;               # qualifiers
//!             prov:wasDerivedFrom [ pr:P248 <source> ] .
//! ```

use crate::graph::{Graph, TripleGroup};
use crate::node::Node;
use crate::vocab::{self, Rank};

/// A single reified statement about an entity.
#[derive(Debug, Clone)]
pub struct Statement {
    id: String,
    entity: String,
    property: String,
    value: Node,
    rank: Rank,
    normalized: Option<Node>,
    qualifiers: Vec<(String, Node)>,
    references: Vec<Vec<(String, Node)>>,
}

impl Statement {
    /// A normal-rank statement `entity -property-> value`, identified as `wds:<id>`.
    pub fn new(
        id: impl Into<String>,
        entity: impl Into<String>,
        property: impl Into<String>,
        value: Node,
    ) -> Self {
        Self {
            id: id.into(),
            entity: entity.into(),
            property: property.into(),
            value,
            rank: Rank::Normal,
            normalized: None,
            qualifiers: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn rank(mut self, rank: Rank) -> Self {
        self.rank = rank;
        self
    }

    /// Normalized form of the value (e.g. a quantity in SI units).
    pub fn normalized(mut self, value: Node) -> Self {
        self.normalized = Some(value);
        self
    }

    /// Add a qualifier `pq:<property> value`.
    pub fn qualifier(mut self, property: impl Into<String>, value: Node) -> Self {
        self.qualifiers.push((property.into(), value));
        self
    }

    /// Add a reference made of `pr:<property> value` snaks.
    pub fn reference(mut self, snaks: Vec<(String, Node)>) -> Self {
        self.references.push(snaks);
        self
    }

    pub fn statement_node(&self) -> Node {
        Node::named(format!("wds:{}", self.id))
    }

    /// Build the entity-rooted group. References become anonymous nodes
    /// minted from `graph`.
    pub fn to_group(&self, graph: &Graph) -> TripleGroup {
        let mut stmt = TripleGroup::new(self.statement_node());
        stmt.add_property(Node::named(vocab::RANK), Node::named(self.rank.as_name()))
            .add_property(
                Node::named(format!("ps:{}", self.property)),
                self.value.clone(),
            );
        if let Some(normalized) = &self.normalized {
            stmt.add_property(
                Node::named(format!("psn:{}", self.property)),
                normalized.clone(),
            );
        }
        for (property, value) in &self.qualifiers {
            stmt.add_property(Node::named(format!("pq:{property}")), value.clone());
        }
        for snaks in &self.references {
            let mut reference = TripleGroup::new(graph.blank());
            for (property, value) in snaks {
                reference.add_property(Node::named(format!("pr:{property}")), value.clone());
            }
            stmt.add_property(Node::named(vocab::WAS_DERIVED_FROM), reference);
        }

        TripleGroup::new(Node::named(format!("wd:{}", self.entity)))
            .with_property(Node::named(format!("p:{}", self.property)), stmt)
    }
}

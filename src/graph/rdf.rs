//! Bridge between the construction model and oxigraph's RDF terms.
//!
//! Used to load a [`Graph`] into a SPARQL store, to parse N-Triples
//! (preview responses, `convert` input) and to check serializer output.

use std::collections::HashMap;
use std::io::Read;

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model as ox;

use crate::error::{GraphError, GraphResult};
use crate::node::{Literal, LiteralType, Node};

use super::{Graph, Triple};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

impl Graph {
    /// Convert every flattened triple into an oxigraph triple, expanding
    /// prefixed names against this graph's bindings.
    pub fn to_rdf(&self) -> GraphResult<Vec<ox::Triple>> {
        self.triples().iter().map(|t| self.triple_to_rdf(t)).collect()
    }

    fn triple_to_rdf(&self, triple: &Triple) -> GraphResult<ox::Triple> {
        let predicate = match &triple.predicate {
            Node::Named(name) => self.named_node(name)?,
            other => return Err(not_rdf(other, "predicates must be named nodes")),
        };
        let object = self.term(&triple.object)?;
        match &triple.subject {
            Node::Named(name) => Ok(ox::Triple::new(self.named_node(name)?, predicate, object)),
            Node::Anonymous(id) => Ok(ox::Triple::new(blank_node(id.label())?, predicate, object)),
            Node::Literal(_) => Err(not_rdf(&triple.subject, "literals cannot be subjects")),
        }
    }

    fn named_node(&self, name: &str) -> GraphResult<ox::NamedNode> {
        let iri = self.expand(name);
        ox::NamedNode::new(&iri).map_err(|e| GraphError::InvalidIri {
            term: name.to_string(),
            message: e.to_string(),
        })
    }

    fn term(&self, node: &Node) -> GraphResult<ox::Term> {
        Ok(match node {
            Node::Named(name) => self.named_node(name)?.into(),
            Node::Anonymous(id) => blank_node(id.label())?.into(),
            Node::Literal(lit) => self.literal(lit, node)?.into(),
        })
    }

    fn literal(&self, lit: &Literal, node: &Node) -> GraphResult<ox::Literal> {
        if let Some(lang) = lit.language() {
            return ox::Literal::new_language_tagged_literal(lit.lexical(), lang)
                .map_err(|e| not_rdf(node, &e.to_string()));
        }
        match lit.datatype_iri() {
            Some(dt) => Ok(ox::Literal::new_typed_literal(
                lit.lexical(),
                self.named_node(&dt)?,
            )),
            None => Ok(ox::Literal::new_simple_literal(lit.lexical())),
        }
    }

    /// Build a graph from an N-Triples document.
    ///
    /// Blank node labels are re-minted from this graph's allocator.
    pub fn from_ntriples(text: &str) -> GraphResult<Graph> {
        let mut graph = Graph::new();
        let mut blanks = HashMap::new();
        for triple in parse_ntriples(text)? {
            let subject = graph.node_from_term(ox::Term::from(triple.subject), &mut blanks);
            let predicate = Node::Named(triple.predicate.into_string());
            let object = graph.node_from_term(triple.object, &mut blanks);
            graph.insert(Triple::new(subject, predicate, object));
        }
        Ok(graph)
    }

    fn node_from_term(&self, term: ox::Term, blanks: &mut HashMap<String, Node>) -> Node {
        match term {
            ox::Term::NamedNode(n) => Node::Named(n.into_string()),
            ox::Term::BlankNode(b) => blanks
                .entry(b.into_string())
                .or_insert_with(|| self.blank())
                .clone(),
            ox::Term::Literal(l) => Node::Literal(literal_from_rdf(&l)),
            #[allow(unreachable_patterns)]
            other => Node::literal(other.to_string()),
        }
    }
}

/// Parse an N-Triples document into oxigraph triples.
pub fn parse_ntriples(text: &str) -> GraphResult<Vec<ox::Triple>> {
    read_ntriples(text.as_bytes())
}

/// Parse N-Triples from a stream without buffering the whole document.
/// Empty input yields no triples.
pub fn read_ntriples(reader: impl Read) -> GraphResult<Vec<ox::Triple>> {
    RdfParser::from_format(RdfFormat::NTriples)
        .for_reader(reader)
        .map(|quad| {
            quad.map(ox::Triple::from)
                .map_err(|e| GraphError::Parse {
                    format: "N-Triples".into(),
                    message: e.to_string(),
                })
        })
        .collect()
}

fn literal_from_rdf(lit: &ox::Literal) -> Literal {
    let base = Literal::new(lit.value());
    if let Some(lang) = lit.language() {
        return base.with_language(lang);
    }
    match lit.datatype().as_str() {
        XSD_STRING => base,
        dt => base.with_type(LiteralType::from_iri(dt)),
    }
}

fn blank_node(label: String) -> GraphResult<ox::BlankNode> {
    ox::BlankNode::new(&label).map_err(|e| GraphError::InvalidIri {
        term: format!("_:{label}"),
        message: e.to_string(),
    })
}

fn not_rdf(node: &Node, message: &str) -> GraphError {
    GraphError::InvalidIri {
        term: node.to_string(),
        message: message.to_string(),
    }
}

//! Serializers for flattened graphs.
//!
//! Output is a pure function of the flat triple list and the prefix bindings:
//! triples are written in insertion order, and the Turtle and JSON-LD writers
//! group them by subject in order of first appearance.
//!
//! Named nodes are written verbatim. A name that does not expand to a valid
//! IRI (e.g. one containing a space or `<`) yields output RDF parsers reject;
//! [`Graph::to_rdf`](super::Graph::to_rdf) reports such names as
//! `GraphError::InvalidIri`.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::str::FromStr;

use serde_json::{Map, Value, json};

use crate::error::GraphError;
use crate::node::{Literal, Node};

use super::Triple;
use super::prefix::PrefixMap;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Turtle,
    NTriples,
    JsonLd,
}

impl FromStr for Format {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ttl" | "turtle" => Ok(Format::Turtle),
            "nt" | "ntriples" | "n-triples" => Ok(Format::NTriples),
            "json-ld" | "jsonld" => Ok(Format::JsonLd),
            _ => Err(GraphError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Turtle => write!(f, "turtle"),
            Format::NTriples => write!(f, "n-triples"),
            Format::JsonLd => write!(f, "json-ld"),
        }
    }
}

/// Group triples by subject, preserving first-appearance order of subjects
/// and insertion order of edges.
fn by_subject(triples: &[Triple]) -> Vec<(&Node, Vec<(&Node, &Node)>)> {
    let mut index: HashMap<&Node, usize> = HashMap::new();
    let mut groups: Vec<(&Node, Vec<(&Node, &Node)>)> = Vec::new();
    for t in triples {
        let slot = *index.entry(&t.subject).or_insert_with(|| {
            groups.push((&t.subject, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push((&t.predicate, &t.object));
    }
    groups
}

// ---------------------------------------------------------------------------
// Turtle
// ---------------------------------------------------------------------------

/// Serialize to Turtle with `@prefix` declarations and compacted names.
pub fn to_turtle(triples: &[Triple], prefixes: &PrefixMap) -> String {
    let mut out = String::new();
    for (prefix, namespace) in prefixes.iter() {
        let _ = writeln!(out, "@prefix {prefix}: <{namespace}> .");
    }
    if !prefixes.is_empty() {
        out.push('\n');
    }

    for (subject, edges) in by_subject(triples) {
        out.push_str(&turtle_term(subject, prefixes));
        for (i, (predicate, object)) in edges.iter().enumerate() {
            let sep = if i == 0 { " " } else { " ;\n    " };
            let pred = match predicate {
                Node::Named(name) if prefixes.expand(name) == RDF_TYPE => "a".to_string(),
                other => turtle_term(other, prefixes),
            };
            let _ = write!(out, "{sep}{pred} {}", turtle_term(object, prefixes));
        }
        out.push_str(" .\n\n");
    }
    out
}

fn turtle_term(node: &Node, prefixes: &PrefixMap) -> String {
    match node {
        Node::Named(name) => turtle_iri(name, prefixes),
        Node::Anonymous(id) => id.to_string(),
        Node::Literal(lit) => {
            let mut s = quoted(lit.lexical());
            if let Some(lang) = lit.language() {
                let _ = write!(s, "@{lang}");
            } else if let Some(dt) = lit.datatype_iri() {
                let _ = write!(s, "^^{}", turtle_iri(&dt, prefixes));
            }
            s
        }
    }
}

fn turtle_iri(name: &str, prefixes: &PrefixMap) -> String {
    let iri = prefixes.expand(name);
    prefixes
        .compact(&iri)
        .unwrap_or_else(|| format!("<{iri}>"))
}

// ---------------------------------------------------------------------------
// N-Triples
// ---------------------------------------------------------------------------

/// Serialize to N-Triples: one triple per line, absolute IRIs.
pub fn to_ntriples(triples: &[Triple], prefixes: &PrefixMap) -> String {
    let mut out = String::new();
    for t in triples {
        let _ = writeln!(
            out,
            "{} {} {} .",
            nt_term(&t.subject, prefixes),
            nt_term(&t.predicate, prefixes),
            nt_term(&t.object, prefixes)
        );
    }
    out
}

fn nt_term(node: &Node, prefixes: &PrefixMap) -> String {
    match node {
        Node::Named(name) => format!("<{}>", prefixes.expand(name)),
        Node::Anonymous(id) => id.to_string(),
        Node::Literal(lit) => nt_literal(lit, prefixes),
    }
}

fn nt_literal(lit: &Literal, prefixes: &PrefixMap) -> String {
    let mut s = quoted(lit.lexical());
    if let Some(lang) = lit.language() {
        let _ = write!(s, "@{lang}");
    } else if let Some(dt) = lit.datatype_iri() {
        let _ = write!(s, "^^<{}>", prefixes.expand(&dt));
    }
    s
}

// ---------------------------------------------------------------------------
// JSON-LD
// ---------------------------------------------------------------------------

/// Serialize to a JSON-LD document: `{"@context": ..., "@graph": [...]}`.
///
/// `rdf:type` edges with named objects become `@type`; every property value
/// is an array.
pub fn to_json_ld(triples: &[Triple], prefixes: &PrefixMap) -> String {
    let mut context = Map::new();
    for (prefix, namespace) in prefixes.iter().filter(|(p, _)| !p.is_empty()) {
        context.insert(prefix.to_string(), json!(namespace));
    }

    let mut nodes = Vec::new();
    for (subject, edges) in by_subject(triples) {
        let mut node = Map::new();
        node.insert("@id".into(), json!(json_ld_id(subject, prefixes)));
        for (predicate, object) in edges {
            let pred_iri = match predicate {
                Node::Named(name) => prefixes.expand(name),
                other => other.to_string(),
            };
            let (key, value) = match object {
                Node::Named(name) if pred_iri == RDF_TYPE => {
                    ("@type".to_string(), json!(json_ld_iri(name, prefixes)))
                }
                _ => (
                    json_ld_iri(&pred_iri, prefixes),
                    json_ld_value(object, prefixes),
                ),
            };
            match node
                .entry(key)
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(values) => values.push(value),
                slot => *slot = Value::Array(vec![slot.take(), value]),
            }
        }
        nodes.push(Value::Object(node));
    }

    let doc = json!({
        "@context": Value::Object(context),
        "@graph": nodes,
    });
    format!("{doc:#}")
}

fn json_ld_iri(name: &str, prefixes: &PrefixMap) -> String {
    let iri = prefixes.expand(name);
    prefixes
        .compact(&iri)
        .filter(|c| !c.starts_with(':'))
        .unwrap_or(iri)
}

fn json_ld_id(node: &Node, prefixes: &PrefixMap) -> String {
    match node {
        Node::Named(name) => json_ld_iri(name, prefixes),
        Node::Anonymous(id) => id.to_string(),
        Node::Literal(lit) => lit.lexical().to_string(),
    }
}

fn json_ld_value(node: &Node, prefixes: &PrefixMap) -> Value {
    match node {
        Node::Named(_) | Node::Anonymous(_) => json!({ "@id": json_ld_id(node, prefixes) }),
        Node::Literal(lit) => {
            let mut v = Map::new();
            v.insert("@value".into(), json!(lit.lexical()));
            if let Some(lang) = lit.language() {
                v.insert("@language".into(), json!(lang));
            } else if let Some(dt) = lit.datatype_iri() {
                v.insert("@type".into(), json!(json_ld_iri(&dt, prefixes)));
            }
            Value::Object(v)
        }
    }
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

fn quoted(lexical: &str) -> String {
    let mut out = String::with_capacity(lexical.len() + 2);
    out.push('"');
    for c in lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, TripleGroup};
    use crate::node::LiteralType;

    fn john() -> Graph {
        let mut g = Graph::new();
        g.bind("ex", "http://ex.com/").unwrap();
        g.bind("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#")
            .unwrap();
        g.bind("foaf", "http://xmlns.com/foaf/0.1/").unwrap();
        let alfred = TripleGroup::new(g.blank())
            .with_property(Node::named("rdf:type"), Node::named("foaf:Person"))
            .with_property(Node::named("foaf:name"), Node::literal("Alfred"));
        let t = TripleGroup::new(Node::named("ex:john"))
            .with_property(Node::named("rdf:type"), Node::named("foaf:Person"))
            .with_property(Node::named("foaf:age"), Node::typed("12", LiteralType::Int))
            .with_property(Node::named("foaf:knows"), alfred);
        g.add_triples(&t);
        g
    }

    #[test]
    fn format_names() {
        assert_eq!("ttl".parse::<Format>().unwrap(), Format::Turtle);
        assert_eq!("N-Triples".parse::<Format>().unwrap(), Format::NTriples);
        assert_eq!("json-ld".parse::<Format>().unwrap(), Format::JsonLd);
        assert!(matches!(
            "xml".parse::<Format>(),
            Err(GraphError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn unknown_format_fails_from_graph() {
        let g = john();
        assert!(matches!(
            g.serialize_as("rdf/xml"),
            Err(GraphError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn turtle_uses_prefixes_and_groups_subjects() {
        let out = john().serialize(Format::Turtle);
        assert!(out.starts_with("@prefix ex: <http://ex.com/> ."));
        assert!(out.contains(
            "ex:john a foaf:Person ;\n    foaf:age \"12\"^^<http://www.w3.org/2001/XMLSchema#int> ;\n    foaf:knows _:b1 .\n"
        ));
        assert!(out.contains("_:b1 a foaf:Person ;\n    foaf:name \"Alfred\" .\n"));
    }

    #[test]
    fn ntriples_one_line_per_triple() {
        let g = john();
        let out = g.serialize(Format::NTriples);
        assert_eq!(out.lines().count(), g.len());
        assert!(out.starts_with(
            "<http://ex.com/john> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://xmlns.com/foaf/0.1/Person> ."
        ));
    }

    #[test]
    fn json_ld_structure() {
        let out = john().serialize(Format::JsonLd);
        let doc: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["@context"]["foaf"], "http://xmlns.com/foaf/0.1/");
        let graph = doc["@graph"].as_array().unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph[0]["@id"], "ex:john");
        assert_eq!(graph[0]["@type"][0], "foaf:Person");
        assert_eq!(graph[0]["foaf:knows"][0]["@id"], "_:b1");
        assert_eq!(graph[0]["foaf:age"][0]["@value"], "12");
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = john();
        let b = john();
        for format in [Format::Turtle, Format::NTriples, Format::JsonLd] {
            assert_eq!(a.serialize(format), b.serialize(format));
        }
    }

    #[test]
    fn unbound_prefix_falls_back_to_absolute() {
        let mut g = Graph::new();
        g.add_triples(
            &TripleGroup::new(Node::named("dbr:Berlin"))
                .with_property(Node::named("http://ex.com/p"), Node::literal("x")),
        );
        assert!(g.serialize(Format::Turtle).starts_with("<dbr:Berlin> <http://ex.com/p> \"x\" ."));
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(quoted("a\"b\\c\nd"), "\"a\\\"b\\\\c\\nd\"");
    }
}

//! Node types for the graph construction model.
//!
//! A [`Node`] is one of three identifier kinds: a named resource (prefixed
//! name or absolute IRI), an anonymous resource identified by a [`BlankId`],
//! or a [`Literal`] carrying an optional datatype or language tag.
//! [`BlankAllocator`] hands out anonymous ids for a single graph.

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// Identifier of an anonymous resource, unique within the graph that minted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlankId(NonZeroU64);

impl BlankId {
    /// Create a `BlankId` from a raw `u64`.
    ///
    /// Returns `None` if `raw` is zero.
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(BlankId)
    }

    /// Get the underlying `u64` value.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Label used in serialized output (`b1`, `b2`, ...).
    pub fn label(self) -> String {
        format!("b{}", self.0)
    }
}

impl fmt::Display for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:b{}", self.0)
    }
}

/// Thread-safe anonymous id allocator.
///
/// Produces monotonically increasing ids starting from 1. Ids are never reused.
#[derive(Debug)]
pub struct BlankAllocator {
    next: AtomicU64,
}

impl BlankAllocator {
    /// Create a new allocator that starts from id 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next anonymous id.
    pub fn next_id(&self) -> BlankId {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 allocations to wrap.
        BlankId(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }
}

impl Default for BlankAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Datatype tag of a literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralType {
    String,
    Int,
    Integer,
    Decimal,
    Float,
    Double,
    Boolean,
    Date,
    DateTime,
    Time,
    GYear,
    GYearMonth,
    AnyUri,
    /// Any other datatype, as a prefixed name or absolute IRI.
    Other(String),
}

impl LiteralType {
    /// The datatype IRI. `Other` returns its stored form unexpanded.
    pub fn iri(&self) -> String {
        let local = match self {
            LiteralType::String => "string",
            LiteralType::Int => "int",
            LiteralType::Integer => "integer",
            LiteralType::Decimal => "decimal",
            LiteralType::Float => "float",
            LiteralType::Double => "double",
            LiteralType::Boolean => "boolean",
            LiteralType::Date => "date",
            LiteralType::DateTime => "dateTime",
            LiteralType::Time => "time",
            LiteralType::GYear => "gYear",
            LiteralType::GYearMonth => "gYearMonth",
            LiteralType::AnyUri => "anyURI",
            LiteralType::Other(iri) => return iri.clone(),
        };
        format!("{XSD}{local}")
    }

    /// Map a datatype IRI back to a tag.
    pub fn from_iri(iri: &str) -> Self {
        let Some(local) = iri.strip_prefix(XSD) else {
            return LiteralType::Other(iri.to_string());
        };
        match local {
            "string" => LiteralType::String,
            "int" => LiteralType::Int,
            "integer" => LiteralType::Integer,
            "decimal" => LiteralType::Decimal,
            "float" => LiteralType::Float,
            "double" => LiteralType::Double,
            "boolean" => LiteralType::Boolean,
            "date" => LiteralType::Date,
            "dateTime" => LiteralType::DateTime,
            "time" => LiteralType::Time,
            "gYear" => LiteralType::GYear,
            "gYearMonth" => LiteralType::GYearMonth,
            "anyURI" => LiteralType::AnyUri,
            _ => LiteralType::Other(iri.to_string()),
        }
    }
}

/// A literal value with an optional datatype or language tag.
///
/// A language tag takes precedence: language-tagged literals are always
/// `rdf:langString` and carry no separate datatype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    lexical: String,
    datatype: Option<LiteralType>,
    language: Option<String>,
}

impl Literal {
    /// A plain literal.
    pub fn new(lexical: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: None,
            language: None,
        }
    }

    /// Set the datatype tag. Clears any language tag.
    pub fn with_type(mut self, datatype: LiteralType) -> Self {
        self.datatype = Some(datatype);
        self.language = None;
        self
    }

    /// Set the language tag. Clears any datatype tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into().to_ascii_lowercase());
        self.datatype = None;
        self
    }

    pub fn lexical(&self) -> &str {
        &self.lexical
    }

    pub fn datatype(&self) -> Option<&LiteralType> {
        self.datatype.as_ref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// The effective datatype IRI, if the literal is not a plain string.
    pub(crate) fn datatype_iri(&self) -> Option<String> {
        if self.language.is_some() {
            return Some(RDF_LANG_STRING.to_string());
        }
        match &self.datatype {
            // xsd:string is the implicit type of plain literals.
            Some(LiteralType::String) | None => None,
            Some(dt) => Some(dt.iri()),
        }
    }
}

/// A node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// A named resource: `prefix:local` or an absolute IRI. Not validated;
    /// names that do not expand to an IRI fail at `Graph::to_rdf`.
    Named(String),
    /// An anonymous resource.
    Anonymous(BlankId),
    /// A literal value.
    Literal(Literal),
}

impl Node {
    /// A named resource.
    pub fn named(iri: impl Into<String>) -> Self {
        Node::Named(iri.into())
    }

    /// A plain string literal.
    pub fn literal(lexical: impl Into<String>) -> Self {
        Node::Literal(Literal::new(lexical))
    }

    /// A typed literal.
    pub fn typed(lexical: impl Into<String>, datatype: LiteralType) -> Self {
        Node::Literal(Literal::new(lexical).with_type(datatype))
    }

    /// A language-tagged literal.
    pub fn lang(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Node::Literal(Literal::new(lexical).with_language(language))
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Node::Anonymous(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal(_))
    }
}

impl From<Literal> for Node {
    fn from(literal: Literal) -> Self {
        Node::Literal(literal)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Named(iri) => write!(f, "{iri}"),
            Node::Anonymous(id) => write!(f, "{id}"),
            Node::Literal(lit) => {
                write!(f, "{:?}", lit.lexical)?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = &lit.datatype {
                    write!(f, "^^{}", dt.iri())
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_produces_sequential_ids() {
        let alloc = BlankAllocator::new();
        let a = alloc.next_id();
        let b = alloc.next_id();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(alloc.next_id().get(), 3);
    }

    #[test]
    fn separate_allocators_are_independent() {
        let one = BlankAllocator::new();
        let two = BlankAllocator::new();
        one.next_id();
        one.next_id();
        assert_eq!(two.next_id().get(), 1);
    }

    #[test]
    fn blank_id_zero_is_none() {
        assert!(BlankId::new(0).is_none());
        assert_eq!(BlankId::new(7).unwrap().label(), "b7");
    }

    #[test]
    fn literal_type_iri_roundtrip() {
        for dt in [
            LiteralType::Int,
            LiteralType::Decimal,
            LiteralType::DateTime,
            LiteralType::GYearMonth,
            LiteralType::AnyUri,
        ] {
            assert_eq!(LiteralType::from_iri(&dt.iri()), dt);
        }
        assert_eq!(
            LiteralType::from_iri("http://example.org/unit"),
            LiteralType::Other("http://example.org/unit".into())
        );
    }

    #[test]
    fn language_overrides_datatype() {
        let lit = Literal::new("chat").with_type(LiteralType::Int).with_language("FR");
        assert_eq!(lit.language(), Some("fr"));
        assert!(lit.datatype().is_none());
        assert_eq!(lit.datatype_iri().as_deref(), Some(RDF_LANG_STRING));
    }

    #[test]
    fn xsd_string_is_implicit() {
        let lit = Literal::new("John").with_type(LiteralType::String);
        assert!(lit.datatype_iri().is_none());
    }

    #[test]
    fn node_display() {
        assert_eq!(Node::named("ex:john").to_string(), "ex:john");
        assert_eq!(Node::lang("Hi", "en").to_string(), "\"Hi\"@en");
        assert_eq!(
            Node::typed("12", LiteralType::Int).to_string(),
            "\"12\"^^http://www.w3.org/2001/XMLSchema#int"
        );
    }
}

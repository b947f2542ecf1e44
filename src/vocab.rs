//! Wikibase vocabulary: namespaces, statement ranks and the best-rank marker.

use std::fmt;
use std::str::FromStr;

pub const WD: &str = "http://www.wikidata.org/entity/";
pub const WDS: &str = "http://www.wikidata.org/entity/statement/";
pub const WDT: &str = "http://www.wikidata.org/prop/direct/";
pub const WDTN: &str = "http://www.wikidata.org/prop/direct-normalized/";
pub const P: &str = "http://www.wikidata.org/prop/";
pub const PS: &str = "http://www.wikidata.org/prop/statement/";
pub const PSN: &str = "http://www.wikidata.org/prop/statement/value-normalized/";
pub const PQ: &str = "http://www.wikidata.org/prop/qualifier/";
pub const PR: &str = "http://www.wikidata.org/prop/reference/";
pub const WIKIBASE: &str = "http://wikiba.se/ontology#";
pub const PROV: &str = "http://www.w3.org/ns/prov#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SCHEMA: &str = "http://schema.org/";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";

/// Standard prefix table, used for graph bindings and SPARQL prologues.
pub const PREFIXES: [(&str, &str); 16] = [
    ("wd", WD),
    ("wds", WDS),
    ("wdt", WDT),
    ("wdtn", WDTN),
    ("p", P),
    ("ps", PS),
    ("psn", PSN),
    ("pq", PQ),
    ("pr", PR),
    ("wikibase", WIKIBASE),
    ("prov", PROV),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("xsd", XSD),
    ("schema", SCHEMA),
    ("skos", SKOS),
];

/// Class marking a statement as currently best for its (entity, property).
pub const BEST_RANK: &str = "wikibase:BestRank";
/// Predicate linking a statement to its rank.
pub const RANK: &str = "wikibase:rank";
/// Predicate linking a statement to a reference.
pub const WAS_DERIVED_FROM: &str = "prov:wasDerivedFrom";

/// Render the prefix table as a SPARQL prologue.
pub fn sparql_prologue() -> String {
    PREFIXES
        .iter()
        .map(|(prefix, ns)| format!("PREFIX {prefix}: <{ns}>\n"))
        .collect()
}

/// Statement-level precedence tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Preferred,
    Normal,
    Deprecated,
}

impl Rank {
    /// Prefixed name of the rank individual.
    pub fn as_name(self) -> &'static str {
        match self {
            Rank::Preferred => "wikibase:PreferredRank",
            Rank::Normal => "wikibase:NormalRank",
            Rank::Deprecated => "wikibase:DeprecatedRank",
        }
    }

    /// Absolute IRI of the rank individual.
    pub fn iri(self) -> String {
        let local = self
            .as_name()
            .trim_start_matches("wikibase:");
        format!("{WIKIBASE}{local}")
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Preferred => write!(f, "preferred"),
            Rank::Normal => write!(f, "normal"),
            Rank::Deprecated => write!(f, "deprecated"),
        }
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preferred" => Ok(Rank::Preferred),
            "normal" => Ok(Rank::Normal),
            "deprecated" => Ok(Rank::Deprecated),
            other => Err(format!("unknown rank: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_iris() {
        assert_eq!(Rank::Preferred.iri(), "http://wikiba.se/ontology#PreferredRank");
        assert_eq!(Rank::Deprecated.as_name(), "wikibase:DeprecatedRank");
    }

    #[test]
    fn rank_parse() {
        assert_eq!("Preferred".parse::<Rank>().unwrap(), Rank::Preferred);
        assert!("best".parse::<Rank>().is_err());
    }

    #[test]
    fn prologue_declares_every_prefix() {
        let prologue = sparql_prologue();
        assert_eq!(prologue.lines().count(), PREFIXES.len());
        assert!(prologue.contains("PREFIX wdtn: <http://www.wikidata.org/prop/direct-normalized/>"));
    }
}

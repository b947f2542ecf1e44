//! Predicate purge: delete every triple that uses one of a set of predicates.
//!
//! Used to wipe materialized shortcut edges (`wdt:C3001` ... `wdt:C3019`)
//! before a rebuild. Shares the dry-run convention of the truthy pass.

use std::ops::Range;

use oxigraph::model::{NamedNode, Triple};

use crate::error::{ConfigError, ConfigResult, RemoteResult};
use crate::sparql::{self, Mode, Rewrite, RewriteExecutor};
use crate::truthy::is_local_id;
use crate::vocab;

/// A set of predicates whose triples should be deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicatePurge {
    predicates: Vec<String>,
}

impl PredicatePurge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate given as a prefixed name (`wdt:P31`) or absolute IRI.
    ///
    /// Predicates are spliced into SPARQL, so anything that is not a
    /// Wikibase prefixed name or a valid IRI is rejected.
    pub fn predicate(mut self, predicate: impl Into<String>) -> ConfigResult<Self> {
        let predicate = predicate.into();
        check_predicate(&predicate)?;
        if !self.predicates.contains(&predicate) {
            self.predicates.push(predicate);
        }
        Ok(self)
    }

    /// Add `prefix:{stem}{n}` for every `n` in `range`, e.g.
    /// `range("wdtn", "C", 3001..3020)`.
    pub fn range(mut self, prefix: &str, stem: &str, range: Range<u32>) -> ConfigResult<Self> {
        for n in range {
            self = self.predicate(format!("{prefix}:{stem}{n}"))?;
        }
        Ok(self)
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The bulk delete for all predicates.
    pub fn rewrite(&self) -> Rewrite {
        let rows: String = self
            .predicates
            .iter()
            .map(|p| format!("  ({})\n", sparql_term(p)))
            .collect();
        Rewrite::delete(
            "?s ?p ?o .",
            format!("VALUES (?p) {{\n{rows}}}\n?s ?p ?o ."),
        )
    }

    /// Delete (or, in preview mode, list) every matching triple.
    pub fn run(&self, executor: &dyn RewriteExecutor, mode: Mode) -> RemoteResult<Vec<Triple>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        tracing::info!(predicates = self.predicates.len(), ?mode, "purging predicates");
        let touched = sparql::run(executor, &self.rewrite(), mode)?;
        tracing::info!(triples = touched.len(), "purge complete");
        Ok(touched)
    }
}

fn check_predicate(predicate: &str) -> ConfigResult<()> {
    let invalid = |message: &str| ConfigError::InvalidPredicate {
        predicate: predicate.to_string(),
        message: message.to_string(),
    };
    if predicate.contains("://") {
        return NamedNode::new(predicate)
            .map(|_| ())
            .map_err(|e| invalid(&e.to_string()));
    }
    let (prefix, local) = predicate
        .split_once(':')
        .ok_or_else(|| invalid("missing prefix"))?;
    if !vocab::PREFIXES.iter().any(|(p, _)| *p == prefix) {
        return Err(invalid("unknown prefix"));
    }
    if !is_local_id(local) {
        return Err(invalid("invalid local name"));
    }
    Ok(())
}

fn sparql_term(predicate: &str) -> String {
    if predicate.contains("://") {
        format!("<{predicate}>")
    } else {
        predicate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_expands_numbered_predicates() {
        let purge = PredicatePurge::new().range("wdt", "C", 3001..3004).unwrap();
        assert_eq!(purge.predicates(), &["wdt:C3001", "wdt:C3002", "wdt:C3003"]);
    }

    #[test]
    fn duplicates_ignored() {
        let purge = PredicatePurge::new()
            .predicate("wdt:P31")
            .unwrap()
            .predicate("wdt:P31")
            .unwrap();
        assert_eq!(purge.predicates().len(), 1);
    }

    #[test]
    fn rewrite_lists_every_predicate() {
        let rw = PredicatePurge::new()
            .predicate("wdt:P31")
            .unwrap()
            .predicate("http://ex.com/p")
            .unwrap()
            .rewrite();
        let update = rw.to_update();
        assert!(update.contains("(wdt:P31)"));
        assert!(update.contains("(<http://ex.com/p>)"));
        assert!(update.contains("DELETE {\n?s ?p ?o .\n}"));
    }

    #[test]
    fn malformed_predicates_rejected() {
        for bad in [
            "wdt:P31) }",
            "wdt:P99)} ?s ?p ?o } ; CLEAR ALL ; DELETE { ?s ?p ?o } WHERE { VALUES (?p) { (wdt:P99",
            "P31",
            "zz:P31",
            "wdt:",
            "wdt:P 31",
            "http://ex.com/p> ; CLEAR ALL",
            "http://ex.com/a b",
        ] {
            assert!(
                matches!(
                    PredicatePurge::new().predicate(bad),
                    Err(ConfigError::InvalidPredicate { .. })
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn malformed_range_rejected() {
        assert!(matches!(
            PredicatePurge::new().range("wdt", "C}", 1..3),
            Err(ConfigError::InvalidPredicate { .. })
        ));
        assert!(PredicatePurge::new().range("nope", "C", 1..3).is_err());
    }
}

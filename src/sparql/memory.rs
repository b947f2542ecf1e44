//! In-memory rewrite executor backed by oxigraph.
//!
//! Runs the exact SPARQL text a remote endpoint would receive, so passes can
//! be exercised without a network store.

use std::collections::BTreeSet;

use oxigraph::model::{GraphName, Triple};
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use crate::error::{KgResult, RemoteError, RemoteResult};
use crate::graph::Graph;

use super::{Rewrite, RewriteExecutor};

/// SPARQL-capable in-memory triple store.
pub struct MemoryStore {
    store: Store,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> RemoteResult<Self> {
        let store = Store::new().map_err(|e| RemoteError::Store {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self { store })
    }

    /// Create a store holding every triple of `graph`.
    pub fn from_graph(graph: &Graph) -> KgResult<Self> {
        let store = Self::new()?;
        store.load(graph)?;
        Ok(store)
    }

    /// Insert every triple of `graph` into the default graph.
    pub fn load(&self, graph: &Graph) -> KgResult<usize> {
        let triples = graph.to_rdf()?;
        let count = triples.len();
        for triple in triples {
            let quad = triple.in_graph(GraphName::DefaultGraph);
            self.store.insert(&quad).map_err(|e| RemoteError::Store {
                message: format!("insert failed: {e}"),
            })?;
        }
        Ok(count)
    }

    /// Number of triples in the store.
    pub fn len(&self) -> RemoteResult<usize> {
        self.store.len().map_err(|e| RemoteError::Store {
            message: format!("count failed: {e}"),
        })
    }

    pub fn is_empty(&self) -> RemoteResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Every triple as an N-Triples line, sorted. Handy for comparing stores.
    pub fn snapshot(&self) -> RemoteResult<BTreeSet<String>> {
        self.store
            .iter()
            .map(|quad| {
                quad.map(|q| Triple::from(q).to_string())
                    .map_err(|e| RemoteError::Store {
                        message: format!("iteration failed: {e}"),
                    })
            })
            .collect()
    }

    /// Execute a SPARQL ASK query.
    pub fn ask(&self, sparql: &str) -> RemoteResult<bool> {
        let results = self.store.query(sparql).map_err(|e| RemoteError::Store {
            message: format!("SPARQL query failed: {e}"),
        })?;
        match results {
            QueryResults::Boolean(b) => Ok(b),
            _ => Err(RemoteError::Store {
                message: "expected boolean result from ASK query".into(),
            }),
        }
    }
}

impl RewriteExecutor for MemoryStore {
    fn apply(&self, rewrite: &Rewrite) -> RemoteResult<()> {
        self.store
            .update(rewrite.to_update().as_str())
            .map_err(|e| RemoteError::Store {
                message: format!("SPARQL update failed: {e}"),
            })
    }

    fn preview(&self, rewrite: &Rewrite) -> RemoteResult<Vec<Triple>> {
        let results = self
            .store
            .query(rewrite.to_preview().as_str())
            .map_err(|e| RemoteError::Store {
                message: format!("SPARQL preview failed: {e}"),
            })?;
        match results {
            QueryResults::Graph(triples) => triples
                .map(|t| {
                    t.map_err(|e| RemoteError::Store {
                        message: format!("solution error: {e}"),
                    })
                })
                .collect(),
            _ => Err(RemoteError::Store {
                message: "expected a graph result from CONSTRUCT".into(),
            }),
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TripleGroup;
    use crate::node::Node;

    fn sample() -> Graph {
        let mut g = Graph::new();
        g.bind("ex", "http://ex.com/").unwrap();
        g.add_triples(
            &TripleGroup::new(Node::named("ex:a"))
                .with_property(Node::named("ex:p"), Node::literal("1"))
                .with_property(Node::named("ex:q"), Node::named("ex:b")),
        );
        g
    }

    #[test]
    fn load_graph() {
        let store = MemoryStore::from_graph(&sample()).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.ask("ASK { <http://ex.com/a> <http://ex.com/q> <http://ex.com/b> }").unwrap());
    }

    #[test]
    fn preview_does_not_mutate() {
        let store = MemoryStore::from_graph(&sample()).unwrap();
        let rw = Rewrite::delete("?s ?p ?o .", "?s ?p ?o .");
        let previewed = store.preview(&rw).unwrap();
        assert_eq!(previewed.len(), 2);
        assert_eq!(store.len().unwrap(), 2);

        store.apply(&rw).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn empty_preview_is_ok() {
        let store = MemoryStore::new().unwrap();
        let rw = Rewrite::insert("?s a wikibase:BestRank .", "?s ?p ?o .");
        assert!(store.preview(&rw).unwrap().is_empty());
    }

    #[test]
    fn malformed_rewrite_is_an_error() {
        let store = MemoryStore::new().unwrap();
        let rw = Rewrite::insert("?s ?p", "?s ?p ?o .");
        assert!(matches!(store.apply(&rw), Err(RemoteError::Store { .. })));
        assert!(matches!(store.preview(&rw), Err(RemoteError::Store { .. })));
    }
}

// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # kg-truthy
//!
//! A small knowledge-graph toolkit for Wikibase-shaped data, plus a
//! consolidation engine that keeps best-rank markers and shortcut edges in a
//! remote SPARQL store consistent with statement ranks.
//!
//! ## Architecture
//!
//! - **Graph model** (`node`, `graph`): nodes, nested triple groups, prefix
//!   bindings, and Turtle / N-Triples / JSON-LD serialization
//! - **Wikibase shape** (`vocab`, `statement`): namespaces, ranks and reified statements
//! - **Rewrites** (`sparql`): bulk INSERT/DELETE operations with a preview form,
//!   executed over HTTP or against an in-memory oxigraph store
//! - **Truthy pass** (`truthy`): batched Promote/Demote over `(entity, property)` keys
//! - **Cleanup** (`cleanup`): bulk deletion of predicate ranges
//!
//! ## Library usage
//!
//! ```no_run
//! use kg_truthy::config::TruthyConfig;
//! use kg_truthy::graph::Graph;
//! use kg_truthy::node::Node;
//! use kg_truthy::sparql::memory::MemoryStore;
//! use kg_truthy::statement::Statement;
//! use kg_truthy::truthy::{KeySet, TruthyEngine};
//! use kg_truthy::vocab::Rank;
//!
//! let mut graph = Graph::with_wikibase_prefixes();
//! let stmt = Statement::new("Q1-P1-a", "Q1", "P1", Node::literal("a")).rank(Rank::Preferred);
//! graph.add_triples(&stmt.to_group(&graph));
//!
//! let store = MemoryStore::from_graph(&graph).unwrap();
//! let engine = TruthyEngine::new(&store, TruthyConfig::default()).unwrap();
//! engine.build_truthy(&KeySet::from_pairs([("Q1", "P1")]).unwrap()).unwrap();
//! ```

pub mod cleanup;
pub mod config;
pub mod error;
pub mod graph;
pub mod node;
pub mod sparql;
pub mod statement;
pub mod truthy;
pub mod vocab;

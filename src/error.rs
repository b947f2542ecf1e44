//! Rich diagnostic error types for kg-truthy.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so users know exactly what
//! went wrong and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::truthy::{Phase, TruthyKey};

/// Top-level error type for kg-truthy.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum KgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Truthy(#[from] TruthyError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid prefix name: \"{prefix}\"")]
    #[diagnostic(
        code(kg::config::invalid_prefix),
        help(
            "Prefix names must start with a letter and contain only letters, \
             digits, '-', '_' or '.' (the empty prefix is also allowed)."
        )
    )]
    InvalidPrefix { prefix: String },

    #[error("invalid namespace IRI for prefix \"{prefix}\": {namespace}")]
    #[diagnostic(
        code(kg::config::invalid_namespace),
        help("A namespace must be an absolute IRI such as `http://example.org/`. {message}")
    )]
    InvalidNamespace {
        prefix: String,
        namespace: String,
        message: String,
    },

    #[error("invalid endpoint URL: {url}")]
    #[diagnostic(
        code(kg::config::invalid_endpoint),
        help("The SPARQL endpoint must be an absolute http:// or https:// URL. {message}")
    )]
    InvalidEndpoint { url: String, message: String },

    #[error("invalid predicate: \"{predicate}\"")]
    #[diagnostic(
        code(kg::config::invalid_predicate),
        help(
            "Use a Wikibase prefixed name such as `wdt:P31` (bound prefix, local name of \
             letters, digits, '_' or '-') or an absolute IRI. {message}"
        )
    )]
    InvalidPredicate { predicate: String, message: String },

    #[error("batch size must be greater than zero")]
    #[diagnostic(
        code(kg::config::invalid_batch_size),
        help("Set `truthy.batch_size` (or `--batch-size`) to a positive number of keys.")
    )]
    InvalidBatchSize,

    #[error("failed to read config file: {path}")]
    #[diagnostic(
        code(kg::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {path}: {message}")]
    #[diagnostic(
        code(kg::config::parse),
        help("Check the TOML syntax in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config file: {path}")]
    #[diagnostic(
        code(kg::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("unsupported serialization format: \"{format}\"")]
    #[diagnostic(
        code(kg::graph::unsupported_format),
        help("Supported formats are: ttl (turtle), nt (n-triples) and json-ld.")
    )]
    UnsupportedFormat { format: String },

    #[error("term cannot be expressed as RDF: {term}")]
    #[diagnostic(
        code(kg::graph::invalid_iri),
        help(
            "Named nodes must expand to absolute IRIs. Bind the prefix with \
             `Graph::bind` or use a full IRI. {message}"
        )
    )]
    InvalidIri { term: String, message: String },

    #[error("failed to parse {format} input: {message}")]
    #[diagnostic(
        code(kg::graph::parse),
        help("The input document is not valid {format}.")
    )]
    Parse { format: String, message: String },
}

// ---------------------------------------------------------------------------
// Remote store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RemoteError {
    #[error("request to {endpoint} failed: {message}")]
    #[diagnostic(
        code(kg::remote::request),
        help(
            "The SPARQL endpoint could not be reached. Check the URL, the network \
             and the credentials, then retry the batch."
        )
    )]
    Request { endpoint: String, message: String },

    #[error("{endpoint} answered with HTTP {status}: {body}")]
    #[diagnostic(
        code(kg::remote::status),
        help("The store rejected the operation. The response body usually names the cause.")
    )]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("unreadable response from store: {message}")]
    #[diagnostic(
        code(kg::remote::response),
        help("The store answered with something that is not N-Triples. Check the endpoint's Accept handling.")
    )]
    Response { message: String },

    #[error("store operation failed: {message}")]
    #[diagnostic(
        code(kg::remote::store),
        help("The embedded SPARQL store rejected the operation. Check the rendered SPARQL.")
    )]
    Store { message: String },
}

// ---------------------------------------------------------------------------
// Truthy consolidation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TruthyError {
    #[error("invalid truthy key ({entity}, {property})")]
    #[diagnostic(
        code(kg::truthy::invalid_key),
        help(
            "Entity and property ids are local names such as `Q42` or `P31`: \
             non-empty, ASCII letters, digits, '_' or '-'."
        )
    )]
    InvalidKey { entity: String, property: String },

    #[error("{phase} phase failed for a batch of {} key(s)", .batch.len())]
    #[diagnostic(
        code(kg::truthy::phase_failed),
        help(
            "No rollback was attempted; the store holds whatever the failed operation committed. \
             Re-running the pass on this batch is safe because the pass is idempotent."
        )
    )]
    PhaseFailed {
        phase: Phase,
        batch: Vec<TruthyKey>,
        #[source]
        source: RemoteError,
    },
}

pub type KgResult<T> = std::result::Result<T, KgError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type GraphResult<T> = std::result::Result<T, GraphError>;
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
pub type TruthyResult<T> = std::result::Result<T, TruthyError>;

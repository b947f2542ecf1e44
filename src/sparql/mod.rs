//! Bulk graph rewrites and the executors that run them.
//!
//! A [`Rewrite`] is a single `INSERT { .. } WHERE { .. }` or
//! `DELETE { .. } WHERE { .. }` request. Every rewrite can also be rendered
//! as a `CONSTRUCT` over the same template and pattern, which reports the
//! triples the rewrite would touch without changing the store.
//!
//! - **HTTP** ([`http::HttpEndpoint`]): SPARQL 1.1 protocol over ureq
//! - **In-memory** ([`memory::MemoryStore`]): oxigraph store, same semantics

pub mod http;
pub mod memory;

use std::fmt;

use oxigraph::model::Triple;

use crate::error::RemoteResult;
use crate::vocab;

/// Whether a rewrite adds or removes its template triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewriteKind {
    Insert,
    Delete,
}

impl RewriteKind {
    fn verb(self) -> &'static str {
        match self {
            RewriteKind::Insert => "INSERT",
            RewriteKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for RewriteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A pattern-matched bulk insert or delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub kind: RewriteKind,
    /// Triple template, without braces.
    pub template: String,
    /// Group graph pattern body, without braces.
    pub pattern: String,
}

impl Rewrite {
    pub fn insert(template: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            kind: RewriteKind::Insert,
            template: template.into(),
            pattern: pattern.into(),
        }
    }

    pub fn delete(template: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            kind: RewriteKind::Delete,
            template: template.into(),
            pattern: pattern.into(),
        }
    }

    /// The mutating SPARQL update.
    pub fn to_update(&self) -> String {
        format!(
            "{}{} {{\n{}\n}}\nWHERE {{\n{}\n}}\n",
            vocab::sparql_prologue(),
            self.kind.verb(),
            self.template,
            self.pattern
        )
    }

    /// The non-mutating `CONSTRUCT` query reporting what the update would touch.
    pub fn to_preview(&self) -> String {
        format!(
            "{}CONSTRUCT {{\n{}\n}}\nWHERE {{\n{}\n}}\n",
            vocab::sparql_prologue(),
            self.template,
            self.pattern
        )
    }
}

/// Capability to run bulk rewrites against a triple store.
///
/// `apply` commits the rewrite. `preview` runs it as a read and returns the
/// triples that would be inserted or deleted; an empty result is not an error.
pub trait RewriteExecutor: Send + Sync {
    fn apply(&self, rewrite: &Rewrite) -> RemoteResult<()>;

    fn preview(&self, rewrite: &Rewrite) -> RemoteResult<Vec<Triple>>;
}

impl<E: RewriteExecutor + ?Sized> RewriteExecutor for &E {
    fn apply(&self, rewrite: &Rewrite) -> RemoteResult<()> {
        (**self).apply(rewrite)
    }

    fn preview(&self, rewrite: &Rewrite) -> RemoteResult<Vec<Triple>> {
        (**self).preview(rewrite)
    }
}

/// Dry-run toggle shared by the truthy pass and the purge tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Commit every rewrite.
    #[default]
    Apply,
    /// Report what every rewrite would change; never mutate.
    Preview,
}

impl Mode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run { Mode::Preview } else { Mode::Apply }
    }
}

/// Run one rewrite in the given mode, returning the previewed triples.
pub fn run(executor: &dyn RewriteExecutor, rewrite: &Rewrite, mode: Mode) -> RemoteResult<Vec<Triple>> {
    tracing::debug!(kind = %rewrite.kind, ?mode, "running rewrite");
    match mode {
        Mode::Apply => executor.apply(rewrite).map(|()| Vec::new()),
        Mode::Preview => executor.preview(rewrite),
    }
}

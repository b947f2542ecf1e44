//! Truthy-rank consolidation.
//!
//! For every `(entity, property)` key the engine keeps the store's best-rank
//! markers and shortcut edges (`wdt:`, `wdtn:`) consistent with statement
//! ranks:
//!
//! 1. If any statement of the pair is Preferred, every Preferred statement is best.
//! 2. Otherwise every Normal statement is best. There is no tie-break.
//! 3. Deprecated statements are never best and never touched.
//!
//! A pass is two bulk rewrites per batch of keys, in order:
//!
//! - **Promote** marks unmarked best statements and inserts their shortcuts.
//! - **Demote** unmarks Normal statements that a Preferred one now outranks
//!   and drops their shortcuts, unless a Preferred statement of the same
//!   pair carries the same value.
//!
//! Running a pass on a converged store changes nothing, however the keys are
//! split into batches.

use std::collections::HashSet;
use std::fmt;
use std::fmt::Write as _;

use oxigraph::model::Triple;
use rayon::prelude::*;

use crate::config::TruthyConfig;
use crate::error::{ConfigResult, TruthyError, TruthyResult};
use crate::sparql::{self, Mode, Rewrite, RewriteExecutor};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// An `(entity, property)` pair, by local id (`Q42`, `P31`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TruthyKey {
    pub entity: String,
    pub property: String,
}

impl TruthyKey {
    /// Validate and build a key. Ids are spliced into SPARQL, so only
    /// ASCII letters, digits, '_' and '-' are accepted.
    pub fn new(entity: impl Into<String>, property: impl Into<String>) -> TruthyResult<Self> {
        let entity = entity.into();
        let property = property.into();
        if !is_local_id(&entity) || !is_local_id(&property) {
            return Err(TruthyError::InvalidKey { entity, property });
        }
        Ok(Self { entity, property })
    }
}

impl fmt::Display for TruthyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.entity, self.property)
    }
}

pub(crate) fn is_local_id(id: &str) -> bool {
    id.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

/// Deduplicated keys in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: Vec<TruthyKey>,
    seen: HashSet<TruthyKey>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(entity, property)` pairs, rejecting invalid ids.
    pub fn from_pairs<I, E, P>(pairs: I) -> TruthyResult<Self>
    where
        I: IntoIterator<Item = (E, P)>,
        E: Into<String>,
        P: Into<String>,
    {
        let mut set = Self::new();
        for (entity, property) in pairs {
            set.insert(TruthyKey::new(entity, property)?);
        }
        Ok(set)
    }

    /// Parse one `ENTITY PROPERTY` pair per line. Fields may be separated by
    /// whitespace or a comma; blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> TruthyResult<Self> {
        let mut set = Self::new();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            match fields.as_slice() {
                [entity, property] => {
                    set.insert(TruthyKey::new(*entity, *property)?);
                }
                _ => {
                    return Err(TruthyError::InvalidKey {
                        entity: line.to_string(),
                        property: String::new(),
                    });
                }
            }
        }
        Ok(set)
    }

    /// Add a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: TruthyKey) -> bool {
        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.keys.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TruthyKey> {
        self.keys.iter()
    }

    pub fn as_slice(&self) -> &[TruthyKey] {
        &self.keys
    }

    /// Split into chunks of at most `size` keys.
    pub fn batches(&self, size: usize) -> impl Iterator<Item = &[TruthyKey]> {
        self.keys.chunks(size.max(1))
    }
}

impl FromIterator<TruthyKey> for KeySet {
    fn from_iter<T: IntoIterator<Item = TruthyKey>>(iter: T) -> Self {
        let mut set = Self::new();
        for key in iter {
            set.insert(key);
        }
        set
    }
}

// ---------------------------------------------------------------------------
// Rewrites
// ---------------------------------------------------------------------------

const SHORTCUT_TEMPLATE: &str = "?statement a wikibase:BestRank .
?node ?wdt ?value .
?node ?wdtn ?normalized .";

fn values_block(batch: &[TruthyKey]) -> String {
    let mut out = String::from("VALUES (?node ?p ?ps ?psn ?wdt ?wdtn) {\n");
    for key in batch {
        let p = &key.property;
        let _ = writeln!(
            out,
            "  (wd:{} p:{p} ps:{p} psn:{p} wdt:{p} wdtn:{p})",
            key.entity
        );
    }
    out.push('}');
    out
}

/// Insert the best-rank marker and shortcuts on every unmarked best statement.
///
/// The key table is repeated inside each branch so the optional normalized
/// value is matched against the bound `psn:` predicate.
pub fn promote_rewrite(batch: &[TruthyKey]) -> Rewrite {
    let values = values_block(batch);
    let pattern = format!(
        "{{
{values}
?node ?p ?statement .
?statement wikibase:rank wikibase:PreferredRank ;
           ?ps ?value .
OPTIONAL {{ ?statement ?psn ?normalized }}
FILTER NOT EXISTS {{ ?statement a wikibase:BestRank }}
}}
UNION
{{
{values}
?node ?p ?statement .
?statement wikibase:rank wikibase:NormalRank ;
           ?ps ?value .
OPTIONAL {{ ?statement ?psn ?normalized }}
FILTER NOT EXISTS {{ ?statement a wikibase:BestRank }}
FILTER NOT EXISTS {{ ?node ?p ?preferred . ?preferred wikibase:rank wikibase:PreferredRank }}
}}"
    );
    Rewrite::insert(SHORTCUT_TEMPLATE, pattern)
}

/// Remove the marker and shortcuts from Normal statements outranked by a
/// Preferred statement of the same pair.
pub fn demote_rewrite(batch: &[TruthyKey]) -> Rewrite {
    let values = values_block(batch);
    let pattern = format!(
        "{values}
?node ?p ?statement .
?statement a wikibase:BestRank ;
           wikibase:rank wikibase:NormalRank .
FILTER EXISTS {{ ?node ?p ?preferred . ?preferred wikibase:rank wikibase:PreferredRank }}
OPTIONAL {{
  ?statement ?ps ?value .
  FILTER NOT EXISTS {{ ?node ?p ?keeper . ?keeper wikibase:rank wikibase:PreferredRank ; ?ps ?value }}
}}
OPTIONAL {{
  ?statement ?psn ?normalized .
  FILTER NOT EXISTS {{ ?node ?p ?keeper . ?keeper wikibase:rank wikibase:PreferredRank ; ?psn ?normalized }}
}}"
    );
    Rewrite::delete(SHORTCUT_TEMPLATE, pattern)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The two bulk operations of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Promote,
    Demote,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Promote => write!(f, "promote"),
            Phase::Demote => write!(f, "demote"),
        }
    }
}

/// Progress of one batch through a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Promoting,
    Demoting,
    Failed(Phase),
}

impl PassState {
    /// The state after the current phase succeeds.
    pub fn advance(self) -> Self {
        match self {
            PassState::Idle => PassState::Promoting,
            PassState::Promoting => PassState::Demoting,
            PassState::Demoting => PassState::Idle,
            failed @ PassState::Failed(_) => failed,
        }
    }

    /// The state after the current phase errors.
    pub fn fail(self) -> Self {
        match self {
            PassState::Promoting => PassState::Failed(Phase::Promote),
            PassState::Demoting => PassState::Failed(Phase::Demote),
            other => other,
        }
    }

    pub fn phase(self) -> Option<Phase> {
        match self {
            PassState::Promoting | PassState::Failed(Phase::Promote) => Some(Phase::Promote),
            PassState::Demoting | PassState::Failed(Phase::Demote) => Some(Phase::Demote),
            PassState::Idle => None,
        }
    }
}

/// Outcome of a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub mode: Mode,
    pub keys: usize,
    pub batches: usize,
    /// Triples Promote would insert (preview mode only).
    pub promoted: Vec<Triple>,
    /// Triples Demote would delete (preview mode only).
    pub demoted: Vec<Triple>,
}

impl PassReport {
    fn empty(mode: Mode) -> Self {
        Self {
            mode,
            keys: 0,
            batches: 0,
            promoted: Vec::new(),
            demoted: Vec::new(),
        }
    }

    fn absorb(&mut self, batch: BatchOutcome) {
        self.keys += batch.keys;
        self.batches += 1;
        self.promoted.extend(batch.promoted);
        self.demoted.extend(batch.demoted);
    }

    /// Whether a preview found nothing to change.
    pub fn is_noop(&self) -> bool {
        self.promoted.is_empty() && self.demoted.is_empty()
    }
}

struct BatchOutcome {
    keys: usize,
    promoted: Vec<Triple>,
    demoted: Vec<Triple>,
}

/// Runs truthy passes against a [`RewriteExecutor`].
pub struct TruthyEngine<E> {
    executor: E,
    config: TruthyConfig,
}

impl<E: RewriteExecutor> TruthyEngine<E> {
    pub fn new(executor: E, config: TruthyConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { executor, config })
    }

    /// Run a committing pass.
    pub fn build_truthy(&self, keys: &KeySet) -> TruthyResult<PassReport> {
        self.run(keys, Mode::Apply)
    }

    /// Report what a pass would change without committing anything.
    pub fn preview(&self, keys: &KeySet) -> TruthyResult<PassReport> {
        self.run(keys, Mode::Preview)
    }

    /// Run a pass. Each batch runs Promote then Demote; in parallel mode
    /// batches are dispatched concurrently.
    pub fn run(&self, keys: &KeySet, mode: Mode) -> TruthyResult<PassReport> {
        let batches: Vec<&[TruthyKey]> = keys.batches(self.config.batch_size).collect();
        tracing::info!(
            keys = keys.len(),
            batches = batches.len(),
            ?mode,
            parallel = self.config.parallel,
            "starting truthy pass"
        );

        let outcomes: Vec<BatchOutcome> = if self.config.parallel {
            batches
                .par_iter()
                .map(|batch| self.run_batch(batch, mode))
                .collect::<TruthyResult<_>>()?
        } else {
            batches
                .iter()
                .map(|batch| self.run_batch(batch, mode))
                .collect::<TruthyResult<_>>()?
        };

        let mut report = PassReport::empty(mode);
        for outcome in outcomes {
            report.absorb(outcome);
        }
        tracing::info!(
            keys = report.keys,
            batches = report.batches,
            promoted = report.promoted.len(),
            demoted = report.demoted.len(),
            "truthy pass complete"
        );
        Ok(report)
    }

    fn run_batch(&self, batch: &[TruthyKey], mode: Mode) -> TruthyResult<BatchOutcome> {
        let mut state = PassState::Idle.advance();
        let promoted =
            self.phase(&mut state, Phase::Promote, &promote_rewrite(batch), batch, mode)?;
        state = state.advance();
        let demoted =
            self.phase(&mut state, Phase::Demote, &demote_rewrite(batch), batch, mode)?;
        state = state.advance();
        tracing::debug!(?state, keys = batch.len(), "batch converged");
        Ok(BatchOutcome {
            keys: batch.len(),
            promoted,
            demoted,
        })
    }

    fn phase(
        &self,
        state: &mut PassState,
        phase: Phase,
        rewrite: &Rewrite,
        batch: &[TruthyKey],
        mode: Mode,
    ) -> TruthyResult<Vec<Triple>> {
        debug_assert_eq!(state.phase(), Some(phase));
        tracing::debug!(%phase, keys = batch.len(), "running phase");
        sparql::run(&self.executor, rewrite, mode).map_err(|source| {
            *state = state.fail();
            tracing::warn!(%phase, keys = batch.len(), error = %source, "truthy phase failed");
            TruthyError::PhaseFailed {
                phase,
                batch: batch.to_vec(),
                source,
            }
        })
    }
}

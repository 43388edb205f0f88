//! Resolve report and error types

use crate::cache::Record;
use crate::engine::aggregator::{DispositionCounts, Outcome};
use crate::state::ItemIndex;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a resolve stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every index reached a terminal disposition
    Completed,

    /// The pass bound was reached with transient failures left over
    Exhausted,

    /// Cancellation was requested during a wait or a fetch
    Cancelled,

    /// A fatal adapter failure stopped the run
    Aborted,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a resolve produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    /// One outcome per batch index, in batch order
    pub outcomes: Vec<Outcome>,

    /// Passes started
    pub passes: u32,

    /// Adapter invocations issued, across all passes
    pub adapter_calls: u32,

    pub termination: Termination,

    pub counts: DispositionCounts,
}

impl ResolveReport {
    pub fn new(outcomes: Vec<Outcome>, passes: u32, adapter_calls: u32, termination: Termination) -> Self {
        let counts = DispositionCounts::from_outcomes(&outcomes);
        Self {
            outcomes,
            passes,
            adapter_calls,
            termination,
            counts,
        }
    }

    /// Looks up the outcome for one index
    pub fn outcome(&self, index: &ItemIndex) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| &o.index == index)
    }

    /// Resolved records with their indices, in batch order
    pub fn records(&self) -> impl Iterator<Item = (&ItemIndex, &Record)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.record.as_ref().map(|r| (&o.index, r)))
    }
}

/// Errors that stop a resolve
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The source signalled a condition that needs human intervention
    ///
    /// The partial report covers everything settled before the abort.
    #[error("Fatal source failure at index {index}: {reason}")]
    Fatal {
        index: ItemIndex,
        reason: String,
        report: Box<ResolveReport>,
    },
}

impl ResolveError {
    /// The partial report gathered before the run stopped
    pub fn report(&self) -> &ResolveReport {
        match self {
            Self::Fatal { report, .. } => report,
        }
    }

    pub fn into_report(self) -> ResolveReport {
        match self {
            Self::Fatal { report, .. } => *report,
        }
    }
}

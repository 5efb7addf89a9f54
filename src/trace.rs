//! Trace evaluation: run ordered event sequences against a goal model.
//!
//! Each trace gets its own [`Evaluation`], so traces never observe each
//! other's statuses. Batches fan out over `rayon` since the shared
//! [`GoalModel`] is read-only.

use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::engine::{Evaluation, Firing};
use crate::error::TraceError;
use crate::model::GoalModel;
use crate::status::StatusSnapshot;

/// An ordered sequence of external event identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub events: Vec<String>,
}

impl Trace {
    pub fn new(events: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            label: None,
            events: events.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Parse a single trace from text: events separated by newlines or
    /// commas. Blank entries and `#` comments are skipped.
    pub fn parse_text(text: &str) -> Self {
        let events = text
            .lines()
            .map(strip_comment)
            .flat_map(|line| line.split(','))
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            label: None,
            events,
        }
    }

    /// Parse one or more traces.
    ///
    /// JSON input may be an array of event ids (one trace), an array of such
    /// arrays, or an array of `{ "label": ..., "events": [...] }` objects.
    /// Any other input is read as text with one comma-separated trace per line.
    pub fn parse_batch(input: &str) -> Result<Vec<Self>, TraceError> {
        if !input.trim_start().starts_with('[') {
            return Ok(input
                .lines()
                .map(strip_comment)
                .filter(|line| !line.trim().is_empty())
                .map(Self::parse_text)
                .collect());
        }

        let parsed: TraceFile =
            serde_json::from_str(input).map_err(|e| TraceError::Parse {
                message: e.to_string(),
            })?;
        Ok(match parsed {
            TraceFile::Single(events) => vec![Self::new(events)],
            TraceFile::Many(entries) => entries
                .into_iter()
                .map(|entry| match entry {
                    TraceEntry::Events(events) => Self::new(events),
                    TraceEntry::Labelled(trace) => trace,
                })
                .collect(),
        })
    }

    /// Read traces from a file (see [`Trace::parse_batch`]).
    pub fn load(path: &Path) -> Result<Vec<Self>, TraceError> {
        let content = std::fs::read_to_string(path).map_err(|e| TraceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse_batch(&content)
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(before, _)| before)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraceFile {
    Single(Vec<String>),
    Many(Vec<TraceEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraceEntry {
    Events(Vec<String>),
    Labelled(Trace),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Options for trace evaluation.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Capture a full status snapshot after every event (default: true).
    pub record_snapshots: bool,
    /// Evaluate batches on the rayon thread pool (default: true).
    pub parallel: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            record_snapshots: true,
            parallel: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// What happened when one event of a trace was processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub index: usize,
    pub event: String,
    pub mapped: bool,
    pub firings: Vec<Firing>,
    pub changed: Vec<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StatusSnapshot>,
}

/// Result of evaluating one trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub steps: Vec<TraceStep>,
    pub final_status: StatusSnapshot,
}

impl TraceReport {
    /// Events that had no mapping, in trace order.
    pub fn unmapped_events(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| !s.mapped)
            .map(|s| s.event.as_str())
            .collect()
    }

    /// Total number of rule applications across the trace.
    pub fn firing_count(&self) -> usize {
        self.steps.iter().map(|s| s.firings.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one trace on a fresh evaluation of `model`.
pub fn evaluate_trace(model: &Arc<GoalModel>, trace: &Trace, config: &TraceConfig) -> TraceReport {
    let mut evaluation = Evaluation::new(Arc::clone(model));
    let mut steps = Vec::with_capacity(trace.len());

    for (index, event) in trace.events.iter().enumerate() {
        let outcome = evaluation.process_event(event);
        let changed = outcome.changed().into_iter().cloned().collect();
        steps.push(TraceStep {
            index,
            event: outcome.event,
            mapped: outcome.mapped,
            firings: outcome.firings,
            changed,
            snapshot: config.record_snapshots.then(|| evaluation.snapshot()),
        });
    }

    let report = TraceReport {
        label: trace.label.clone(),
        steps,
        final_status: evaluation.snapshot(),
    };
    tracing::info!(
        label = trace.label.as_deref().unwrap_or("-"),
        events = trace.len(),
        firings = report.firing_count(),
        unmapped = report.unmapped_events().len(),
        "trace evaluated"
    );
    report
}

/// Evaluate every trace independently. Output order matches input order.
pub fn evaluate_traces(
    model: &Arc<GoalModel>,
    traces: &[Trace],
    config: &TraceConfig,
) -> Vec<TraceReport> {
    tracing::info!(
        traces = traces.len(),
        parallel = config.parallel,
        "evaluating trace batch"
    );
    if config.parallel {
        traces
            .par_iter()
            .map(|t| evaluate_trace(model, t, config))
            .collect()
    } else {
        traces
            .iter()
            .map(|t| evaluate_trace(model, t, config))
            .collect()
    }
}

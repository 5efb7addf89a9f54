// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # goaltrace
//!
//! Trace-driven satisfaction analysis for i* goal models. A process trace is
//! replayed event by event; each event marks mapped tasks and goals as
//! executed, and a fixed rule set propagates the effect up the model.
//!
//! ## Architecture
//!
//! - **Elements** (`element`): ids, kinds, link types and status values
//! - **Model** (`model`): immutable petgraph-backed goal model plus event mapping
//! - **Status** (`status`): per-evaluation status store and snapshots
//! - **Rules** (`rules`): the seven propagation rules, in priority order
//! - **Engine** (`engine`): event processing and upward propagation
//! - **Traces** (`trace`): trace parsing, reports and parallel batch evaluation
//! - **Descriptions** (`description`): TOML/JSON model files
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use goaltrace::element::LinkType;
//! use goaltrace::engine::Evaluation;
//! use goaltrace::model::GoalModel;
//!
//! let mut model = GoalModel::new();
//! model.add_goal("G3").unwrap();
//! model.add_task("T8").unwrap();
//! model.add_link("G3", "T8", LinkType::And).unwrap();
//! model.add_event_mapping("e8", "T8").unwrap();
//!
//! let mut eval = Evaluation::new(Arc::new(model));
//! eval.process_event("e8");
//! assert!(eval.is_satisfied("G3"));
//! ```

pub mod description;
pub mod element;
pub mod engine;
pub mod error;
pub mod model;
pub mod rules;
pub mod status;
pub mod trace;

pub use engine::Evaluation;
pub use error::{GoalTraceError, GoalTraceResult};
pub use model::GoalModel;

//! Rich diagnostic error types for goal-model evaluation.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so users know exactly which part of a
//! model or trace is malformed and how to fix it.

use miette::Diagnostic;
use thiserror::Error;

use crate::element::{ElementId, ElementKind, LinkType};

/// Top-level error type for goaltrace.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum GoalTraceError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Description(#[from] DescriptionError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Trace(#[from] TraceError),
}

// ---------------------------------------------------------------------------
// Model (configuration) errors
// ---------------------------------------------------------------------------

/// Malformed goal model. Fatal at construction time: a model that produced
/// one of these is never evaluated.
#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("unknown element: {id}")]
    #[diagnostic(
        code(goaltrace::model::unknown_element),
        help(
            "Links may only reference elements that were already added. \
             Declare the task, goal, or quality before linking it."
        )
    )]
    UnknownElement { id: ElementId },

    #[error("element {id} already exists as a {existing}")]
    #[diagnostic(
        code(goaltrace::model::duplicate_element),
        help("Element identifiers are unique across tasks, goals, and qualities.")
    )]
    DuplicateElement { id: ElementId, existing: ElementKind },

    #[error("{link_type} link from quality {parent} to {child}")]
    #[diagnostic(
        code(goaltrace::model::quality_refinement),
        help(
            "Qualities are never refined. AND/OR links must have a task or goal \
             as parent; use MAKE/BREAK links to connect a quality to its contributors."
        )
    )]
    QualityRefinement {
        parent: ElementId,
        child: ElementId,
        link_type: LinkType,
    },

    #[error("{link_type} link from non-quality {parent}")]
    #[diagnostic(
        code(goaltrace::model::contribution_parent),
        help("MAKE/BREAK contribution links must have a quality as parent.")
    )]
    ContributionParent { parent: ElementId, link_type: LinkType },

    #[error("quality {child} used as child of {parent}")]
    #[diagnostic(
        code(goaltrace::model::quality_child),
        help(
            "Qualities only appear as link parents. Links between two qualities \
             and refinements into a quality are not allowed."
        )
    )]
    QualityChild { parent: ElementId, child: ElementId },

    #[error("event {event} maps to unknown element {id}")]
    #[diagnostic(
        code(goaltrace::model::unknown_mapped_element),
        help("Every element named in the event mapping must exist in the model.")
    )]
    UnknownMappedElement { event: String, id: ElementId },

    #[error("event {event} maps to an empty element group")]
    #[diagnostic(
        code(goaltrace::model::empty_group),
        help("Give the group at least one element, or drop the mapping.")
    )]
    EmptyGroup { event: String },
}

// ---------------------------------------------------------------------------
// Model description errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DescriptionError {
    #[error("failed to read model description: {path}")]
    #[diagnostic(
        code(goaltrace::description::io),
        help("Ensure the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model description {path}: {message}")]
    #[diagnostic(
        code(goaltrace::description::parse),
        help(
            "A model description lists `tasks`, `goals`, `qualities`, `links` \
             (parent, child, type) and an `events` table."
        )
    )]
    Parse { path: String, message: String },

    #[error("unsupported model description format: {path}")]
    #[diagnostic(
        code(goaltrace::description::format),
        help("Use a `.toml` or `.json` file.")
    )]
    UnsupportedFormat { path: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),
}

// ---------------------------------------------------------------------------
// Trace errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum TraceError {
    #[error("failed to read trace file: {path}")]
    #[diagnostic(
        code(goaltrace::trace::io),
        help("Ensure the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse traces: {message}")]
    #[diagnostic(
        code(goaltrace::trace::parse),
        help(
            "Traces are JSON arrays of event ids (or arrays of such arrays), \
             or plain text with one event per line or comma separated."
        )
    )]
    Parse { message: String },
}

/// Result type for model construction.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Convenience alias for functions returning goaltrace results.
pub type GoalTraceResult<T> = std::result::Result<T, GoalTraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_converts_to_top_level() {
        let err = ModelError::UnknownElement { id: "T9".into() };
        let top: GoalTraceError = err.into();
        assert!(matches!(
            top,
            GoalTraceError::Model(ModelError::UnknownElement { .. })
        ));
    }

    #[test]
    fn description_error_wraps_model_error() {
        let err = ModelError::EmptyGroup { event: "e1".into() };
        let desc: DescriptionError = err.into();
        assert!(matches!(
            desc,
            DescriptionError::Model(ModelError::EmptyGroup { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = ModelError::QualityRefinement {
            parent: "Q1".into(),
            child: "T1".into(),
            link_type: LinkType::And,
        };
        let msg = format!("{err}");
        assert!(msg.contains("AND"));
        assert!(msg.contains("Q1"));
        assert!(msg.contains("T1"));

        let err = ModelError::DuplicateElement {
            id: "G1".into(),
            existing: ElementKind::Goal,
        };
        assert_eq!(format!("{err}"), "element G1 already exists as a goal");
    }
}

//! Core element types for goal-model evaluation.
//!
//! Every task, goal, and quality is identified by an [`ElementId`] and has
//! exactly one [`ElementKind`]. Tasks and goals share the [`ElementStatus`]
//! domain; qualities use [`QualityStatus`]. Elements are connected by
//! directed [`Link`]s labelled with a [`LinkType`].

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Opaque, unique identifier of a model element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create an identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for ElementId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ElementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ElementId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&ElementId> for ElementId {
    fn from(id: &ElementId) -> Self {
        id.clone()
    }
}

/// The three disjoint kinds of model element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Task,
    Goal,
    Quality,
}

impl ElementKind {
    /// Tasks and goals are refined by AND/OR links and share a status domain.
    pub fn is_refinable(self) -> bool {
        matches!(self, Self::Task | Self::Goal)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Goal => write!(f, "goal"),
            Self::Quality => write!(f, "quality"),
        }
    }
}

/// Satisfaction status of a task or goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    /// No evidence yet.
    #[default]
    Unknown,
    /// Satisfied and counted as live evidence for parents and qualities.
    SatisfiedNotPending,
    /// Satisfied in the past, but withdrawn as evidence after a quality
    /// conflict was resolved against it. Terminal within one evaluation.
    SatisfiedPending,
}

impl ElementStatus {
    /// Whether the element currently counts as live evidence.
    pub fn is_live(self) -> bool {
        self == Self::SatisfiedNotPending
    }

    /// Whether the element executed at some point, live or not.
    pub fn is_satisfied(self) -> bool {
        matches!(self, Self::SatisfiedNotPending | Self::SatisfiedPending)
    }
}

impl fmt::Display for ElementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::SatisfiedNotPending => write!(f, "satisfied"),
            Self::SatisfiedPending => write!(f, "satisfied (pending)"),
        }
    }
}

/// Status of a quality (softgoal).
///
/// A quality may flip between `Fulfilled` and `Denied` as conflicting
/// contributions arrive, but never returns to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    #[default]
    Unknown,
    Fulfilled,
    Denied,
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Denied => write!(f, "denied"),
        }
    }
}

/// Status of any element, as returned by introspection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Status {
    Element(ElementStatus),
    Quality(QualityStatus),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(s) => fmt::Display::fmt(s, f),
            Self::Quality(s) => fmt::Display::fmt(s, f),
        }
    }
}

/// Label of a directed link between two elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Parent task/goal is satisfied when every AND-child is.
    #[serde(alias = "AND")]
    And,
    /// Parent task/goal is satisfied when any OR-child is.
    #[serde(alias = "OR")]
    Or,
    /// Child contributes positively to a parent quality.
    #[serde(alias = "MAKE")]
    Make,
    /// Child contributes negatively to a parent quality.
    #[serde(alias = "BREAK")]
    Break,
}

impl LinkType {
    /// AND/OR links refine a task or goal.
    pub fn is_refinement(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// MAKE/BREAK links contribute to a quality.
    pub fn is_contribution(self) -> bool {
        matches!(self, Self::Make | Self::Break)
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Make => write!(f, "MAKE"),
            Self::Break => write!(f, "BREAK"),
        }
    }
}

/// A directed, labelled edge `parent --type--> child`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub parent: ElementId,
    pub child: ElementId,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

impl Link {
    pub fn new(
        parent: impl Into<ElementId>,
        child: impl Into<ElementId>,
        link_type: LinkType,
    ) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            link_type,
        }
    }
}

/// A set of elements fired together as one unit when an event occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementGroup(Vec<ElementId>);

impl ElementGroup {
    pub fn new(members: impl IntoIterator<Item = impl Into<ElementId>>) -> Self {
        Self(members.into_iter().map(Into::into).collect())
    }

    pub fn members(&self) -> &[ElementId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ElementGroup {
    fn from(id: &str) -> Self {
        Self(vec![ElementId::from(id)])
    }
}

impl From<ElementId> for ElementGroup {
    fn from(id: ElementId) -> Self {
        Self(vec![id])
    }
}

impl From<Vec<ElementId>> for ElementGroup {
    fn from(ids: Vec<ElementId>) -> Self {
        Self(ids)
    }
}

impl From<&[&str]> for ElementGroup {
    fn from(ids: &[&str]) -> Self {
        Self::new(ids.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ElementGroup {
    fn from(ids: [&str; N]) -> Self {
        Self::new(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_status_liveness() {
        assert!(!ElementStatus::Unknown.is_live());
        assert!(ElementStatus::SatisfiedNotPending.is_live());
        assert!(!ElementStatus::SatisfiedPending.is_live());

        assert!(!ElementStatus::Unknown.is_satisfied());
        assert!(ElementStatus::SatisfiedNotPending.is_satisfied());
        assert!(ElementStatus::SatisfiedPending.is_satisfied());
    }

    #[test]
    fn link_type_classes() {
        assert!(LinkType::And.is_refinement());
        assert!(LinkType::Or.is_refinement());
        assert!(!LinkType::Make.is_refinement());
        assert!(LinkType::Break.is_contribution());
        assert!(!LinkType::And.is_contribution());
    }

    #[test]
    fn element_id_borrows_as_str() {
        let mut set = std::collections::HashSet::new();
        set.insert(ElementId::from("T1"));
        assert!(set.contains("T1"));
        assert_eq!(ElementId::new("G3").to_string(), "G3");
    }

    #[test]
    fn group_conversions() {
        let single: ElementGroup = "T1".into();
        assert_eq!(single.members(), &[ElementId::from("T1")]);

        let pair: ElementGroup = ["T3", "G1"].into();
        assert_eq!(pair.members().len(), 2);
        assert!(!pair.is_empty());
    }

    #[test]
    fn statuses_serialize_snake_case() {
        let json = serde_json::to_string(&ElementStatus::SatisfiedNotPending).unwrap();
        assert_eq!(json, "\"satisfied_not_pending\"");
        let json = serde_json::to_string(&QualityStatus::Denied).unwrap();
        assert_eq!(json, "\"denied\"");
        let link: LinkType = serde_json::from_str("\"break\"").unwrap();
        assert_eq!(link, LinkType::Break);
    }
}

//! Mutable per-evaluation status of every model element.
//!
//! A [`StatusStore`] is owned by exactly one evaluation. Mutation goes
//! through `set_element`/`set_quality`, which only the rule set calls.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementKind, ElementStatus, QualityStatus, Status};
use crate::model::GoalModel;

/// Tri-state status of every task/goal and every quality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusStore {
    elements: HashMap<ElementId, ElementStatus>,
    qualities: HashMap<ElementId, QualityStatus>,
}

impl StatusStore {
    /// A pristine store for `model`: every element starts `Unknown`.
    pub fn for_model(model: &GoalModel) -> Self {
        let elements = model
            .tasks()
            .chain(model.goals())
            .map(|id| (id.clone(), ElementStatus::Unknown))
            .collect();
        let qualities = model
            .qualities()
            .map(|id| (id.clone(), QualityStatus::Unknown))
            .collect();
        Self {
            elements,
            qualities,
        }
    }

    /// Status of a task or goal.
    pub fn element(&self, id: &str) -> Option<ElementStatus> {
        self.elements.get(id).copied()
    }

    /// Status of a quality.
    pub fn quality(&self, id: &str) -> Option<QualityStatus> {
        self.qualities.get(id).copied()
    }

    /// Status of any element.
    pub fn status(&self, id: &str) -> Option<Status> {
        self.element(id)
            .map(Status::Element)
            .or_else(|| self.quality(id).map(Status::Quality))
    }

    /// True iff `id` is a task/goal currently counted as live evidence.
    pub fn is_live(&self, id: &str) -> bool {
        self.element(id).is_some_and(ElementStatus::is_live)
    }

    /// Set a task/goal status. Ids outside the store are ignored.
    /// Returns the previous status.
    pub(crate) fn set_element(&mut self, id: &str, status: ElementStatus) -> Option<ElementStatus> {
        self.elements
            .get_mut(id)
            .map(|slot| std::mem::replace(slot, status))
    }

    /// Set a quality status. Ids outside the store are ignored.
    /// Returns the previous status.
    pub(crate) fn set_quality(&mut self, id: &str, status: QualityStatus) -> Option<QualityStatus> {
        self.qualities
            .get_mut(id)
            .map(|slot| std::mem::replace(slot, status))
    }

    /// Number of tracked tasks/goals and qualities.
    pub fn len(&self) -> usize {
        self.elements.len() + self.qualities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered, serializable copy of all statuses at one point in a trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub tasks: BTreeMap<ElementId, ElementStatus>,
    pub goals: BTreeMap<ElementId, ElementStatus>,
    pub qualities: BTreeMap<ElementId, QualityStatus>,
}

impl StatusSnapshot {
    /// Copy the current statuses out of `store`, grouped by element kind.
    pub fn capture(model: &GoalModel, store: &StatusStore) -> Self {
        let collect = |kind: ElementKind| {
            model
                .elements_of(kind)
                .map(|id| (id.clone(), store.element(id).unwrap_or_default()))
                .collect()
        };
        Self {
            tasks: collect(ElementKind::Task),
            goals: collect(ElementKind::Goal),
            qualities: model
                .qualities()
                .map(|id| (id.clone(), store.quality(id).unwrap_or_default()))
                .collect(),
        }
    }

    /// Status of any element in the snapshot.
    pub fn status(&self, id: &str) -> Option<Status> {
        self.tasks
            .get(id)
            .or_else(|| self.goals.get(id))
            .map(|s| Status::Element(*s))
            .or_else(|| self.qualities.get(id).map(|s| Status::Quality(*s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> GoalModel {
        let mut gm = GoalModel::new();
        gm.add_task("T").unwrap();
        gm.add_goal("G").unwrap();
        gm.add_quality("Q").unwrap();
        gm
    }

    #[test]
    fn fresh_store_is_all_unknown() {
        let store = StatusStore::for_model(&model());
        assert_eq!(store.len(), 3);
        assert_eq!(store.element("T"), Some(ElementStatus::Unknown));
        assert_eq!(store.element("G"), Some(ElementStatus::Unknown));
        assert_eq!(store.quality("Q"), Some(QualityStatus::Unknown));
        assert_eq!(store.element("Q"), None);
        assert_eq!(store.quality("T"), None);
    }

    #[test]
    fn set_returns_previous_and_ignores_unknown_ids() {
        let mut store = StatusStore::for_model(&model());
        let prev = store.set_element("T", ElementStatus::SatisfiedNotPending);
        assert_eq!(prev, Some(ElementStatus::Unknown));
        assert!(store.is_live("T"));

        assert_eq!(store.set_element("X", ElementStatus::SatisfiedNotPending), None);
        assert_eq!(store.set_element("Q", ElementStatus::SatisfiedNotPending), None);
        assert_eq!(store.len(), 3);

        store.set_quality("Q", QualityStatus::Denied);
        assert_eq!(store.status("Q"), Some(Status::Quality(QualityStatus::Denied)));
    }

    #[test]
    fn snapshot_groups_by_kind() {
        let gm = model();
        let mut store = StatusStore::for_model(&gm);
        store.set_element("G", ElementStatus::SatisfiedPending);

        let snap = StatusSnapshot::capture(&gm, &store);
        assert_eq!(snap.tasks.len(), 1);
        assert_eq!(snap.goals.get("G"), Some(&ElementStatus::SatisfiedPending));
        assert_eq!(
            snap.status("Q"),
            Some(Status::Quality(QualityStatus::Unknown))
        );
        assert_eq!(snap.status("nope"), None);
    }
}

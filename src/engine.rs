//! Evaluation facade: one goal model paired with one status store.
//!
//! An [`Evaluation`] owns the mutable state for a single trace. It resolves
//! events to element groups, fires each element, and propagates the effect
//! upward through the link graph until no rule applies. The [`GoalModel`] is
//! shared read-only, so any number of evaluations may run side by side.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementKind, ElementStatus, QualityStatus, Status};
use crate::model::GoalModel;
use crate::rules::{self, Rule};
use crate::status::{StatusSnapshot, StatusStore};

/// One successful rule application during propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    pub element: ElementId,
    pub rule: Rule,
}

/// Result of processing one external event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub event: String,
    /// Whether the event had any mapped group. Unmapped events are no-ops.
    pub mapped: bool,
    /// Rule applications in the order they happened.
    pub firings: Vec<Firing>,
}

impl EventOutcome {
    /// Elements whose status changed, in first-change order, without duplicates.
    pub fn changed(&self) -> Vec<&ElementId> {
        dedup_elements(&self.firings)
    }
}

fn dedup_elements(firings: &[Firing]) -> Vec<&ElementId> {
    let mut out: Vec<&ElementId> = Vec::with_capacity(firings.len());
    for f in firings {
        if !out.contains(&&f.element) {
            out.push(&f.element);
        }
    }
    out
}

/// Model + status pair for evaluating a single trace.
#[derive(Debug, Clone)]
pub struct Evaluation {
    model: Arc<GoalModel>,
    store: StatusStore,
    /// Change-set of the most recent `fire_element` call.
    firings: Vec<Firing>,
}

impl Evaluation {
    /// Start a fresh evaluation: every element `Unknown`.
    pub fn new(model: Arc<GoalModel>) -> Self {
        let store = StatusStore::for_model(&model);
        Self {
            model,
            store,
            firings: Vec::new(),
        }
    }

    /// Discard all statuses and start over from `Unknown`.
    pub fn reset(&mut self) {
        self.store = StatusStore::for_model(&self.model);
        self.firings.clear();
    }

    pub fn model(&self) -> &GoalModel {
        &self.model
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Fire every element of every group mapped to `event`, in mapping order.
    ///
    /// Unmapped events leave the statuses untouched.
    pub fn process_event(&mut self, event: &str) -> EventOutcome {
        let model = Arc::clone(&self.model);
        let groups = model.groups_for(event);
        if groups.is_empty() {
            tracing::debug!(event, "event has no mapping, ignoring");
        }

        let mut firings = Vec::new();
        for group in groups {
            for element in group.members() {
                self.fire_element(element);
                firings.append(&mut self.firings);
            }
        }
        self.firings = firings.clone();

        EventOutcome {
            event: event.to_string(),
            mapped: !groups.is_empty(),
            firings,
        }
    }

    // -----------------------------------------------------------------------
    // Propagation
    // -----------------------------------------------------------------------

    /// Fire one element and propagate to its ancestors.
    ///
    /// Clears the change-set first; returns the elements changed by this fire.
    pub fn fire_element(&mut self, id: &str) -> Vec<&ElementId> {
        self.firings.clear();
        self.fire_closure(vec![ElementId::from(id)]);
        self.changed_elements()
    }

    /// Depth-first upward closure: every element of `frontier` that fires a
    /// rule is recorded and its parents become the next frontier.
    fn fire_closure(&mut self, frontier: Vec<ElementId>) {
        let model = Arc::clone(&self.model);
        for element in frontier {
            let Some(rule) = self.try_any_rule(&element) else {
                continue;
            };
            tracing::trace!(element = element.as_str(), rule = rule.name(), "propagating");
            let parents = model.parents(&element).into_iter().cloned().collect();
            self.firings.push(Firing { element, rule });
            self.fire_closure(parents);
        }
    }

    /// Apply the first rule whose precondition holds for `id`.
    pub fn try_any_rule(&mut self, id: &str) -> Option<Rule> {
        rules::try_any_rule(&self.model, &mut self.store, id)
    }

    /// Elements changed by the latest `fire_element` or `process_event`.
    pub fn changed_elements(&self) -> Vec<&ElementId> {
        dedup_elements(&self.firings)
    }

    /// Rule applications of the latest `fire_element` or `process_event`.
    pub fn firings(&self) -> &[Firing] {
        &self.firings
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn element_status(&self, id: &str) -> Option<ElementStatus> {
        self.store.element(id)
    }

    pub fn quality_status(&self, id: &str) -> Option<QualityStatus> {
        self.store.quality(id)
    }

    pub fn status_of(&self, id: &str) -> Option<Status> {
        self.store.status(id)
    }

    /// Whether a task/goal executed, whether or not it is still live evidence.
    pub fn is_satisfied(&self, id: &str) -> bool {
        self.store.element(id).is_some_and(ElementStatus::is_satisfied)
    }

    /// Whether a task/goal currently counts as live evidence.
    pub fn is_live(&self, id: &str) -> bool {
        self.store.is_live(id)
    }

    pub fn task_statuses(&self) -> BTreeMap<ElementId, ElementStatus> {
        self.element_statuses(ElementKind::Task)
    }

    pub fn goal_statuses(&self) -> BTreeMap<ElementId, ElementStatus> {
        self.element_statuses(ElementKind::Goal)
    }

    pub fn quality_statuses(&self) -> BTreeMap<ElementId, QualityStatus> {
        self.model
            .qualities()
            .map(|id| (id.clone(), self.store.quality(id).unwrap_or_default()))
            .collect()
    }

    fn element_statuses(&self, kind: ElementKind) -> BTreeMap<ElementId, ElementStatus> {
        self.model
            .elements_of(kind)
            .map(|id| (id.clone(), self.store.element(id).unwrap_or_default()))
            .collect()
    }

    /// Copy of every status, grouped by kind.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot::capture(&self.model, &self.store)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::element::LinkType;

    fn changed_set(ev: &Evaluation) -> HashSet<String> {
        ev.changed_elements()
            .into_iter()
            .map(|id| id.to_string())
            .collect()
    }

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn chain_model() -> Arc<GoalModel> {
        let mut gm = GoalModel::new();
        gm.add_quality("Q0").unwrap();
        gm.add_goal("G").unwrap();
        gm.add_task("T").unwrap();
        gm.add_link("Q0", "G", LinkType::Make).unwrap();
        gm.add_link("G", "T", LinkType::And).unwrap();
        Arc::new(gm)
    }

    #[test]
    fn propagation_reaches_quality() {
        let mut ev = Evaluation::new(chain_model());
        ev.fire_element("T");

        assert_eq!(changed_set(&ev), set(&["T", "G", "Q0"]));
        assert_eq!(ev.quality_status("Q0"), Some(QualityStatus::Fulfilled));
        assert!(ev.is_live("G"));
        assert!(ev.is_live("T"));
    }

    #[test]
    fn firing_refined_element_does_nothing() {
        let mut ev = Evaluation::new(chain_model());
        let changed = ev.fire_element("G");

        assert!(changed.is_empty());
        assert_eq!(ev.quality_status("Q0"), Some(QualityStatus::Unknown));
        assert_eq!(ev.element_status("G"), Some(ElementStatus::Unknown));
        assert_eq!(ev.element_status("T"), Some(ElementStatus::Unknown));
    }

    #[test]
    fn second_fire_of_leaf_is_empty() {
        let mut ev = Evaluation::new(chain_model());
        assert_eq!(ev.fire_element("T").len(), 3);
        assert!(ev.fire_element("T").is_empty());
        assert!(ev.is_live("T"));
    }

    #[test]
    fn propagation_through_shared_child() {
        let mut gm = GoalModel::new();
        gm.add_quality("Q").unwrap();
        gm.add_goal("P1").unwrap();
        gm.add_task("CP12").unwrap();
        gm.add_goal("P2").unwrap();
        gm.add_task("CP2").unwrap();
        gm.add_link("Q", "P1", LinkType::Make).unwrap();
        gm.add_link("P1", "CP12", LinkType::And).unwrap();
        gm.add_link("P2", "CP12", LinkType::And).unwrap();
        gm.add_link("P2", "CP2", LinkType::And).unwrap();
        let mut ev = Evaluation::new(Arc::new(gm));

        ev.fire_element("CP2");
        assert_eq!(changed_set(&ev), set(&["CP2"]));
        ev.fire_element("CP12");
        assert_eq!(changed_set(&ev), set(&["CP12", "P2", "P1", "Q"]));
    }

    #[test]
    fn root_fire_only_changes_itself() {
        let mut gm = GoalModel::new();
        gm.add_task("R").unwrap();
        gm.add_task("Other").unwrap();
        let mut ev = Evaluation::new(Arc::new(gm));

        ev.fire_element("R");
        assert_eq!(changed_set(&ev), set(&["R"]));
        assert_eq!(ev.element_status("Other"), Some(ElementStatus::Unknown));
    }

    #[test]
    fn firing_unknown_id_is_noop() {
        let mut ev = Evaluation::new(chain_model());
        assert!(ev.fire_element("missing").is_empty());
    }

    #[test]
    fn process_event_fires_groups_in_order() {
        let mut gm = GoalModel::new();
        gm.add_goal("G").unwrap();
        gm.add_task("T1").unwrap();
        gm.add_task("T2").unwrap();
        gm.add_task("T3").unwrap();
        gm.add_link("G", "T1", LinkType::And).unwrap();
        gm.add_link("G", "T2", LinkType::And).unwrap();
        gm.add_event_mapping("both", ["T1", "T2"]).unwrap();
        gm.add_event_mapping("both", "T3").unwrap();
        let mut ev = Evaluation::new(Arc::new(gm));

        let outcome = ev.process_event("both");
        assert!(outcome.mapped);
        let changed: Vec<_> = outcome.changed().into_iter().map(|id| id.as_str()).collect();
        assert_eq!(changed, vec!["T1", "T2", "G", "T3"]);
        assert_eq!(
            outcome.firings[2],
            Firing {
                element: "G".into(),
                rule: Rule::AndRefinement
            }
        );
        assert_eq!(changed_set(&ev), set(&["T1", "T2", "G", "T3"]));
    }

    #[test]
    fn unmapped_event_is_noop() {
        let model = chain_model();
        let mut ev = Evaluation::new(model);
        let before = ev.snapshot();

        let outcome = ev.process_event("nobody-listens");
        assert!(!outcome.mapped);
        assert!(outcome.firings.is_empty());
        assert_eq!(ev.snapshot(), before);
    }

    #[test]
    fn conflict_flips_quality_and_demotes() {
        let mut gm = GoalModel::new();
        gm.add_quality("Q").unwrap();
        gm.add_task("M").unwrap();
        gm.add_task("B").unwrap();
        gm.add_link("Q", "M", LinkType::Make).unwrap();
        gm.add_link("Q", "B", LinkType::Break).unwrap();
        let mut ev = Evaluation::new(Arc::new(gm));

        ev.fire_element("B");
        assert_eq!(ev.quality_status("Q"), Some(QualityStatus::Denied));
        assert!(ev.is_live("B"));

        ev.fire_element("M");
        assert_eq!(ev.quality_status("Q"), Some(QualityStatus::Fulfilled));
        assert!(ev.is_live("M"));
        assert_eq!(ev.element_status("B"), Some(ElementStatus::SatisfiedPending));
        assert!(ev.is_satisfied("B"));
        assert!(!ev.is_live("B"));
        assert_eq!(
            ev.firings().last().map(|f| f.rule),
            Some(Rule::BreakPendingFulfill)
        );

        // Pending is terminal.
        assert!(ev.fire_element("B").is_empty());
        assert_eq!(ev.element_status("B"), Some(ElementStatus::SatisfiedPending));
    }

    #[test]
    fn reset_restores_unknown() {
        let mut ev = Evaluation::new(chain_model());
        ev.fire_element("T");
        ev.reset();
        assert!(ev.changed_elements().is_empty());
        assert!(ev.task_statuses().values().all(|s| *s == ElementStatus::Unknown));
        assert!(ev.goal_statuses().values().all(|s| *s == ElementStatus::Unknown));
        assert_eq!(
            ev.quality_statuses().get("Q0"),
            Some(&QualityStatus::Unknown)
        );
    }
}

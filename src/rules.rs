//! The seven satisfaction rules and their fixed priority order.
//!
//! Rules are plain data: a [`Rule`] names one transition, and
//! [`Rule::try_fire`] checks its precondition against the model and status
//! store, performing exactly one status mutation when it holds. Rules are
//! always tried in [`Rule::PRIORITY`] order and the first success wins.
//!
//! | Rule | From | To |
//! |---|---|---|
//! | P-IE | leaf task/goal, unknown | satisfied |
//! | P-OR | unknown, any OR-child live | satisfied |
//! | P-AND | unknown, every AND-child live | satisfied |
//! | P-MAKE | quality unknown, any MAKE-child live | fulfilled |
//! | P-BREAK | quality unknown, any BREAK-child live | denied |
//! | BP-FULFILL | quality denied, any MAKE-child live | fulfilled, BREAK side demoted |
//! | BP-DENY | quality fulfilled, any BREAK-child live | denied, MAKE side demoted |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::{ElementId, ElementStatus, LinkType, QualityStatus};
use crate::model::GoalModel;
use crate::status::StatusStore;

/// One satisfaction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// P-IE: a leaf task/goal is satisfied by being executed directly.
    PrimitiveExecution,
    /// P-OR: any live OR-child satisfies the parent.
    OrRefinement,
    /// P-AND: all AND-children live satisfies the parent.
    AndRefinement,
    /// P-MAKE: a live MAKE-child fulfills an undecided quality.
    Make,
    /// P-BREAK: a live BREAK-child denies an undecided quality.
    Break,
    /// BP-FULFILL: a live MAKE-child overrides a denial.
    BreakPendingFulfill,
    /// BP-DENY: a live BREAK-child overrides a fulfillment.
    BreakPendingDeny,
}

impl Rule {
    /// Evaluation order. At most one rule fires per element per step.
    pub const PRIORITY: [Rule; 7] = [
        Rule::PrimitiveExecution,
        Rule::OrRefinement,
        Rule::AndRefinement,
        Rule::Make,
        Rule::Break,
        Rule::BreakPendingFulfill,
        Rule::BreakPendingDeny,
    ];

    /// Short conventional name (e.g. `P-AND`).
    pub fn name(self) -> &'static str {
        match self {
            Rule::PrimitiveExecution => "P-IE",
            Rule::OrRefinement => "P-OR",
            Rule::AndRefinement => "P-AND",
            Rule::Make => "P-MAKE",
            Rule::Break => "P-BREAK",
            Rule::BreakPendingFulfill => "BP-FULFILL",
            Rule::BreakPendingDeny => "BP-DENY",
        }
    }

    /// Apply this rule to `id` if its precondition holds.
    ///
    /// Returns `true` iff the rule fired and mutated `store`.
    pub fn try_fire(self, model: &GoalModel, store: &mut StatusStore, id: &str) -> bool {
        let fired = match self {
            Rule::PrimitiveExecution => {
                let executable = model.kind(id).is_some_and(|k| k.is_refinable())
                    && model.is_leaf(id)
                    && store.element(id) == Some(ElementStatus::Unknown);
                if executable {
                    store.set_element(id, ElementStatus::SatisfiedNotPending);
                }
                executable
            }
            Rule::OrRefinement => {
                let satisfied = store.element(id) == Some(ElementStatus::Unknown)
                    && model
                        .links_from(id, LinkType::Or)
                        .into_iter()
                        .any(|c| store.is_live(c));
                if satisfied {
                    store.set_element(id, ElementStatus::SatisfiedNotPending);
                }
                satisfied
            }
            Rule::AndRefinement => {
                let children = model.links_from(id, LinkType::And);
                let satisfied = store.element(id) == Some(ElementStatus::Unknown)
                    && !children.is_empty()
                    && children.into_iter().all(|c| store.is_live(c));
                if satisfied {
                    store.set_element(id, ElementStatus::SatisfiedNotPending);
                }
                satisfied
            }
            Rule::Make => decide(model, store, id, LinkType::Make, QualityStatus::Fulfilled),
            Rule::Break => decide(model, store, id, LinkType::Break, QualityStatus::Denied),
            Rule::BreakPendingFulfill => override_conflict(
                model,
                store,
                id,
                LinkType::Make,
                QualityStatus::Denied,
                QualityStatus::Fulfilled,
            ),
            Rule::BreakPendingDeny => override_conflict(
                model,
                store,
                id,
                LinkType::Break,
                QualityStatus::Fulfilled,
                QualityStatus::Denied,
            ),
        };

        if fired {
            tracing::debug!(rule = self.name(), element = id, "rule fired");
        }
        fired
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Try every rule on `id` in priority order, stopping at the first that fires.
pub fn try_any_rule(model: &GoalModel, store: &mut StatusStore, id: &str) -> Option<Rule> {
    Rule::PRIORITY
        .into_iter()
        .find(|rule| rule.try_fire(model, store, id))
}

/// P-MAKE / P-BREAK: move an undecided quality to `to` when any child over
/// `via` links is live.
fn decide(
    model: &GoalModel,
    store: &mut StatusStore,
    quality: &str,
    via: LinkType,
    to: QualityStatus,
) -> bool {
    let applies = store.quality(quality) == Some(QualityStatus::Unknown)
        && has_live_child(model, store, quality, via);
    if applies {
        store.set_quality(quality, to);
    }
    applies
}

/// BP-FULFILL / BP-DENY: flip a decided quality from `from` to `to` when a
/// child over `winning` links is live, then demote the live contributors on
/// the opposite side together with their whole refinement subtrees.
fn override_conflict(
    model: &GoalModel,
    store: &mut StatusStore,
    quality: &str,
    winning: LinkType,
    from: QualityStatus,
    to: QualityStatus,
) -> bool {
    if store.quality(quality) != Some(from) || !has_live_child(model, store, quality, winning) {
        return false;
    }
    store.set_quality(quality, to);

    let losing = match winning {
        LinkType::Make => LinkType::Break,
        _ => LinkType::Make,
    };
    let losers: Vec<ElementId> = model
        .links_from(quality, losing)
        .into_iter()
        .filter(|c| store.is_live(c))
        .cloned()
        .collect();

    for loser in &losers {
        for demoted in contributor_set(model, store, loser) {
            store.set_element(&demoted, ElementStatus::SatisfiedPending);
            tracing::debug!(
                quality,
                contributor = loser.as_str(),
                element = demoted.as_str(),
                "demoted to pending"
            );
        }
    }
    true
}

fn has_live_child(model: &GoalModel, store: &StatusStore, parent: &str, via: LinkType) -> bool {
    model
        .links_from(parent, via)
        .into_iter()
        .any(|c| store.is_live(c))
}

/// The live part of `{contributor} ∪ descendants(contributor)`.
///
/// Descendants follow every outgoing link regardless of type or status; the
/// traversal marks visited elements so cyclic refinements terminate.
pub fn contributor_set(model: &GoalModel, store: &StatusStore, contributor: &str) -> Vec<ElementId> {
    model
        .descendants_inclusive(contributor)
        .into_iter()
        .filter(|id| store.is_live(id))
        .cloned()
        .collect()
}

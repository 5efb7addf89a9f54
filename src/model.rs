//! The static goal-model graph.
//!
//! Uses `petgraph` for the link structure (edges point from parent to child)
//! and a `HashMap` for O(1) lookups by element id. A [`GoalModel`] is built
//! once through the construction API and is read-only afterwards, so it can be
//! shared across any number of independent evaluations behind an `Arc`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};

use crate::element::{ElementGroup, ElementId, ElementKind, Link, LinkType};
use crate::error::{ModelError, ModelResult};

/// Node payload: the element's identity and kind.
#[derive(Debug, Clone)]
struct ElementNode {
    id: ElementId,
    kind: ElementKind,
}

/// Goal model: tasks, goals, qualities, typed links, and the event mapping.
#[derive(Debug, Clone, Default)]
pub struct GoalModel {
    /// Directed graph: parent → child, edges carry the link type.
    graph: DiGraph<ElementNode, LinkType>,
    /// ElementId → NodeIndex mapping for O(1) node lookups.
    node_index: HashMap<ElementId, NodeIndex>,
    /// Event id → alternative groups, in mapping order.
    event_mapping: HashMap<String, Vec<ElementGroup>>,
}

impl GoalModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task(&mut self, id: impl Into<ElementId>) -> ModelResult<()> {
        self.add_element(id.into(), ElementKind::Task)
    }

    pub fn add_goal(&mut self, id: impl Into<ElementId>) -> ModelResult<()> {
        self.add_element(id.into(), ElementKind::Goal)
    }

    pub fn add_quality(&mut self, id: impl Into<ElementId>) -> ModelResult<()> {
        self.add_element(id.into(), ElementKind::Quality)
    }

    /// Add an element of the given kind. Identifiers are unique across kinds.
    pub fn add_element(&mut self, id: ElementId, kind: ElementKind) -> ModelResult<()> {
        if let Some(existing) = self.kind(&id) {
            return Err(ModelError::DuplicateElement { id, existing });
        }
        let idx = self.graph.add_node(ElementNode {
            id: id.clone(),
            kind,
        });
        self.node_index.insert(id, idx);
        Ok(())
    }

    /// Add a directed link `parent --link_type--> child`.
    ///
    /// AND/OR links connect a task/goal parent to a task/goal child.
    /// MAKE/BREAK links connect a quality parent to a task/goal child.
    pub fn add_link(
        &mut self,
        parent: impl Into<ElementId>,
        child: impl Into<ElementId>,
        link_type: LinkType,
    ) -> ModelResult<()> {
        let parent = parent.into();
        let child = child.into();
        let parent_idx = self.require(&parent)?;
        let child_idx = self.require(&child)?;
        let parent_kind = self.graph[parent_idx].kind;
        let child_kind = self.graph[child_idx].kind;

        if child_kind == ElementKind::Quality {
            return Err(ModelError::QualityChild { parent, child });
        }
        if parent_kind == ElementKind::Quality && link_type.is_refinement() {
            return Err(ModelError::QualityRefinement {
                parent,
                child,
                link_type,
            });
        }
        if parent_kind != ElementKind::Quality && link_type.is_contribution() {
            return Err(ModelError::ContributionParent { parent, link_type });
        }

        self.graph.add_edge(parent_idx, child_idx, link_type);
        Ok(())
    }

    /// Map an external event to a group of elements fired together.
    ///
    /// Repeated calls for the same event append alternative groups, which are
    /// fired in mapping order.
    pub fn add_event_mapping(
        &mut self,
        event: impl Into<String>,
        group: impl Into<ElementGroup>,
    ) -> ModelResult<()> {
        let event = event.into();
        let group = group.into();
        if group.is_empty() {
            return Err(ModelError::EmptyGroup { event });
        }
        if let Some(missing) = group.members().iter().find(|id| !self.contains(id)) {
            return Err(ModelError::UnknownMappedElement {
                event,
                id: missing.clone(),
            });
        }
        self.event_mapping.entry(event).or_default().push(group);
        Ok(())
    }

    fn require(&self, id: &ElementId) -> ModelResult<NodeIndex> {
        self.node_index
            .get(id)
            .copied()
            .ok_or_else(|| ModelError::UnknownElement { id: id.clone() })
    }

    // -----------------------------------------------------------------------
    // Read-only queries
    // -----------------------------------------------------------------------

    /// Whether an element with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Kind of the element, if it exists.
    pub fn kind(&self, id: &str) -> Option<ElementKind> {
        self.node_index.get(id).map(|&idx| self.graph[idx].kind)
    }

    /// Elements that have a link whose child is `id`, in link declaration
    /// order and without duplicates.
    pub fn parents(&self, id: &str) -> Vec<&ElementId> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges_directed(idx, Direction::Incoming).collect();
        edges.sort_by_key(|e| e.id());

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .filter(|e| seen.insert(e.source()))
            .map(|e| &self.graph[e.source()].id)
            .collect()
    }

    /// True iff no link has `id` as parent.
    pub fn is_leaf(&self, id: &str) -> bool {
        self.node_index.get(id).is_none_or(|&idx| {
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .next()
                .is_none()
        })
    }

    /// Children of `parent` over links of the given type, in declaration order.
    pub fn links_from(&self, parent: &str, link_type: LinkType) -> Vec<&ElementId> {
        let Some(&idx) = self.node_index.get(parent) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|e| *e.weight() == link_type)
            .collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| &self.graph[e.target()].id)
            .collect()
    }

    /// `id` together with everything reachable from it over outgoing links of
    /// any type. Each element appears once even when the links form cycles.
    pub fn descendants_inclusive(&self, id: &str) -> Vec<&ElementId> {
        let Some(&start) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut dfs = Dfs::new(&self.graph, start);
        let mut reached = Vec::new();
        while let Some(idx) = dfs.next(&self.graph) {
            reached.push(&self.graph[idx].id);
        }
        reached
    }

    /// Groups mapped to an event; empty for unmapped events.
    pub fn groups_for(&self, event: &str) -> &[ElementGroup] {
        self.event_mapping
            .get(event)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the event has at least one mapped group.
    pub fn is_mapped(&self, event: &str) -> bool {
        self.event_mapping.contains_key(event)
    }

    /// Element ids of the given kind, in declaration order.
    pub fn elements_of(&self, kind: ElementKind) -> impl Iterator<Item = &ElementId> + '_ {
        self.graph
            .node_weights()
            .filter(move |n| n.kind == kind)
            .map(|n| &n.id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.elements_of(ElementKind::Task)
    }

    pub fn goals(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.elements_of(ElementKind::Goal)
    }

    pub fn qualities(&self) -> impl Iterator<Item = &ElementId> + '_ {
        self.elements_of(ElementKind::Quality)
    }

    /// All links in declaration order.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        self.graph.edge_references().map(|e| Link {
            parent: self.graph[e.source()].id.clone(),
            child: self.graph[e.target()].id.clone(),
            link_type: *e.weight(),
        })
    }

    /// Summary counts for display.
    pub fn info(&self) -> ModelInfo {
        let count_links = |t: LinkType| self.graph.edge_weights().filter(|w| **w == t).count();
        ModelInfo {
            tasks: self.tasks().count(),
            goals: self.goals().count(),
            qualities: self.qualities().count(),
            and_links: count_links(LinkType::And),
            or_links: count_links(LinkType::Or),
            make_links: count_links(LinkType::Make),
            break_links: count_links(LinkType::Break),
            leaves: self
                .graph
                .node_weights()
                .filter(|n| n.kind.is_refinable() && self.is_leaf(n.id.as_str()))
                .count(),
            mapped_events: self.event_mapping.len(),
        }
    }
}

/// Summary information about a goal model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub tasks: usize,
    pub goals: usize,
    pub qualities: usize,
    pub and_links: usize,
    pub or_links: usize,
    pub make_links: usize,
    pub break_links: usize,
    pub leaves: usize,
    pub mapped_events: usize,
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "goal model info")?;
        writeln!(f, "  tasks:        {}", self.tasks)?;
        writeln!(f, "  goals:        {}", self.goals)?;
        writeln!(f, "  qualities:    {}", self.qualities)?;
        writeln!(
            f,
            "  links:        {} AND, {} OR, {} MAKE, {} BREAK",
            self.and_links, self.or_links, self.make_links, self.break_links
        )?;
        writeln!(f, "  leaves:       {}", self.leaves)?;
        writeln!(f, "  events:       {}", self.mapped_events)?;
        Ok(())
    }
}

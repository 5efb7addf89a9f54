//! Declarative goal-model descriptions.
//!
//! A description is a TOML or JSON document listing the elements, links, and
//! event mapping of a model. Building it replays the construction API in
//! order (elements, links, then mappings), so a malformed description fails
//! with the same [`ModelError`](crate::error::ModelError) as hand-built code.
//!
//! ```toml
//! tasks = ["T1", "T6", "T7", "T8"]
//! goals = ["G3"]
//!
//! [[links]]
//! parent = "G3"
//! child = "T8"
//! type = "and"
//!
//! [events]
//! e8 = "T8"
//! e9 = [["T6", "T7"]]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::{ElementGroup, ElementId, Link};
use crate::error::{DescriptionError, ModelResult};
use crate::model::GoalModel;

/// Serializable description of a goal model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescription {
    #[serde(default)]
    pub tasks: Vec<ElementId>,
    #[serde(default)]
    pub goals: Vec<ElementId>,
    #[serde(default)]
    pub qualities: Vec<ElementId>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub events: BTreeMap<String, EventTarget>,
}

/// What an event maps to.
///
/// A bare id is one single-element group. A list holds alternative groups:
/// each entry is either an id (a group of one) or a list of ids fired
/// together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTarget {
    Element(ElementId),
    Groups(Vec<GroupSpec>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSpec {
    Element(ElementId),
    Group(Vec<ElementId>),
}

impl EventTarget {
    /// The groups this target expands to, in order.
    pub fn groups(&self) -> Vec<ElementGroup> {
        match self {
            EventTarget::Element(id) => vec![ElementGroup::from(id.clone())],
            EventTarget::Groups(specs) => specs
                .iter()
                .map(|spec| match spec {
                    GroupSpec::Element(id) => ElementGroup::from(id.clone()),
                    GroupSpec::Group(ids) => ElementGroup::from(ids.clone()),
                })
                .collect(),
        }
    }
}

/// On-disk encoding of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionFormat {
    Toml,
    Json,
}

impl DescriptionFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl ModelDescription {
    /// Parse a description. `origin` names the source in error messages.
    pub fn parse(
        content: &str,
        format: DescriptionFormat,
        origin: &str,
    ) -> Result<Self, DescriptionError> {
        let parsed = match format {
            DescriptionFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            DescriptionFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| DescriptionError::Parse {
            path: origin.to_string(),
            message,
        })
    }

    /// Read and parse a `.toml` or `.json` description file.
    pub fn load(path: &Path) -> Result<Self, DescriptionError> {
        let format =
            DescriptionFormat::from_path(path).ok_or_else(|| DescriptionError::UnsupportedFormat {
                path: path.display().to_string(),
            })?;
        let content = std::fs::read_to_string(path).map_err(|e| DescriptionError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, format, &path.display().to_string())
    }

    /// Build the in-memory model.
    pub fn build(&self) -> ModelResult<GoalModel> {
        let mut model = GoalModel::new();
        for id in &self.tasks {
            model.add_task(id)?;
        }
        for id in &self.goals {
            model.add_goal(id)?;
        }
        for id in &self.qualities {
            model.add_quality(id)?;
        }
        for link in &self.links {
            model.add_link(&link.parent, &link.child, link.link_type)?;
        }
        for (event, target) in &self.events {
            for group in target.groups() {
                model.add_event_mapping(event.as_str(), group)?;
            }
        }

        let info = model.info();
        tracing::info!(
            tasks = info.tasks,
            goals = info.goals,
            qualities = info.qualities,
            events = info.mapped_events,
            "goal model built"
        );
        Ok(model)
    }
}

/// Load a description file and build the model it describes.
pub fn load_model(path: &Path) -> Result<GoalModel, DescriptionError> {
    Ok(ModelDescription::load(path)?.build()?)
}

use std::collections::BTreeMap;

use foundation::camera::CameraPose;
use foundation::ids::SectionId;
use layers::layer::Location;
use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// Scroll direction, expressed in document order: `Forward` is scrolling
/// down towards later sections.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Direction implied by a scroll delta; a zero delta keeps `previous`.
    pub fn from_delta(delta: f64, previous: Direction) -> Self {
        if delta > 0.0 {
            Direction::Forward
        } else if delta < 0.0 {
            Direction::Backward
        } else {
            previous
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "down",
            Direction::Backward => "up",
        }
    }
}

/// One narrative step and the map state it asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub pose: CameraPose,
    /// Location whose layers (and legend panel) the step shows. Steps without
    /// one are intro or interstitial text and show no overlay at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Which legend panels an exit rule hides.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelScope {
    All,
    Only(Location),
}

impl PanelScope {
    pub fn includes(self, panel: Location) -> bool {
        match self {
            PanelScope::All => true,
            PanelScope::Only(l) => l == panel,
        }
    }
}

/// Leaving `from` towards its neighbour `to` clears the overlay.
///
/// Only the listed pairs clear anything; other exits leave the map as the
/// last entered section set it until the next enter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRule {
    pub from: SectionId,
    pub to: SectionId,
    pub panels: PanelScope,
}

/// Sections in document order, with id lookup and the exit rule table.
#[derive(Debug, Clone)]
pub struct SectionTable {
    sections: Vec<Section>,
    index: BTreeMap<SectionId, usize>,
    exit_rules: Vec<ExitRule>,
}

impl SectionTable {
    pub fn new(sections: Vec<Section>, exit_rules: Vec<ExitRule>) -> Result<Self, StoryError> {
        if sections.is_empty() {
            return Err(StoryError::EmptyStory);
        }
        let mut index = BTreeMap::new();
        for (i, s) in sections.iter().enumerate() {
            if !s.pose.is_valid() {
                return Err(StoryError::InvalidPose(s.id.clone()));
            }
            if index.insert(s.id.clone(), i).is_some() {
                return Err(StoryError::DuplicateSection(s.id.clone()));
            }
        }
        for rule in &exit_rules {
            for id in [&rule.from, &rule.to] {
                if !index.contains_key(id) {
                    return Err(StoryError::UnknownRuleSection(id.clone()));
                }
            }
        }
        Ok(Self {
            sections,
            index,
            exit_rules,
        })
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.index.get(id).map(|&i| &self.sections[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn first(&self) -> Option<&Section> {
        self.sections.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Next section when moving forward, previous when moving backward.
    pub fn adjacent(&self, id: &str, direction: Direction) -> Option<&Section> {
        let i = self.position(id)?;
        match direction {
            Direction::Forward => self.sections.get(i + 1),
            Direction::Backward => i.checked_sub(1).and_then(|j| self.sections.get(j)),
        }
    }

    pub fn exit_rule(&self, from: &str, to: &str) -> Option<&ExitRule> {
        self.exit_rules
            .iter()
            .find(|r| r.from == from && r.to == to)
    }

    pub fn exit_rules(&self) -> &[ExitRule] {
        &self.exit_rules
    }
}

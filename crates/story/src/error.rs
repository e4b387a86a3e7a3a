use std::fmt;

use foundation::ids::SectionId;
use layers::layer::Location;
use layers::registry::RegistryError;

#[derive(Debug, Clone, PartialEq)]
pub enum StoryError {
    Parse(String),
    Registry(RegistryError),
    EmptyStory,
    DuplicateSection(SectionId),
    InvalidPose(SectionId),
    UnknownRuleSection(SectionId),
    DuplicatePanel(Location),
    MissingPanel(Location),
}

impl fmt::Display for StoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryError::Parse(msg) => write!(f, "story config parse error: {msg}"),
            StoryError::Registry(err) => write!(f, "story config layers: {err}"),
            StoryError::EmptyStory => write!(f, "story has no sections"),
            StoryError::DuplicateSection(id) => write!(f, "section declared twice: {id}"),
            StoryError::InvalidPose(id) => write!(f, "section {id} has an out-of-range camera pose"),
            StoryError::UnknownRuleSection(id) => {
                write!(f, "exit rule references unknown section {id}")
            }
            StoryError::DuplicatePanel(l) => write!(f, "legend panel declared twice for {l}"),
            StoryError::MissingPanel(l) => write!(f, "no legend panel for {l}"),
        }
    }
}

impl std::error::Error for StoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoryError::Registry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RegistryError> for StoryError {
    fn from(err: RegistryError) -> Self {
        StoryError::Registry(err)
    }
}

impl From<serde_json::Error> for StoryError {
    fn from(err: serde_json::Error) -> Self {
        StoryError::Parse(err.to_string())
    }
}

use std::fmt;

use foundation::ids::LayerId;
use serde::{Deserialize, Serialize};

use crate::symbology::LayerStyle;

/// One of the three places the story visits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Hiroshima,
    Nagasaki,
    Rennes,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Hiroshima, Location::Nagasaki, Location::Rennes];

    pub fn as_str(self) -> &'static str {
        match self {
            Location::Hiroshima => "hiroshima",
            Location::Nagasaki => "nagasaki",
            Location::Rennes => "rennes",
        }
    }

    pub fn group(self) -> LayerGroup {
        LayerGroup::Location(self)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layers are grouped per location, plus the shared points-of-interest group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LayerGroup {
    Location(Location),
    Poi,
}

impl LayerGroup {
    pub fn location(self) -> Option<Location> {
        match self {
            LayerGroup::Location(l) => Some(l),
            LayerGroup::Poi => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerGroup::Location(l) => l.as_str(),
            LayerGroup::Poi => "poi",
        }
    }
}

impl fmt::Display for LayerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LayerGroup> for String {
    fn from(g: LayerGroup) -> Self {
        g.as_str().to_string()
    }
}

impl TryFrom<String> for LayerGroup {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "hiroshima" => Ok(LayerGroup::Location(Location::Hiroshima)),
            "nagasaki" => Ok(LayerGroup::Location(Location::Nagasaki)),
            "rennes" => Ok(LayerGroup::Location(Location::Rennes)),
            "poi" => Ok(LayerGroup::Poi),
            other => Err(format!("unknown layer group: {other}")),
        }
    }
}

/// Layout visibility as the map style spells it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    None,
}

impl Visibility {
    pub fn from_visible(visible: bool) -> Self {
        if visible {
            Visibility::Visible
        } else {
            Visibility::None
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visible" => Some(Visibility::Visible),
            "none" => Some(Visibility::None),
            _ => None,
        }
    }
}

/// Static description of one overlay layer: where its data lives and how it
/// is drawn. Several layers may share one `source` (POI points and labels).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDef {
    pub id: LayerId,
    pub group: LayerGroup,
    /// Id of the GeoJSON source the layer draws from.
    pub source: String,
    /// Asset URL of that source. Layers sharing a source repeat the URL.
    pub data_url: String,
    pub style: LayerStyle,
}

#[cfg(test)]
mod tests {
    use super::{LayerGroup, Location, Visibility};

    #[test]
    fn group_round_trips_through_text() {
        for g in [
            LayerGroup::Location(Location::Hiroshima),
            LayerGroup::Location(Location::Nagasaki),
            LayerGroup::Location(Location::Rennes),
            LayerGroup::Poi,
        ] {
            assert_eq!(LayerGroup::try_from(String::from(g)), Ok(g));
        }
        assert!(LayerGroup::try_from("tokyo".to_string()).is_err());
    }

    #[test]
    fn poi_group_has_no_location() {
        assert_eq!(LayerGroup::Poi.location(), None);
        assert_eq!(Location::Rennes.group().location(), Some(Location::Rennes));
    }

    #[test]
    fn visibility_matches_layout_property_values() {
        assert_eq!(Visibility::from_visible(true).as_str(), "visible");
        assert_eq!(Visibility::from_visible(false).as_str(), "none");
        assert_eq!(Visibility::parse("none"), Some(Visibility::None));
        assert_eq!(Visibility::parse("hidden"), None);
    }
}

use std::collections::BTreeMap;
use std::fmt;

use foundation::ids::{LayerId, ToggleId};
use serde::{Deserialize, Serialize};

use crate::layer::{LayerDef, LayerGroup, Location};

/// A legend button and the layers it switches as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleDef {
    pub id: ToggleId,
    pub layers: Vec<LayerId>,
    /// Legend panel the button sits on; `None` for buttons outside any panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateLayer(LayerId),
    DuplicateToggle(ToggleId),
    EmptyToggle(ToggleId),
    UnknownLayer { toggle: ToggleId, layer: LayerId },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateLayer(id) => write!(f, "layer declared twice: {id}"),
            RegistryError::DuplicateToggle(id) => write!(f, "toggle declared twice: {id}"),
            RegistryError::EmptyToggle(id) => write!(f, "toggle controls no layer: {id}"),
            RegistryError::UnknownLayer { toggle, layer } => {
                write!(f, "toggle {toggle} controls unknown layer {layer}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Static layer and toggle tables.
///
/// Built once at startup and never mutated. Lookups for identifiers the
/// registry does not know return `None` or an empty slice so callers can
/// treat them as no-ops; the renderer may simply not have that layer yet.
///
/// Iteration follows declaration order.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: Vec<LayerDef>,
    layer_index: BTreeMap<LayerId, usize>,
    toggles: Vec<ToggleDef>,
    toggle_index: BTreeMap<ToggleId, usize>,
}

impl LayerRegistry {
    pub fn new(layers: Vec<LayerDef>, toggles: Vec<ToggleDef>) -> Result<Self, RegistryError> {
        let mut layer_index = BTreeMap::new();
        for (i, def) in layers.iter().enumerate() {
            if layer_index.insert(def.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateLayer(def.id.clone()));
            }
        }

        let mut toggle_index = BTreeMap::new();
        for (i, def) in toggles.iter().enumerate() {
            if toggle_index.insert(def.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateToggle(def.id.clone()));
            }
            if def.layers.is_empty() {
                return Err(RegistryError::EmptyToggle(def.id.clone()));
            }
            if let Some(layer) = def.layers.iter().find(|l| !layer_index.contains_key(*l)) {
                return Err(RegistryError::UnknownLayer {
                    toggle: def.id.clone(),
                    layer: layer.clone(),
                });
            }
        }

        Ok(Self {
            layers,
            layer_index,
            toggles,
            toggle_index,
        })
    }

    pub fn layer(&self, id: &str) -> Option<&LayerDef> {
        self.layer_index.get(id).map(|&i| &self.layers[i])
    }

    pub fn layer_group(&self, id: &str) -> Option<LayerGroup> {
        self.layer(id).map(|def| def.group)
    }

    pub fn layers(&self) -> &[LayerDef] {
        &self.layers
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &LayerId> {
        self.layers.iter().map(|def| &def.id)
    }

    pub fn layers_for(&self, group: LayerGroup) -> impl Iterator<Item = &LayerId> {
        self.layers
            .iter()
            .filter(move |def| def.group == group)
            .map(|def| &def.id)
    }

    pub fn toggle(&self, id: &str) -> Option<&ToggleDef> {
        self.toggle_index.get(id).map(|&i| &self.toggles[i])
    }

    pub fn toggles(&self) -> &[ToggleDef] {
        &self.toggles
    }

    /// Layers a toggle controls; empty for an unknown toggle.
    pub fn toggle_layers(&self, id: &str) -> &[LayerId] {
        self.toggle(id).map(|def| def.layers.as_slice()).unwrap_or(&[])
    }

    pub fn toggles_on_panel(&self, panel: Location) -> impl Iterator<Item = &ToggleDef> {
        self.toggles
            .iter()
            .filter(move |def| def.panel == Some(panel))
    }

    /// Toggles controlling at least one of `layers`.
    pub fn toggles_sharing<'a>(
        &'a self,
        layers: &'a [LayerId],
    ) -> impl Iterator<Item = &'a ToggleDef> + 'a {
        self.toggles
            .iter()
            .filter(move |def| def.layers.iter().any(|l| layers.contains(l)))
    }
}

#[cfg(test)]
mod tests {
    use foundation::ids::{LayerId, ToggleId};
    use pretty_assertions::assert_eq;

    use super::{LayerRegistry, RegistryError, ToggleDef};
    use crate::layer::{LayerDef, LayerGroup, Location};
    use crate::symbology::{Color, LayerStyle};

    fn layer(id: &str, group: LayerGroup) -> LayerDef {
        LayerDef {
            id: LayerId::new(id),
            group,
            source: id.to_string(),
            data_url: format!("./assets/{id}.geojson"),
            style: LayerStyle::area(Color::BLACK),
        }
    }

    fn toggle(id: &str, layers: &[&str], panel: Option<Location>) -> ToggleDef {
        ToggleDef {
            id: ToggleId::new(id),
            layers: layers.iter().map(|l| LayerId::new(*l)).collect(),
            panel,
        }
    }

    fn sample() -> LayerRegistry {
        LayerRegistry::new(
            vec![
                layer("h_a", Location::Hiroshima.group()),
                layer("h_b", Location::Hiroshima.group()),
                layer("n_a", Location::Nagasaki.group()),
                layer("poi_points", LayerGroup::Poi),
                layer("poi_labels", LayerGroup::Poi),
            ],
            vec![
                toggle("t-h-a", &["h_a"], Some(Location::Hiroshima)),
                toggle("t-poi-h", &["poi_points", "poi_labels"], Some(Location::Hiroshima)),
                toggle("t-n-a", &["n_a"], Some(Location::Nagasaki)),
                toggle("t-poi", &["poi_points", "poi_labels"], None),
            ],
        )
        .unwrap()
    }

    #[test]
    fn groups_and_lookups() {
        let r = sample();
        let hiro: Vec<_> = r.layers_for(Location::Hiroshima.group()).cloned().collect();
        assert_eq!(hiro, vec![LayerId::new("h_a"), LayerId::new("h_b")]);
        assert_eq!(r.layer_group("poi_labels"), Some(LayerGroup::Poi));
        assert_eq!(r.layer_group("missing"), None);
        assert!(r.toggle_layers("missing").is_empty());
        assert_eq!(r.toggle_layers("t-n-a"), &[LayerId::new("n_a")]);
    }

    #[test]
    fn panel_and_shared_toggle_queries() {
        let r = sample();
        let on_hiro: Vec<_> = r
            .toggles_on_panel(Location::Hiroshima)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(on_hiro, vec!["t-h-a", "t-poi-h"]);

        let changed = [LayerId::new("poi_labels")];
        let sharing: Vec<_> = r.toggles_sharing(&changed).map(|t| t.id.as_str()).collect();
        assert_eq!(sharing, vec!["t-poi-h", "t-poi"]);
    }

    #[test]
    fn rejects_dangling_and_duplicate_entries() {
        let err = LayerRegistry::new(
            vec![layer("a", LayerGroup::Poi)],
            vec![toggle("t", &["b"], None)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownLayer {
                toggle: ToggleId::new("t"),
                layer: LayerId::new("b"),
            }
        );

        let err = LayerRegistry::new(
            vec![layer("a", LayerGroup::Poi), layer("a", LayerGroup::Poi)],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateLayer(LayerId::new("a")));

        let err =
            LayerRegistry::new(vec![layer("a", LayerGroup::Poi)], vec![toggle("t", &[], None)])
                .unwrap_err();
        assert_eq!(err.to_string(), "toggle controls no layer: t");
    }
}

//! Story configuration: every static table the page runs on.
//!
//! `StoryConfig::builtin()` is the story as published. A JSON document with
//! the same shape can replace it (`from_json_str`), which is how the CLI
//! validates edited tables before they ship.

use std::collections::BTreeSet;

use foundation::camera::CameraPose;
use foundation::ids::{LayerId, SectionId, ToggleId};
use foundation::math::LonLat;
use foundation::time::Millis;
use layers::layer::{LayerDef, LayerGroup, Location};
use layers::registry::{LayerRegistry, ToggleDef};
use layers::symbology::{Color, LayerStyle};
use serde::{Deserialize, Serialize};

use crate::error::StoryError;
use crate::infographic::{Figure, InfographicTab};
use crate::section::{ExitRule, PanelScope, Section, SectionTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub style_url: String,
    pub initial: CameraPose,
    pub scale_max_width_px: u32,
}

/// Legend panel element for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelDef {
    pub location: Location,
    pub element_id: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Widths at or below this are the narrow (touch) layout.
    pub breakpoint_px: f64,
    /// Width change that triggers re-measuring step positions.
    pub remeasure_threshold_px: f64,
    /// Progress bar ignores scroll moves smaller than this.
    pub progress_min_delta_px: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            breakpoint_px: 768.0,
            remeasure_threshold_px: 50.0,
            progress_min_delta_px: 5.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Upper bound before the loading overlay is removed regardless of the map.
    pub loader_timeout: Millis,
    /// Delay after map load before the section under the viewport is entered.
    pub initial_section_delay: Millis,
    /// Delay after scroll wiring before the first step is entered.
    pub first_step_delay: Millis,
    pub resize_debounce: Millis,
    pub progress_min_interval: Millis,
    pub bibliography_close: Millis,
    pub timeline_cascade: Millis,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            loader_timeout: Millis(3000),
            initial_section_delay: Millis(500),
            first_step_delay: Millis(300),
            resize_debounce: Millis(150),
            progress_min_interval: Millis(16),
            bibliography_close: Millis(500),
            timeline_cascade: Millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryConfig {
    pub map: MapConfig,
    pub layers: Vec<LayerDef>,
    pub toggles: Vec<ToggleDef>,
    pub panels: Vec<PanelDef>,
    pub sections: Vec<Section>,
    pub exit_rules: Vec<ExitRule>,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub infographic: Vec<InfographicTab>,
    /// Images fetched ahead of time so later steps render without a gap.
    #[serde(default)]
    pub preload: Vec<String>,
}

impl StoryConfig {
    pub fn from_json_str(s: &str) -> Result<Self, StoryError> {
        let config: StoryConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, StoryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks cross-table references by building the runtime tables.
    pub fn validate(&self) -> Result<(), StoryError> {
        self.registry()?;
        self.section_table()?;
        let mut seen = BTreeSet::new();
        for p in &self.panels {
            if !seen.insert(p.location) {
                return Err(StoryError::DuplicatePanel(p.location));
            }
        }
        for s in &self.sections {
            if let Some(l) = s.location {
                if !seen.contains(&l) {
                    return Err(StoryError::MissingPanel(l));
                }
            }
        }
        Ok(())
    }

    pub fn registry(&self) -> Result<LayerRegistry, StoryError> {
        Ok(LayerRegistry::new(self.layers.clone(), self.toggles.clone())?)
    }

    pub fn section_table(&self) -> Result<SectionTable, StoryError> {
        SectionTable::new(self.sections.clone(), self.exit_rules.clone())
    }

    pub fn panel_element(&self, location: Location) -> Option<&str> {
        self.panels
            .iter()
            .find(|p| p.location == location)
            .map(|p| p.element_id.as_str())
    }

    /// The published story: Hiroshima, Nagasaki and the Rennes simulation.
    pub fn builtin() -> Self {
        let destroyed = Color::rgb(0xaf, 0x0d, 0x1d);
        let damaged = Color::rgb(0xea, 0x50, 0x4c);
        let spared = Color::rgb(0xf3, 0x9c, 0x9e);

        let area = |id: &str, location: Location, url: &str, color: Color| LayerDef {
            id: LayerId::new(format!("{id}_layer")),
            group: location.group(),
            source: id.to_string(),
            data_url: url.to_string(),
            style: LayerStyle::area(color),
        };
        let poi_url = "./assets/POI/POI.geojson";

        let layers = vec![
            area("hiroshima_detruit", Location::Hiroshima, "./assets/hiroshima/h_total_detruit.geojson", destroyed),
            area("hiroshima_moinsdetruit", Location::Hiroshima, "./assets/hiroshima/h_partiel_detruit.geojson", damaged),
            area("hiroshima_sauve", Location::Hiroshima, "./assets/hiroshima/h_sauve.geojson", spared),
            area("nagasaki_detruit", Location::Nagasaki, "./assets/nagasaki/n_total_detruit.geojson", destroyed),
            area("nagasaki_feu", Location::Nagasaki, "./assets/nagasaki/n_partiel_detruit.geojson", damaged),
            area("nagasaki_sauve", Location::Nagasaki, "./assets/nagasaki/n_sauve.geojson", spared),
            area("rennes_detruit", Location::Rennes, "./assets/rennes/tampon_1km6_4326.geojson", destroyed),
            area("rennes_partiel", Location::Rennes, "./assets/rennes/tampon_3km_4326.geojson", damaged),
            LayerDef {
                id: LayerId::new("poi_points"),
                group: LayerGroup::Poi,
                source: "poi_source".to_string(),
                data_url: poi_url.to_string(),
                style: LayerStyle::Circle {
                    radius_px: 6.0,
                    color: destroyed,
                    opacity: 0.8,
                    stroke_width_px: 2.0,
                    stroke_color: Color::WHITE,
                },
            },
            LayerDef {
                id: LayerId::new("poi_labels"),
                group: LayerGroup::Poi,
                source: "poi_source".to_string(),
                data_url: poi_url.to_string(),
                style: LayerStyle::Label {
                    field: "nom".to_string(),
                    font: "Open Sans Bold".to_string(),
                    color: Color::WHITE,
                    halo_color: Color::BLACK,
                    halo_width_px: 1.0,
                    size_steps: vec![(0.0, 0.0), (10.0, 8.0), (12.0, 12.0), (14.0, 13.0)],
                },
            },
        ];

        let toggle = |id: &str, layers: &[&str], panel: Option<Location>| ToggleDef {
            id: ToggleId::new(id),
            layers: layers.iter().map(|l| LayerId::new(*l)).collect(),
            panel,
        };
        let poi = ["poi_points", "poi_labels"];
        let hiro = Some(Location::Hiroshima);
        let naga = Some(Location::Nagasaki);
        let rennes = Some(Location::Rennes);
        let toggles = vec![
            toggle("toggle-destroyed-fixed", &["hiroshima_detruit_layer"], hiro),
            toggle("toggle-lessdestroyed-fixed", &["hiroshima_moinsdetruit_layer"], hiro),
            toggle("toggle-sauve-fixed", &["hiroshima_sauve_layer"], hiro),
            toggle("toggle-poi-hiro-fixed", &poi, hiro),
            toggle("toggle-naga-detruit-fixed", &["nagasaki_detruit_layer"], naga),
            toggle("toggle-naga-feu-fixed", &["nagasaki_feu_layer"], naga),
            toggle("toggle-naga-sauve-fixed", &["nagasaki_sauve_layer"], naga),
            toggle("toggle-poi-naga-fixed", &poi, naga),
            toggle("toggle-rennes-detruit-fixed", &["rennes_detruit_layer"], rennes),
            toggle("toggle-rennes-partiel-fixed", &["rennes_partiel_layer"], rennes),
            toggle("toggle-poi-rennes-fixed", &poi, rennes),
            toggle("toggle-poi-fixed", &poi, None),
        ];

        let panels = Location::ALL
            .iter()
            .map(|&location| PanelDef {
                location,
                element_id: format!("legend-{location}"),
            })
            .collect();

        let quick = Millis(1500);
        let slow = Millis(8000);
        let section = |id: &str, lon: f64, lat: f64, zoom: f64, duration: Millis| Section {
            id: SectionId::new(id),
            pose: CameraPose::new(LonLat::new(lon, lat), zoom, duration),
            location: None,
        };
        let sections = vec![
            section("intro", 132.49859, 34.38477, 12.5, quick),
            section("pacific-combined", 160.0, 0.0, 3.0, quick),
            section("timeline", 135.5, 35.0, 6.0, quick),
            section("lorem-section", 137.40184, 36.39750, 5.0, quick),
            Section {
                location: Some(Location::Hiroshima),
                pose: CameraPose::new(LonLat::new(132.50124, 34.39776), 11.4, slow)
                    .with_bearing(-8.0)
                    .with_pitch(18.0),
                ..section("hiroshima", 0.0, 0.0, 0.0, slow)
            },
            Section {
                location: Some(Location::Nagasaki),
                pose: CameraPose::new(LonLat::new(129.88424, 32.76064), 12.1, slow)
                    .with_bearing(-49.60)
                    .with_pitch(34.50),
                ..section("nagasaki", 0.0, 0.0, 0.0, slow)
            },
            section("infographie-hiroshima", 131.5, 33.5, 5.0, quick),
            section("post-infographie-section", 135.0, 36.0, 5.0, quick),
            Section {
                location: Some(Location::Rennes),
                ..section("rennes-impact", -1.64124, 48.11316, 11.8, slow)
            },
            Section {
                pose: CameraPose::new(LonLat::new(135.5, 35.0), 4.0, quick).with_pitch(45.0),
                ..section("conclusion", 0.0, 0.0, 0.0, quick)
            },
        ];

        let rule = |from: &str, to: &str, panels: PanelScope| ExitRule {
            from: SectionId::new(from),
            to: SectionId::new(to),
            panels,
        };
        let exit_rules = vec![
            rule("nagasaki", "infographie-hiroshima", PanelScope::All),
            rule("infographie-hiroshima", "post-infographie-section", PanelScope::All),
            rule("post-infographie-section", "rennes-impact", PanelScope::All),
            rule("rennes-impact", "conclusion", PanelScope::All),
            rule("rennes-impact", "post-infographie-section", PanelScope::Only(Location::Rennes)),
        ];

        let infographic = vec![
            InfographicTab {
                target: "tab-hiroshima".to_string(),
                figure: Figure::Bomb {
                    image: "./assets/infographies/littleboy_hiroshima.png".to_string(),
                    alt: "Little Boy - Bombe d'Hiroshima".to_string(),
                    name: "Little Boy".to_string(),
                },
            },
            InfographicTab {
                target: "tab-nagasaki".to_string(),
                figure: Figure::Bomb {
                    image: "./assets/infographies/fatman_nagasaki.png".to_string(),
                    alt: "Fat Man - Bombe de Nagasaki".to_string(),
                    name: "Fat Man".to_string(),
                },
            },
            InfographicTab {
                target: "tab-comparison".to_string(),
                figure: Figure::Comparison {
                    image: "./assets/infographies/deux_bombes.png".to_string(),
                    alt: "Comparaison des bombes".to_string(),
                },
            },
        ];

        let preload = [
            "./assets/infographies/littleboy_hiroshima.png",
            "./assets/infographies/fatman_nagasaki.png",
            "./assets/infographies/deux_bombes.png",
            "./assets/timeline/PEARLHARBOR.webp",
            "./assets/timeline/MIDWAY.webp",
            "./assets/timeline/IWO.webp",
            "./assets/timeline/OKINAWA.webp",
            "./assets/timeline/TRINIT.webp",
            "https://paradigm-from-asia-africa.com/media/images/top/top_img_genbaku.jpg",
            "./assets/carte_pacifique/pacific_ok.png",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        StoryConfig {
            map: MapConfig {
                style_url: "https://basemaps.cartocdn.com/gl/positron-nolabels-gl-style/style.json"
                    .to_string(),
                initial: CameraPose::new(LonLat::new(132.49859, 34.38477), 12.5, Millis::ZERO),
                scale_max_width_px: 100,
            },
            layers,
            toggles,
            panels,
            sections,
            exit_rules,
            layout: LayoutConfig::default(),
            timings: Timings::default(),
            infographic,
            preload,
        }
    }
}

#[cfg(test)]
mod tests {
    use layers::layer::{LayerGroup, Location};
    use pretty_assertions::assert_eq;

    use super::StoryConfig;
    use crate::error::StoryError;

    #[test]
    fn builtin_is_valid() {
        let config = StoryConfig::builtin();
        config.validate().unwrap();
        assert_eq!(config.sections.len(), 10);
        assert_eq!(config.exit_rules.len(), 5);
        assert_eq!(config.panel_element(Location::Nagasaki), Some("legend-nagasaki"));
    }

    #[test]
    fn builtin_groups_layers_per_location() {
        let registry = StoryConfig::builtin().registry().unwrap();
        let rennes: Vec<_> = registry
            .layers_for(Location::Rennes.group())
            .map(|id| id.as_str())
            .collect();
        assert_eq!(rennes, vec!["rennes_detruit_layer", "rennes_partiel_layer"]);
        let poi: Vec<_> = registry.layers_for(LayerGroup::Poi).map(|id| id.as_str()).collect();
        assert_eq!(poi, vec!["poi_points", "poi_labels"]);
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let config = StoryConfig::builtin();
        let json = config.to_json_pretty().unwrap();
        let back = StoryConfig::from_json_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn missing_panel_is_rejected() {
        let mut config = StoryConfig::builtin();
        config.panels.retain(|p| p.location != Location::Rennes);
        assert_eq!(config.validate(), Err(StoryError::MissingPanel(Location::Rennes)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = StoryConfig::from_json_str("{\"map\": 3}").unwrap_err();
        assert!(matches!(err, StoryError::Parse(_)), "{err}");
    }
}

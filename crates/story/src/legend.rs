//! Legend toggle buttons.
//!
//! Each button is `Active` or `Inactive` and owns one or more layers. The
//! controller keeps a mirror of the visibility the renderer last accepted for
//! every layer and derives button state from it, so a button is active exactly when
//! all of its layers are visible. Buttons sharing layers (the POI buttons on
//! each panel plus the global one) therefore always agree.

use std::collections::BTreeMap;

use foundation::ids::{LayerId, ToggleId};
use layers::layer::{Location, Visibility};
use layers::registry::LayerRegistry;
use layers::viewport::{BatchReport, MapViewport, apply_visibility_batch};
use runtime::metrics::{Metrics, names};
use tracing::{debug, warn};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ToggleState {
    Active,
    Inactive,
}

impl ToggleState {
    pub fn from_active(active: bool) -> Self {
        if active {
            ToggleState::Active
        } else {
            ToggleState::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == ToggleState::Active
    }

    pub fn flipped(self) -> Self {
        Self::from_active(!self.is_active())
    }

    /// Visibility the controlled layers take in this state.
    pub fn visibility(self) -> Visibility {
        Visibility::from_visible(self.is_active())
    }
}

/// The page elements the story drives besides the map: legend panels and the
/// look of each toggle button.
pub trait LegendSurface {
    fn show_panel(&mut self, panel: Location, visible: bool);

    fn set_toggle_active(&mut self, toggle: &ToggleId, active: bool);
}

impl<S: LegendSurface + ?Sized> LegendSurface for &mut S {
    fn show_panel(&mut self, panel: Location, visible: bool) {
        (**self).show_panel(panel, visible)
    }

    fn set_toggle_active(&mut self, toggle: &ToggleId, active: bool) {
        (**self).set_toggle_active(toggle, active)
    }
}

/// Mutable outputs one legend operation writes to.
pub struct Outputs<'a, V: ?Sized, S: ?Sized> {
    pub viewport: &'a mut V,
    pub surface: &'a mut S,
    pub metrics: &'a mut Metrics,
}

#[derive(Debug, Clone, Default)]
pub struct LegendController {
    states: BTreeMap<ToggleId, ToggleState>,
    applied: BTreeMap<LayerId, Visibility>,
}

impl LegendController {
    /// Every button starts active over layers that start visible, which is
    /// how the renderer adds them.
    pub fn new(registry: &LayerRegistry) -> Self {
        Self {
            states: registry
                .toggles()
                .iter()
                .map(|t| (t.id.clone(), ToggleState::Active))
                .collect(),
            applied: registry
                .layer_ids()
                .map(|id| (id.clone(), Visibility::Visible))
                .collect(),
        }
    }

    pub fn state(&self, toggle: &str) -> Option<ToggleState> {
        self.states.get(toggle).copied()
    }

    /// Visibility the renderer last accepted for `layer`.
    pub fn applied(&self, layer: &str) -> Option<Visibility> {
        self.applied.get(layer).copied()
    }

    /// User click: flip the button and drive its layers to match.
    pub fn click<V, S>(
        &mut self,
        registry: &LayerRegistry,
        out: &mut Outputs<'_, V, S>,
        toggle: &str,
    ) -> Option<ToggleState>
    where
        V: MapViewport + ?Sized,
        S: LegendSurface + ?Sized,
    {
        let Some(current) = self.state(toggle) else {
            warn!(toggle, "click on unknown legend toggle");
            return None;
        };
        let next = current.flipped();
        out.metrics.inc(names::TOGGLE_CLICK);
        debug!(toggle, active = next.is_active(), "legend toggle clicked");

        let layers = registry.toggle_layers(toggle).to_vec();
        let updates: Vec<_> = layers.iter().map(|id| (id.clone(), next.visibility())).collect();
        self.set_layers(registry, out, &updates);
        self.state(toggle)
    }

    /// Forces every button on `panel` back to active and shows its layers,
    /// discarding whatever the reader toggled there before.
    pub fn reset_all<V, S>(
        &mut self,
        registry: &LayerRegistry,
        out: &mut Outputs<'_, V, S>,
        panel: Location,
    ) where
        V: MapViewport + ?Sized,
        S: LegendSurface + ?Sized,
    {
        out.metrics.inc(names::LEGEND_RESET);
        let mut updates = Vec::new();
        for toggle in registry.toggles_on_panel(panel) {
            self.states.insert(toggle.id.clone(), ToggleState::Active);
            for id in &toggle.layers {
                if !updates.iter().any(|(l, _)| l == id) {
                    updates.push((id.clone(), Visibility::Visible));
                }
            }
        }
        self.set_layers(registry, out, &updates);
    }

    pub fn hide_all<V, S>(&mut self, registry: &LayerRegistry, out: &mut Outputs<'_, V, S>)
    where
        V: MapViewport + ?Sized,
        S: LegendSurface + ?Sized,
    {
        let updates: Vec<_> = registry
            .layer_ids()
            .map(|id| (id.clone(), Visibility::None))
            .collect();
        self.set_layers(registry, out, &updates);
    }

    /// Applies `updates` to the map, records the ones the renderer accepted,
    /// and re-derives every button that controls one of the touched layers.
    pub fn set_layers<V, S>(
        &mut self,
        registry: &LayerRegistry,
        out: &mut Outputs<'_, V, S>,
        updates: &[(LayerId, Visibility)],
    ) -> BatchReport
    where
        V: MapViewport + ?Sized,
        S: LegendSurface + ?Sized,
    {
        let report = apply_visibility_batch(
            &mut *out.viewport,
            updates.iter().map(|(id, v)| (id, *v)),
            &mut *out.metrics,
        );
        // Only what the renderer accepted; dropped and failed updates leave
        // the layer, and therefore its buttons, where they were.
        for (id, v) in &report.applied {
            self.applied.insert(id.clone(), *v);
        }
        for id in &report.unknown {
            self.applied.remove(id);
        }
        let visible = self.applied.values().filter(|v| v.is_visible()).count();
        out.metrics
            .set_gauge(names::VISIBLE_LAYERS, i64::try_from(visible).unwrap_or(i64::MAX));
        let touched: Vec<LayerId> = updates.iter().map(|(id, _)| id.clone()).collect();
        for toggle in registry.toggles_sharing(&touched) {
            let state = self.derive(&toggle.layers);
            self.states.insert(toggle.id.clone(), state);
            out.surface.set_toggle_active(&toggle.id, state.is_active());
        }
        report
    }

    /// Pushes every button's state to the surface.
    pub fn sync_all<S: LegendSurface + ?Sized>(&self, surface: &mut S) {
        for (id, state) in &self.states {
            surface.set_toggle_active(id, state.is_active());
        }
    }

    fn derive(&self, layers: &[LayerId]) -> ToggleState {
        ToggleState::from_active(
            layers
                .iter()
                .all(|id| self.applied(id.as_str()) == Some(Visibility::Visible)),
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use foundation::ids::ToggleId;
    use layers::layer::{Location, Visibility};
    use layers::registry::LayerRegistry;
    use layers::viewport::{InMemoryViewport, MapViewport};
    use runtime::metrics::Metrics;

    use super::{LegendController, LegendSurface, Outputs, ToggleState};
    use crate::config::StoryConfig;

    /// Records what the page would show.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub panels: BTreeMap<Location, bool>,
        pub toggles: BTreeMap<ToggleId, bool>,
    }

    impl RecordingSurface {
        pub fn shown_panels(&self) -> Vec<Location> {
            self.panels.iter().filter(|(_, v)| **v).map(|(l, _)| *l).collect()
        }
    }

    impl LegendSurface for RecordingSurface {
        fn show_panel(&mut self, panel: Location, visible: bool) {
            self.panels.insert(panel, visible);
        }

        fn set_toggle_active(&mut self, toggle: &ToggleId, active: bool) {
            self.toggles.insert(toggle.clone(), active);
        }
    }

    struct Fixture {
        registry: LayerRegistry,
        legend: LegendController,
        viewport: InMemoryViewport,
        surface: RecordingSurface,
        metrics: Metrics,
    }

    impl Fixture {
        fn new() -> Self {
            let registry = StoryConfig::builtin().registry().unwrap();
            let legend = LegendController::new(&registry);
            let viewport = InMemoryViewport::from_registry(&registry);
            Self {
                registry,
                legend,
                viewport,
                surface: RecordingSurface::default(),
                metrics: Metrics::new(),
            }
        }

        fn click(&mut self, toggle: &str) -> Option<ToggleState> {
            let mut out = Outputs {
                viewport: &mut self.viewport,
                surface: &mut self.surface,
                metrics: &mut self.metrics,
            };
            self.legend.click(&self.registry, &mut out, toggle)
        }

        fn vis(&self, layer: &str) -> Option<Visibility> {
            self.viewport.visibility(&layer.into())
        }

        fn assert_consistent(&self) {
            for t in self.registry.toggles() {
                let active = self.legend.state(t.id.as_str()).unwrap().is_active();
                let all_visible = t
                    .layers
                    .iter()
                    .all(|l| self.viewport.visibility(l) == Some(Visibility::Visible));
                assert_eq!(active, all_visible, "toggle {}", t.id);
                if let Some(shown) = self.surface.toggles.get(&t.id) {
                    assert_eq!(*shown, active, "surface for {}", t.id);
                }
            }
            assert_eq!(self.vis("poi_points"), self.vis("poi_labels"));
        }
    }

    #[test]
    fn double_click_is_idempotent() {
        let mut f = Fixture::new();
        assert_eq!(f.click("toggle-destroyed-fixed"), Some(ToggleState::Inactive));
        assert_eq!(f.vis("hiroshima_detruit_layer"), Some(Visibility::None));
        assert_eq!(f.surface.toggles.get("toggle-destroyed-fixed"), Some(&false));
        assert_eq!(f.click("toggle-destroyed-fixed"), Some(ToggleState::Active));
        assert_eq!(f.vis("hiroshima_detruit_layer"), Some(Visibility::Visible));
        f.assert_consistent();
    }

    #[test]
    fn poi_buttons_move_points_and_labels_together() {
        let mut f = Fixture::new();
        f.click("toggle-poi-fixed");
        assert_eq!(f.vis("poi_points"), Some(Visibility::None));
        assert_eq!(f.vis("poi_labels"), Some(Visibility::None));
        // The per-panel POI buttons follow the shared layers.
        assert_eq!(f.legend.state("toggle-poi-naga-fixed"), Some(ToggleState::Inactive));
        f.assert_consistent();

        f.click("toggle-poi-hiro-fixed");
        assert_eq!(f.vis("poi_points"), Some(Visibility::Visible));
        assert_eq!(f.vis("poi_labels"), Some(Visibility::Visible));
        assert_eq!(f.legend.state("toggle-poi-fixed"), Some(ToggleState::Active));
        f.assert_consistent();
    }

    #[test]
    fn any_click_sequence_keeps_buttons_and_layers_in_step() {
        let mut f = Fixture::new();
        let ids: Vec<String> = f.registry.toggles().iter().map(|t| t.id.to_string()).collect();
        // Deterministic pseudo-random walk over the buttons.
        let mut x: u32 = 7;
        for _ in 0..200 {
            x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            let pick = &ids[(x >> 16) as usize % ids.len()];
            f.click(pick);
            f.assert_consistent();
        }
    }

    #[test]
    fn reset_restores_only_the_panel_buttons() {
        let mut f = Fixture::new();
        f.click("toggle-destroyed-fixed");
        f.click("toggle-naga-feu-fixed");
        f.click("toggle-poi-fixed");
        {
            let mut out = Outputs {
                viewport: &mut f.viewport,
                surface: &mut f.surface,
                metrics: &mut f.metrics,
            };
            f.legend.reset_all(&f.registry, &mut out, Location::Hiroshima);
        }
        assert_eq!(f.legend.state("toggle-destroyed-fixed"), Some(ToggleState::Active));
        assert_eq!(f.legend.state("toggle-poi-fixed"), Some(ToggleState::Active));
        assert_eq!(f.legend.state("toggle-naga-feu-fixed"), Some(ToggleState::Inactive));
        f.assert_consistent();
    }

    #[test]
    fn unknown_toggle_is_a_no_op() {
        let mut f = Fixture::new();
        assert_eq!(f.click("toggle-does-not-exist"), None);
        assert!(f.surface.toggles.is_empty());
        assert!(f.viewport.visible_layers().len() == f.registry.layers().len());
    }

    #[test]
    fn click_before_map_ready_leaves_button_and_layer_alone() {
        let mut f = Fixture::new();
        f.viewport.set_ready(false);
        assert_eq!(f.click("toggle-sauve-fixed"), Some(ToggleState::Active));
        assert_eq!(f.legend.applied("hiroshima_sauve_layer"), Some(Visibility::Visible));
        assert_eq!(f.vis("hiroshima_sauve_layer"), Some(Visibility::Visible));
        assert_eq!(f.surface.toggles.get("toggle-sauve-fixed"), Some(&true));
        f.assert_consistent();
    }

    #[test]
    fn failing_layer_keeps_its_button_in_step() {
        let mut f = Fixture::new();
        f.viewport.fail_layer("hiroshima_detruit_layer".into());
        assert_eq!(f.click("toggle-destroyed-fixed"), Some(ToggleState::Active));
        assert_eq!(f.vis("hiroshima_detruit_layer"), Some(Visibility::Visible));
        f.assert_consistent();
    }

    #[test]
    fn layer_missing_from_renderer_reads_as_inactive() {
        let registry = StoryConfig::builtin().registry().unwrap();
        let mut legend = LegendController::new(&registry);
        let mut viewport = InMemoryViewport::new();
        for id in registry.layer_ids().filter(|id| id.as_str() != "poi_labels") {
            viewport.add_layer(id.clone(), Visibility::Visible);
        }
        viewport.set_ready(true);
        let mut surface = RecordingSurface::default();
        let mut metrics = Metrics::new();
        let mut out = Outputs {
            viewport: &mut viewport,
            surface: &mut surface,
            metrics: &mut metrics,
        };
        legend.reset_all(&registry, &mut out, Location::Nagasaki);
        assert_eq!(legend.applied("poi_labels"), None);
        assert_eq!(legend.state("toggle-poi-naga-fixed"), Some(ToggleState::Inactive));
        assert_eq!(surface.toggles.get("toggle-poi-naga-fixed"), Some(&false));
        assert_eq!(legend.state("toggle-naga-feu-fixed"), Some(ToggleState::Active));
    }
}

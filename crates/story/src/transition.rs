//! Section transitions: what the map and legend show as the reader moves
//! from one step to the next.
//!
//! Every enter recomputes the full overlay from the section table, so a
//! dropped or coalesced scroll notification can never leave stale state
//! behind past the next enter.

use foundation::ids::SectionId;
use layers::layer::{LayerGroup, Location, Visibility};
use layers::registry::LayerRegistry;
use layers::viewport::{MapViewport, fly_to_logged};
use runtime::event_bus::EventBus;
use runtime::metrics::{Metrics, names};
use tracing::{debug, info, warn};

use crate::config::StoryConfig;
use crate::error::StoryError;
use crate::legend::{LegendController, LegendSurface, Outputs, ToggleState};
use crate::section::{Direction, PanelScope, SectionTable};

/// Owns the map viewport and the legend surface for one page.
pub struct StoryController<V, S> {
    registry: LayerRegistry,
    sections: SectionTable,
    legend: LegendController,
    viewport: V,
    surface: S,
    metrics: Metrics,
    trace: EventBus,
    current: Option<SectionId>,
}

impl<V, S> StoryController<V, S>
where
    V: MapViewport,
    S: LegendSurface,
{
    pub fn new(config: &StoryConfig, viewport: V, surface: S) -> Result<Self, StoryError> {
        config.validate()?;
        let registry = config.registry()?;
        let sections = config.section_table()?;
        let legend = LegendController::new(&registry);
        Ok(Self {
            registry,
            sections,
            legend,
            viewport,
            surface,
            metrics: Metrics::new(),
            trace: EventBus::new(),
            current: None,
        })
    }

    pub fn current_section(&self) -> Option<&SectionId> {
        self.current.as_ref()
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn sections(&self) -> &SectionTable {
        &self.sections
    }

    pub fn legend(&self) -> &LegendController {
        &self.legend
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn trace(&self) -> &EventBus {
        &self.trace
    }

    fn outputs(&mut self) -> (&LayerRegistry, &mut LegendController, Outputs<'_, V, S>) {
        (
            &self.registry,
            &mut self.legend,
            Outputs {
                viewport: &mut self.viewport,
                surface: &mut self.surface,
                metrics: &mut self.metrics,
            },
        )
    }

    fn hide_panels(&mut self, scope: PanelScope) {
        for panel in Location::ALL {
            if scope.includes(panel) {
                self.surface.show_panel(panel, false);
            }
        }
    }

    /// Enter notification for section `id`.
    pub fn enter(&mut self, id: &str) {
        self.current = Some(SectionId::new(id));
        self.metrics.inc(names::SECTION_ENTER);
        self.trace.emit("enter", id);
        self.hide_panels(PanelScope::All);

        let Some(section) = self.sections.get(id).cloned() else {
            self.metrics.inc(names::UNKNOWN_SECTION);
            warn!(section = id, "entered a section with no map configuration");
            return;
        };
        info!(section = id, location = ?section.location, "entering section");

        fly_to_logged(&mut self.viewport, &section.pose, &mut self.metrics);

        let Some(location) = section.location else {
            let (registry, legend, mut out) = self.outputs();
            legend.hide_all(registry, &mut out);
            return;
        };

        self.surface.show_panel(location, true);
        let updates: Vec<_> = self
            .registry
            .layers()
            .iter()
            .map(|def| {
                let visible = match def.group {
                    LayerGroup::Location(l) => l == location,
                    LayerGroup::Poi => true,
                };
                (def.id.clone(), Visibility::from_visible(visible))
            })
            .collect();
        let (registry, legend, mut out) = self.outputs();
        legend.set_layers(registry, &mut out, &updates);
        legend.reset_all(registry, &mut out, location);
    }

    /// Exit notification for section `id`, leaving in `direction`.
    pub fn exit(&mut self, id: &str, direction: Direction) {
        self.metrics.inc(names::SECTION_EXIT);
        self.trace.emit("exit", format!("{id} ({})", direction.as_str()));

        let Some(next) = self.sections.adjacent(id, direction) else {
            debug!(section = id, direction = direction.as_str(), "no adjacent section");
            return;
        };
        let Some(rule) = self.sections.exit_rule(id, next.id.as_str()) else {
            return;
        };
        let scope = rule.panels;
        info!(from = id, to = %next.id, "leaving location narrative, clearing overlay");
        self.metrics.inc(names::EXIT_RULE_HIT);

        self.hide_panels(scope);
        let (registry, legend, mut out) = self.outputs();
        legend.hide_all(registry, &mut out);
    }

    /// A legend button was clicked.
    pub fn click_toggle(&mut self, toggle: &str) -> Option<ToggleState> {
        self.trace.emit("toggle", toggle);
        let (registry, legend, mut out) = self.outputs();
        legend.click(registry, &mut out, toggle)
    }

    /// The renderer finished loading: hide everything it added as visible,
    /// then replay the current section so the first frame is right.
    pub fn on_map_ready(&mut self) {
        self.trace.emit("map", "ready");
        {
            let (registry, legend, mut out) = self.outputs();
            legend.hide_all(registry, &mut out);
        }
        self.legend.sync_all(&mut self.surface);
        if let Some(id) = self.current.clone() {
            self.enter(id.as_str());
        }
    }
}

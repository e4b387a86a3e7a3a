//! Offline driver for a story configuration: replays a reading path against
//! an in-memory map and reports what the reader would see after each step.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use foundation::camera::CameraPose;
use foundation::ids::ToggleId;
use layers::layer::Location;
use layers::viewport::InMemoryViewport;
use serde::Serialize;
use story::{Direction, LegendSurface, StoryConfig, StoryController, StoryError};
use tracing::debug;

/// Prefix marking a step as a legend click instead of a section.
pub const CLICK_PREFIX: &str = "click:";

/// Records what the page would show.
#[derive(Debug, Default, Clone)]
pub struct PanelRecorder {
    panels: BTreeMap<Location, bool>,
    toggles: BTreeMap<ToggleId, bool>,
}

impl LegendSurface for PanelRecorder {
    fn show_panel(&mut self, panel: Location, visible: bool) {
        self.panels.insert(panel, visible);
    }

    fn set_toggle_active(&mut self, toggle: &ToggleId, active: bool) {
        self.toggles.insert(toggle.clone(), active);
    }
}

impl PanelRecorder {
    pub fn shown_panels(&self) -> Vec<Location> {
        self.panels.iter().filter(|(_, v)| **v).map(|(k, _)| *k).collect()
    }

    pub fn active_toggles(&self) -> Vec<String> {
        self.toggles
            .iter()
            .filter(|(_, v)| **v)
            .map(|(k, _)| k.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub step: String,
    pub section: Option<String>,
    pub camera: Option<CameraPose>,
    pub visible_layers: Vec<String>,
    pub panels: Vec<Location>,
    pub active_toggles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    pub snapshots: Vec<Snapshot>,
    pub metrics: BTreeMap<String, u64>,
}

impl WalkReport {
    pub fn render(&self) -> String {
        let mut out = String::new();
        for s in &self.snapshots {
            let _ = writeln!(out, "== {}", s.step);
            if let Some(cam) = &s.camera {
                let _ = writeln!(
                    out,
                    "   camera  [{:.5}, {:.5}] z{} bearing {} pitch {}",
                    cam.center.lon_deg, cam.center.lat_deg, cam.zoom, cam.bearing_deg, cam.pitch_deg
                );
            }
            let panels: Vec<&str> = s.panels.iter().map(|p| p.as_str()).collect();
            let _ = writeln!(out, "   panels  {}", join_or_dash(&panels));
            let _ = writeln!(out, "   layers  {}", join_or_dash(&s.visible_layers));
            let _ = writeln!(out, "   toggles {}", join_or_dash(&s.active_toggles));
        }
        for (name, value) in &self.metrics {
            let _ = writeln!(out, "{name}={value}");
        }
        out
    }
}

fn join_or_dash<T: AsRef<str>>(items: &[T]) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug)]
pub enum WalkError {
    Story(StoryError),
    UnknownToggle(String),
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkError::Story(e) => write!(f, "{e}"),
            WalkError::UnknownToggle(t) => write!(f, "unknown toggle: {t}"),
        }
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WalkError::Story(e) => Some(e),
            WalkError::UnknownToggle(_) => None,
        }
    }
}

impl From<StoryError> for WalkError {
    fn from(e: StoryError) -> Self {
        WalkError::Story(e)
    }
}

/// Replays `steps` in order. Each section step exits the previous section in
/// the direction implied by document order, then enters the new one.
pub fn walk<S: AsRef<str>>(config: &StoryConfig, steps: &[S]) -> Result<WalkReport, WalkError> {
    let registry = config.registry()?;
    let mut viewport = InMemoryViewport::from_registry(&registry);
    viewport.set_ready(true);
    let mut story = StoryController::new(config, viewport, PanelRecorder::default())?;
    story.on_map_ready();

    let mut report = WalkReport::default();
    let mut previous: Option<String> = None;
    for step in steps {
        let step = step.as_ref();
        if let Some(toggle) = step.strip_prefix(CLICK_PREFIX) {
            if story.click_toggle(toggle).is_none() {
                return Err(WalkError::UnknownToggle(toggle.to_string()));
            }
        } else {
            if let Some(prev) = previous.as_deref() {
                let direction = direction_between(&story, prev, step);
                debug!(from = prev, to = step, direction = direction.as_str(), "walking");
                story.exit(prev, direction);
            }
            story.enter(step);
            previous = Some(step.to_string());
        }
        report.snapshots.push(snapshot(&story, step));
    }
    report.metrics = story.metrics().snapshot().counters.into_iter().collect();
    Ok(report)
}

fn direction_between(
    story: &StoryController<InMemoryViewport, PanelRecorder>,
    from: &str,
    to: &str,
) -> Direction {
    match (story.sections().position(from), story.sections().position(to)) {
        (Some(a), Some(b)) if b < a => Direction::Backward,
        _ => Direction::Forward,
    }
}

fn snapshot(story: &StoryController<InMemoryViewport, PanelRecorder>, step: &str) -> Snapshot {
    Snapshot {
        step: step.to_string(),
        section: story.current_section().map(|s| s.to_string()),
        camera: story.viewport().camera().cloned(),
        visible_layers: story
            .viewport()
            .visible_layers()
            .into_iter()
            .map(|l| l.to_string())
            .collect(),
        panels: story.surface().shown_panels(),
        active_toggles: story.surface().active_toggles(),
    }
}

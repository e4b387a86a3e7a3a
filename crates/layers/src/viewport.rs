//! Seam between the story logic and whatever draws the map.
//!
//! The renderer loads asynchronously and registers layers on its own
//! schedule, so nothing here may assume ordering relative to readiness.
//! Batches are checked once for readiness, then applied item by item; one bad
//! layer never stops the rest of the batch.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use foundation::camera::CameraPose;
use foundation::ids::LayerId;
use runtime::metrics::{Metrics, names};
use tracing::{debug, warn};

use crate::layer::Visibility;
use crate::registry::LayerRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewportError {
    NotReady,
    UnknownLayer(LayerId),
    Renderer(String),
}

impl fmt::Display for ViewportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewportError::NotReady => write!(f, "map renderer not ready"),
            ViewportError::UnknownLayer(id) => write!(f, "layer not registered: {id}"),
            ViewportError::Renderer(msg) => write!(f, "map renderer error: {msg}"),
        }
    }
}

impl std::error::Error for ViewportError {}

pub trait MapViewport {
    /// Whether the initial style/data load has finished.
    fn is_ready(&self) -> bool;

    fn has_layer(&self, id: &LayerId) -> bool;

    /// Current layout visibility, `None` when unknown to the renderer.
    fn visibility(&self, id: &LayerId) -> Option<Visibility>;

    /// Must be idempotent.
    fn set_visibility(&mut self, id: &LayerId, visibility: Visibility)
    -> Result<(), ViewportError>;

    /// Starts a camera flight and returns immediately. A later call
    /// supersedes an unfinished one.
    fn fly_to(&mut self, pose: &CameraPose) -> Result<(), ViewportError>;
}

impl<V: MapViewport + ?Sized> MapViewport for &mut V {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        (**self).has_layer(id)
    }

    fn visibility(&self, id: &LayerId) -> Option<Visibility> {
        (**self).visibility(id)
    }

    fn set_visibility(
        &mut self,
        id: &LayerId,
        visibility: Visibility,
    ) -> Result<(), ViewportError> {
        (**self).set_visibility(id, visibility)
    }

    fn fly_to(&mut self, pose: &CameraPose) -> Result<(), ViewportError> {
        (**self).fly_to(pose)
    }
}

/// Outcome of one visibility batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Layers the renderer accepted, with the visibility it now has.
    pub applied: Vec<(LayerId, Visibility)>,
    /// Layers the renderer does not have.
    pub unknown: Vec<LayerId>,
    pub failed: usize,
    /// The whole batch was dropped because the renderer was not ready.
    pub dropped: bool,
}

/// Applies `updates` in order.
///
/// Readiness is checked once; a renderer that is not ready drops the batch.
/// Layers the renderer does not know are skipped, and a failing layer is
/// logged and counted without stopping the remaining updates.
pub fn apply_visibility_batch<'a, V, I>(
    viewport: &mut V,
    updates: I,
    metrics: &mut Metrics,
) -> BatchReport
where
    V: MapViewport + ?Sized,
    I: IntoIterator<Item = (&'a LayerId, Visibility)>,
{
    let mut report = BatchReport::default();
    if !viewport.is_ready() {
        metrics.inc(names::DROPPED_BATCH);
        debug!("map not ready, visibility batch dropped");
        report.dropped = true;
        return report;
    }

    for (id, visibility) in updates {
        if !viewport.has_layer(id) {
            metrics.inc(names::UNKNOWN_LAYER);
            debug!(layer = %id, "layer not registered yet, skipped");
            report.unknown.push(id.clone());
            continue;
        }
        match viewport.set_visibility(id, visibility) {
            Ok(()) => {
                metrics.inc(names::LAYER_UPDATE);
                report.applied.push((id.clone(), visibility));
            }
            Err(err) => {
                metrics.inc(names::LAYER_ERROR);
                warn!(layer = %id, visibility = visibility.as_str(), %err, "layer update failed");
                report.failed += 1;
            }
        }
    }
    report
}

/// Fire-and-forget camera flight; failures are logged and counted.
pub fn fly_to_logged<V: MapViewport + ?Sized>(
    viewport: &mut V,
    pose: &CameraPose,
    metrics: &mut Metrics,
) -> bool {
    match viewport.fly_to(pose) {
        Ok(()) => {
            metrics.inc(names::FLY_TO);
            true
        }
        Err(err) => {
            metrics.inc(names::DROPPED_FLY_TO);
            warn!(%err, "camera flight not started");
            false
        }
    }
}

/// Renderer stand-in that keeps layer state in memory.
///
/// Used by the CLI and by tests; fault injection covers the failure paths a
/// real renderer can hit.
#[derive(Debug, Clone, Default)]
pub struct InMemoryViewport {
    ready: bool,
    layers: BTreeMap<LayerId, Visibility>,
    failing: BTreeSet<LayerId>,
    flights: Vec<CameraPose>,
}

impl InMemoryViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every layer of `registry` as visible (the renderer's default
    /// for freshly added layers) and marks the map ready.
    pub fn from_registry(registry: &LayerRegistry) -> Self {
        let mut v = Self::new();
        for id in registry.layer_ids() {
            v.add_layer(id.clone(), Visibility::Visible);
        }
        v.ready = true;
        v
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn add_layer(&mut self, id: LayerId, visibility: Visibility) {
        self.layers.insert(id, visibility);
    }

    /// Makes every later `set_visibility` on `id` fail.
    pub fn fail_layer(&mut self, id: LayerId) {
        self.failing.insert(id);
    }

    pub fn flights(&self) -> &[CameraPose] {
        &self.flights
    }

    /// Pose of the most recent flight, i.e. where the camera ends up.
    pub fn camera(&self) -> Option<&CameraPose> {
        self.flights.last()
    }

    pub fn visible_layers(&self) -> Vec<&LayerId> {
        self.layers
            .iter()
            .filter(|(_, v)| v.is_visible())
            .map(|(id, _)| id)
            .collect()
    }
}

impl MapViewport for InMemoryViewport {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn has_layer(&self, id: &LayerId) -> bool {
        self.layers.contains_key(id)
    }

    fn visibility(&self, id: &LayerId) -> Option<Visibility> {
        self.layers.get(id).copied()
    }

    fn set_visibility(
        &mut self,
        id: &LayerId,
        visibility: Visibility,
    ) -> Result<(), ViewportError> {
        if !self.ready {
            return Err(ViewportError::NotReady);
        }
        if self.failing.contains(id) {
            return Err(ViewportError::Renderer(format!("injected failure on {id}")));
        }
        match self.layers.get_mut(id) {
            Some(v) => {
                *v = visibility;
                Ok(())
            }
            None => Err(ViewportError::UnknownLayer(id.clone())),
        }
    }

    fn fly_to(&mut self, pose: &CameraPose) -> Result<(), ViewportError> {
        self.flights.push(*pose);
        Ok(())
    }
}

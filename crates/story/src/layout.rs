use tracing::info;

use crate::config::LayoutConfig;

/// Page layout, fixed for the lifetime of a page load.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayoutMode {
    /// Touch/narrow screens: the whole page scrolls.
    Narrow,
    /// Wide screens: text scrolls in `#scroll-container` beside a fixed map.
    Wide,
}

impl LayoutMode {
    pub fn for_width(width_px: f64, breakpoint_px: f64) -> Self {
        if width_px <= breakpoint_px {
            LayoutMode::Narrow
        } else {
            LayoutMode::Wide
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResizeAction {
    /// The layout mode changed: reload the page.
    Reload,
    /// Same layout, noticeably different width: re-measure step positions.
    Remeasure,
    Ignore,
}

/// Decides what a settled resize means.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ResizeWatcher {
    config: LayoutConfig,
    last_width_px: f64,
}

impl ResizeWatcher {
    pub fn new(config: LayoutConfig, width_px: f64) -> Self {
        Self {
            config,
            last_width_px: width_px,
        }
    }

    pub fn layout(&self) -> LayoutMode {
        LayoutMode::for_width(self.last_width_px, self.config.breakpoint_px)
    }

    pub fn on_resize(&mut self, width_px: f64) -> ResizeAction {
        let breakpoint = self.config.breakpoint_px;
        if LayoutMode::for_width(width_px, breakpoint) != self.layout() {
            info!(from = self.last_width_px, to = width_px, "layout breakpoint crossed");
            return ResizeAction::Reload;
        }
        // The baseline only moves when we act on it, so slow drags add up.
        if (width_px - self.last_width_px).abs() > self.config.remeasure_threshold_px {
            self.last_width_px = width_px;
            return ResizeAction::Remeasure;
        }
        ResizeAction::Ignore
    }
}

#[cfg(test)]
mod tests {
    use super::{LayoutMode, ResizeAction, ResizeWatcher};
    use crate::config::LayoutConfig;

    #[test]
    fn breakpoint_is_inclusive_for_narrow() {
        assert_eq!(LayoutMode::for_width(768.0, 768.0), LayoutMode::Narrow);
        assert_eq!(LayoutMode::for_width(769.0, 768.0), LayoutMode::Wide);
    }

    #[test]
    fn crossing_the_breakpoint_reloads() {
        let mut w = ResizeWatcher::new(LayoutConfig::default(), 1280.0);
        assert_eq!(w.layout(), LayoutMode::Wide);
        assert_eq!(w.on_resize(700.0), ResizeAction::Reload);
    }

    #[test]
    fn small_moves_accumulate_until_threshold() {
        let mut w = ResizeWatcher::new(LayoutConfig::default(), 1280.0);
        assert_eq!(w.on_resize(1250.0), ResizeAction::Ignore);
        assert_eq!(w.on_resize(1229.0), ResizeAction::Remeasure);
        assert_eq!(w.on_resize(1200.0), ResizeAction::Ignore);
    }
}

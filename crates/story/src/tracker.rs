//! Which step is under the reading line, and when that changes.
//!
//! The reading line sits half a viewport below the scroll offset. The page
//! layout decides how step positions are measured (see [`StepSpan`]); the
//! tracker itself only sees spans in scroll-content coordinates.

use foundation::ids::SectionId;
use tracing::trace;

use crate::section::Direction;

/// Vertical extent of one step, in the coordinates of its scroll container.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSpan {
    pub id: SectionId,
    pub top: f64,
    pub height: f64,
}

impl StepSpan {
    /// Narrow layout: the page scrolls, positions come from the bounding
    /// client rect plus the page offset.
    pub fn from_client_rect(id: SectionId, page_scroll_y: f64, rect_top: f64, height: f64) -> Self {
        Self {
            id,
            top: page_scroll_y + rect_top,
            height,
        }
    }

    /// Wide layout: a dedicated container scrolls, positions are layout
    /// offsets inside it.
    pub fn from_offset(id: SectionId, offset_top: f64, height: f64) -> Self {
        Self {
            id,
            top: offset_top,
            height,
        }
    }

    pub fn contains(&self, y: f64) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

/// Scroll state sampled from the page.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScrollSample {
    /// `window.scrollY` (narrow) or the container's `scrollTop` (wide).
    pub scroll_top: f64,
    pub viewport_height: f64,
}

impl ScrollSample {
    pub fn reading_line(&self) -> f64 {
        self.scroll_top + self.viewport_height / 2.0
    }
}

/// First span containing `y`, in document order.
pub fn locate(spans: &[StepSpan], y: f64) -> Option<usize> {
    spans.iter().position(|s| s.contains(y))
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepEvent {
    Enter { id: SectionId, direction: Direction },
    Exit { id: SectionId, direction: Direction },
}

/// Turns scroll samples into enter/exit notifications.
///
/// One exit (for the step being left) and one enter (for the step now under
/// the reading line) per crossing. Steps skipped over between two samples get
/// no notifications; every enter recomputes the map from scratch so nothing
/// depends on seeing them.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    spans: Vec<StepSpan>,
    active: Option<usize>,
    last_scroll: Option<f64>,
    direction: Direction,
}

impl ScrollTracker {
    pub fn new(spans: Vec<StepSpan>) -> Self {
        Self {
            spans,
            ..Self::default()
        }
    }

    pub fn spans(&self) -> &[StepSpan] {
        &self.spans
    }

    pub fn active(&self) -> Option<&SectionId> {
        self.active.map(|i| &self.spans[i].id)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Replaces the measured spans after a layout change, keeping the active
    /// step by id.
    pub fn remeasure(&mut self, spans: Vec<StepSpan>) {
        let active_id = self.active().cloned();
        self.spans = spans;
        self.active = active_id.and_then(|id| self.spans.iter().position(|s| s.id == id));
    }

    /// Records the step under the reading line without raising notifications.
    /// Used once at startup to find the section to enter first.
    pub fn prime(&mut self, sample: ScrollSample) -> Option<&SectionId> {
        self.active = locate(&self.spans, sample.reading_line());
        self.last_scroll = Some(sample.scroll_top);
        self.active()
    }

    /// Section to enter once the page has settled: the step under the
    /// reading line, so a reload halfway down the story opens where the
    /// reader is, or the first step when the line sits between steps.
    pub fn initial_section(&mut self, sample: ScrollSample) -> Option<&SectionId> {
        self.prime(sample);
        self.active().or_else(|| self.spans.first().map(|s| &s.id))
    }

    pub fn update(&mut self, sample: ScrollSample) -> Vec<StepEvent> {
        if let Some(last) = self.last_scroll {
            self.direction = Direction::from_delta(sample.scroll_top - last, self.direction);
        }
        self.last_scroll = Some(sample.scroll_top);

        let now = locate(&self.spans, sample.reading_line());
        if now == self.active {
            return Vec::new();
        }

        let direction = self.direction;
        let mut events = Vec::with_capacity(2);
        if let Some(old) = self.active {
            events.push(StepEvent::Exit {
                id: self.spans[old].id.clone(),
                direction,
            });
        }
        if let Some(new) = now {
            events.push(StepEvent::Enter {
                id: self.spans[new].id.clone(),
                direction,
            });
        }
        trace!(?events, "step boundary crossed");
        self.active = now;
        events
    }
}

#[cfg(test)]
mod tests {
    use foundation::ids::SectionId;
    use pretty_assertions::assert_eq;

    use super::{ScrollSample, ScrollTracker, StepEvent, StepSpan, locate};
    use crate::section::Direction;

    fn spans() -> Vec<StepSpan> {
        vec![
            StepSpan::from_offset(SectionId::new("intro"), 0.0, 1000.0),
            StepSpan::from_offset(SectionId::new("hiroshima"), 1000.0, 1000.0),
            // Gap between 2000 and 2200.
            StepSpan::from_offset(SectionId::new("nagasaki"), 2200.0, 1000.0),
        ]
    }

    fn at(scroll_top: f64) -> ScrollSample {
        ScrollSample {
            scroll_top,
            viewport_height: 800.0,
        }
    }

    fn enter(id: &str, direction: Direction) -> StepEvent {
        StepEvent::Enter {
            id: SectionId::new(id),
            direction,
        }
    }

    fn exit(id: &str, direction: Direction) -> StepEvent {
        StepEvent::Exit {
            id: SectionId::new(id),
            direction,
        }
    }

    #[test]
    fn locate_uses_half_open_spans() {
        let s = spans();
        assert_eq!(locate(&s, 999.9), Some(0));
        assert_eq!(locate(&s, 1000.0), Some(1));
        assert_eq!(locate(&s, 2100.0), None);
        assert_eq!(locate(&s, -1.0), None);
    }

    #[test]
    fn narrow_spans_add_page_offset() {
        let s = StepSpan::from_client_rect(SectionId::new("a"), 500.0, -120.0, 300.0);
        assert_eq!(s.top, 380.0);
        assert!(s.contains(679.0));
        assert!(!s.contains(680.0));
    }

    #[test]
    fn prime_reports_step_under_reading_line() {
        let mut t = ScrollTracker::new(spans());
        assert_eq!(t.prime(at(700.0)).map(|id| id.as_str()), Some("hiroshima"));
        assert!(t.update(at(710.0)).is_empty());
    }

    #[test]
    fn initial_section_follows_the_reading_line_not_the_first_step() {
        let mut t = ScrollTracker::new(spans());
        assert_eq!(t.initial_section(at(2000.0)).map(|id| id.as_str()), Some("nagasaki"));
        assert_eq!(t.active().map(|id| id.as_str()), Some("nagasaki"));

        let mut t = ScrollTracker::new(spans());
        assert_eq!(t.initial_section(at(1700.0)).map(|id| id.as_str()), Some("intro"));
        assert_eq!(t.active(), None);
        // Scrolling into the next step from the gap is a plain enter.
        assert_eq!(t.update(at(1900.0)), vec![enter("nagasaki", Direction::Forward)]);
    }

    #[test]
    fn crossing_down_then_up() {
        let mut t = ScrollTracker::new(spans());
        t.prime(at(0.0));
        assert_eq!(
            t.update(at(700.0)),
            vec![exit("intro", Direction::Forward), enter("hiroshima", Direction::Forward)]
        );
        assert_eq!(
            t.update(at(500.0)),
            vec![exit("hiroshima", Direction::Backward), enter("intro", Direction::Backward)]
        );
    }

    #[test]
    fn gaps_produce_a_lone_exit_and_skips_produce_one_pair() {
        let mut t = ScrollTracker::new(spans());
        t.prime(at(800.0));
        assert_eq!(t.update(at(1700.0)), vec![exit("hiroshima", Direction::Forward)]);
        assert_eq!(t.active(), None);
        assert_eq!(t.update(at(1900.0)), vec![enter("nagasaki", Direction::Forward)]);

        let mut t = ScrollTracker::new(spans());
        t.prime(at(0.0));
        assert_eq!(
            t.update(at(2000.0)),
            vec![exit("intro", Direction::Forward), enter("nagasaki", Direction::Forward)]
        );
    }

    #[test]
    fn remeasure_keeps_active_step_by_id() {
        let mut t = ScrollTracker::new(spans());
        t.prime(at(700.0));
        let mut moved = spans();
        moved.remove(0);
        t.remeasure(moved);
        assert_eq!(t.active().map(|id| id.as_str()), Some("hiroshima"));
        t.remeasure(vec![]);
        assert_eq!(t.active(), None);
    }
}

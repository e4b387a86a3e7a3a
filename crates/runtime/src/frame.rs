/// Coalesces bursts of notifications to at most one handler run per
/// animation frame.
///
/// The host calls [`FrameGate::request`] on every raw event and only schedules
/// an animation-frame callback when it returns `true`; the callback calls
/// [`FrameGate::begin_frame`] before doing the work. Everything in between
/// collapses into that single run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameGate {
    pending: bool,
    coalesced: u64,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the caller must schedule a frame callback.
    pub fn request(&mut self) -> bool {
        if self.pending {
            self.coalesced += 1;
            return false;
        }
        self.pending = true;
        true
    }

    /// Marks the scheduled frame as running. Returns `false` for a stray
    /// callback with nothing pending.
    pub fn begin_frame(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Number of requests absorbed by an already-scheduled frame.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::FrameGate;

    #[test]
    fn bursts_schedule_once() {
        let mut g = FrameGate::new();
        assert!(g.request());
        assert!(!g.request());
        assert!(!g.request());
        assert_eq!(g.coalesced(), 2);
        assert!(g.begin_frame());
        assert!(!g.is_pending());
        assert!(g.request());
    }

    #[test]
    fn stray_frame_is_ignored() {
        let mut g = FrameGate::new();
        assert!(!g.begin_frame());
    }
}

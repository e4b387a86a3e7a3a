/// Reading progress in percent of the scrollable range, clamped to `0..=100`.
pub fn scroll_percent(scroll_top: f64, scroll_height: f64, client_height: f64) -> f64 {
    let range = scroll_height - client_height;
    if range <= 0.0 {
        return 0.0;
    }
    (scroll_top / range * 100.0).clamp(0.0, 100.0)
}

/// Rate limit for the progress bar: skip updates closer than
/// `min_interval_ms` in time or `min_delta_px` in scroll distance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProgressThrottle {
    min_interval_ms: f64,
    min_delta_px: f64,
    last_time_ms: f64,
    last_scroll: f64,
}

impl ProgressThrottle {
    pub fn new(min_interval_ms: f64, min_delta_px: f64) -> Self {
        Self {
            min_interval_ms,
            min_delta_px,
            last_time_ms: f64::NEG_INFINITY,
            last_scroll: 0.0,
        }
    }

    /// Returns the new percentage, or `None` when the update is skipped.
    pub fn update(
        &mut self,
        now_ms: f64,
        scroll_top: f64,
        scroll_height: f64,
        client_height: f64,
    ) -> Option<f64> {
        if now_ms - self.last_time_ms < self.min_interval_ms {
            return None;
        }
        if (scroll_top - self.last_scroll).abs() < self.min_delta_px {
            return None;
        }
        self.last_scroll = scroll_top;
        self.last_time_ms = now_ms;
        Some(scroll_percent(scroll_top, scroll_height, client_height))
    }
}

#[cfg(test)]
mod tests {
    use super::{ProgressThrottle, scroll_percent};

    #[test]
    fn percent_is_clamped_and_safe_on_short_pages() {
        assert_eq!(scroll_percent(500.0, 2000.0, 1000.0), 50.0);
        assert_eq!(scroll_percent(1500.0, 2000.0, 1000.0), 100.0);
        assert_eq!(scroll_percent(10.0, 800.0, 1000.0), 0.0);
    }

    #[test]
    fn throttle_skips_close_updates() {
        let mut t = ProgressThrottle::new(16.0, 5.0);
        assert_eq!(t.update(0.0, 100.0, 2000.0, 1000.0), Some(10.0));
        // Too soon.
        assert_eq!(t.update(10.0, 300.0, 2000.0, 1000.0), None);
        // Too small a move.
        assert_eq!(t.update(40.0, 103.0, 2000.0, 1000.0), None);
        assert_eq!(t.update(40.0, 300.0, 2000.0, 1000.0), Some(30.0));
    }
}

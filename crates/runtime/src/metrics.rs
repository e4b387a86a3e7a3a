use std::collections::BTreeMap;

/// Counter names shared by the crates that report into [`Metrics`].
pub mod names {
    pub const SECTION_ENTER: &str = "story.section_enter";
    pub const SECTION_EXIT: &str = "story.section_exit";
    pub const EXIT_RULE_HIT: &str = "story.exit_rule_hit";
    pub const UNKNOWN_SECTION: &str = "story.unknown_section";
    pub const TOGGLE_CLICK: &str = "legend.toggle_click";
    pub const LEGEND_RESET: &str = "legend.reset";
    pub const FLY_TO: &str = "viewport.fly_to";
    pub const DROPPED_BATCH: &str = "viewport.dropped_batch";
    pub const DROPPED_FLY_TO: &str = "viewport.dropped_fly_to";
    pub const UNKNOWN_LAYER: &str = "viewport.unknown_layer";
    pub const LAYER_ERROR: &str = "viewport.layer_error";
    pub const LAYER_UPDATE: &str = "viewport.layer_update";
    /// Gauge: layers the legend last commanded visible.
    pub const VISIBLE_LAYERS: &str = "legend.visible_layers";
}

/// Deterministic counters and gauges.
///
/// Sorted maps keep snapshots stable so they can be diffed in tests and
/// printed as-is.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub gauges: Vec<(String, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.gauges.clear();
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn inc_counter(&mut self, name: impl Into<String>, by: u64) {
        *self.counters.entry(name.into()).or_insert(0) += by;
    }

    pub fn inc(&mut self, name: &str) {
        self.inc_counter(name, 1);
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: impl Into<String>, value: i64) {
        self.gauges.insert(name.into(), value);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }
}

impl MetricsSnapshot {
    /// `name=value` pairs, one per line, counters first.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (k, v) in &self.counters {
            out.push_str(&format!("{k}={v}\n"));
        }
        for (k, v) in &self.gauges {
            out.push_str(&format!("{k}={v}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Metrics, names};

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.inc(names::FLY_TO);
        m.inc_counter(names::FLY_TO, 2);
        assert_eq!(m.counter(names::FLY_TO), 3);
        assert_eq!(m.counter("missing"), 0);
    }

    #[test]
    fn gauges_overwrite() {
        let mut m = Metrics::new();
        assert_eq!(m.gauge("g"), None);
        m.set_gauge("g", 10);
        m.set_gauge("g", 11);
        assert_eq!(m.gauge("g"), Some(11));
    }

    #[test]
    fn snapshot_is_stably_sorted_and_renders() {
        let mut m = Metrics::new();
        m.inc("b");
        m.inc("a");
        m.set_gauge("z", -1);
        let snap = m.snapshot();
        assert_eq!(snap.counters, vec![("a".to_string(), 1), ("b".to_string(), 1)]);
        assert_eq!(snap.render(), "a=1\nb=1\nz=-1\n");
        m.clear();
        assert!(m.snapshot().counters.is_empty());
    }
}

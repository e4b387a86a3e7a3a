use std::collections::VecDeque;

/// One entry in the story trace.
///
/// Structured text on purpose: the trace is read by people (CLI output,
/// `story_trace()` in the browser console), not replayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Monotonic sequence number, 0-based, never reused after eviction.
    pub seq: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Bounded in-memory trace of handler activity.
///
/// A page can stay open for a long time, so the oldest entries are evicted
/// once `capacity` is reached.
#[derive(Debug)]
pub struct EventBus {
    events: VecDeque<Event>,
    capacity: usize,
    next_seq: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq: self.next_seq,
            kind,
            message: message.into(),
        });
        self.next_seq += 1;
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.back()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_in_order() {
        let mut bus = EventBus::new();
        bus.emit("enter", "intro");
        bus.emit("exit", "intro");
        let kinds: Vec<_> = bus.events().map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["enter", "exit"]);
        assert_eq!(bus.last().map(|e| e.seq), Some(1));
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut bus = EventBus::with_capacity(2);
        bus.emit("k", "a");
        bus.emit("k", "b");
        bus.emit("k", "c");
        assert_eq!(bus.len(), 2);
        let msgs: Vec<_> = bus.events().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["b", "c"]);
        assert_eq!(bus.events().next().map(|e| e.seq), Some(1));
    }
}

use foundation::time::Millis;

/// Ticket handed out by [`Debouncer::poke`]; only the newest one fires.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DebounceTicket(u64);

/// Delays work until input has been quiet for `wait`.
///
/// Timer-agnostic: the host arms one timer per poke with the returned ticket
/// and, when a timer fires, asks [`Debouncer::settle`] whether that ticket is
/// still the latest. Superseded timers become no-ops, which is the same as
/// cancelling them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    wait: Millis,
    latest: u64,
    settled: bool,
}

impl Debouncer {
    pub fn new(wait: Millis) -> Self {
        Self {
            wait,
            latest: 0,
            settled: true,
        }
    }

    pub fn wait(&self) -> Millis {
        self.wait
    }

    pub fn poke(&mut self) -> DebounceTicket {
        self.latest += 1;
        self.settled = false;
        DebounceTicket(self.latest)
    }

    /// Returns `true` exactly once, for the most recent ticket.
    pub fn settle(&mut self, ticket: DebounceTicket) -> bool {
        if self.settled || ticket.0 != self.latest {
            return false;
        }
        self.settled = true;
        true
    }
}

//! Page furniture around the map: loader overlay, bibliography drawer,
//! mobile gate and the reveal cascade.

use foundation::Millis;

const MOBILE_AGENTS: [&str; 7] = [
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

pub fn is_mobile_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_AGENTS.iter().any(|m| ua.contains(m))
}

/// The story is blocked only on a mobile agent with a narrow screen.
pub fn should_block_mobile(user_agent: &str, width_px: f64, breakpoint_px: f64) -> bool {
    is_mobile_agent(user_agent) && width_px <= breakpoint_px
}

/// Delay before the `index`-th timeline item is revealed.
pub fn reveal_delay(index: usize, step: Millis) -> Millis {
    step.times(index)
}

/// Fires once, for whichever of map-load or timeout arrives first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoaderLatch {
    hidden: bool,
}

impl LoaderLatch {
    pub fn hide(&mut self) -> bool {
        !std::mem::replace(&mut self.hidden, true)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DisclosureState {
    Collapsed,
    Expanded,
    /// Close animation running; content still displayed.
    Closing,
}

/// What the DOM should show for a disclosure.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DisclosureView {
    pub aria_expanded: bool,
    pub aria_hidden: bool,
    pub displayed: bool,
    pub closing_class: bool,
}

/// Expand/collapse drawer with a delayed close.
///
/// Each close hands out a generation; a stale `finish_close` after a
/// re-open is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disclosure {
    state: DisclosureState,
    generation: u64,
}

impl Default for Disclosure {
    fn default() -> Self {
        Self {
            state: DisclosureState::Collapsed,
            generation: 0,
        }
    }
}

impl Disclosure {
    pub fn state(&self) -> DisclosureState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == DisclosureState::Expanded
    }

    /// Flips the drawer. Returns the close ticket when a close was started.
    pub fn toggle(&mut self) -> Option<u64> {
        match self.state {
            DisclosureState::Expanded => {
                self.generation += 1;
                self.state = DisclosureState::Closing;
                Some(self.generation)
            }
            DisclosureState::Collapsed | DisclosureState::Closing => {
                self.generation += 1;
                self.state = DisclosureState::Expanded;
                None
            }
        }
    }

    pub fn finish_close(&mut self, ticket: u64) -> bool {
        if self.state == DisclosureState::Closing && ticket == self.generation {
            self.state = DisclosureState::Collapsed;
            true
        } else {
            false
        }
    }

    pub fn view(&self) -> DisclosureView {
        match self.state {
            DisclosureState::Collapsed => DisclosureView {
                aria_expanded: false,
                aria_hidden: true,
                displayed: false,
                closing_class: false,
            },
            DisclosureState::Expanded => DisclosureView {
                aria_expanded: true,
                aria_hidden: false,
                displayed: true,
                closing_class: false,
            },
            DisclosureState::Closing => DisclosureView {
                aria_expanded: false,
                aria_hidden: true,
                displayed: true,
                closing_class: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mobile_gate_needs_agent_and_width() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert!(should_block_mobile(iphone, 390.0, 768.0));
        assert!(!should_block_mobile(iphone, 1024.0, 768.0));
        assert!(!should_block_mobile("Mozilla/5.0 (X11; Linux x86_64)", 390.0, 768.0));
        assert!(is_mobile_agent("Opera Mini/8.0"));
    }

    #[test]
    fn loader_hides_once() {
        let mut latch = LoaderLatch::default();
        assert!(latch.hide());
        assert!(!latch.hide());
        assert!(latch.is_hidden());
    }

    #[test]
    fn reveal_cascade() {
        assert_eq!(reveal_delay(0, Millis(100)), Millis(0));
        assert_eq!(reveal_delay(3, Millis(100)), Millis(300));
    }

    #[test]
    fn disclosure_close_can_be_cancelled_by_reopen() {
        let mut d = Disclosure::default();
        assert!(d.view().aria_hidden);
        assert_eq!(d.toggle(), None);
        assert!(d.view().displayed);
        let ticket = d.toggle().unwrap();
        assert!(d.view().closing_class);
        assert_eq!(d.toggle(), None);
        assert!(!d.finish_close(ticket));
        assert!(d.is_expanded());

        let ticket = d.toggle().unwrap();
        assert!(d.finish_close(ticket));
        assert_eq!(d.state(), DisclosureState::Collapsed);
        assert!(!d.view().displayed);
    }
}

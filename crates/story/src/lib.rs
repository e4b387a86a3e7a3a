pub mod config;
pub mod error;
pub mod infographic;
pub mod layout;
pub mod legend;
pub mod page;
pub mod progress;
pub mod section;
pub mod tracker;
pub mod transition;

pub use config::*;
pub use error::*;
pub use infographic::{Figure, InfographicTab, TabSwitcher};
pub use layout::{LayoutMode, ResizeAction, ResizeWatcher};
pub use legend::*;
pub use page::{Disclosure, LoaderLatch};
pub use progress::{ProgressThrottle, scroll_percent};
pub use section::*;
pub use tracker::*;
pub use transition::*;

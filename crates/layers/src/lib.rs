pub mod layer;
pub mod registry;
pub mod symbology;
pub mod viewport;

pub use layer::*;
pub use registry::*;
pub use viewport::*;

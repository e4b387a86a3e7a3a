pub mod lonlat;

pub use lonlat::*;

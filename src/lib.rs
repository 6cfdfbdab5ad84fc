pub use gale_core as core;

pub use gale_core::*;
pub use gale_wind::*;

#[cfg(feature = "cpal")]
pub use gale_cpal::*;

//! Segmentation mask overlay
//!
//! Tracks whether the mask can be shown and drives its opacity in the viewer.

pub mod controller;
pub mod types;

pub use controller::{LABEL_AVAILABLE, LABEL_UNAVAILABLE, OverlayController};
pub use types::{OverlayState, OverlayToggle};

// extensions/mod.rs
//
// Small math helpers shared by the clock and camera keyframes.

pub mod easing;

pub use easing::{Easing, lerp, ease, ease_angle_deg};

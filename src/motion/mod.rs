//! Motion module for servo-motion.
//!
//! Provides angle-to-pulse mapping and smoothed move planning.

mod profile;
mod pulse;

pub use profile::{plan, MotionPlan, MotionStep};
pub use pulse::{angle_to_pulse, PulseMapper};

//! Configuration module for servo-motion.
//!
//! Provides types for loading and validating servo settings and channel
//! wiring from TOML files (with `std` feature) or pre-parsed data.

mod channel;
#[cfg(feature = "std")]
mod loader;
mod servo;
#[cfg(feature = "std")]
mod shared;
mod system;
pub mod units;
mod validation;

pub use channel::ChannelConfig;
pub use servo::{
    ConfigUpdate, HoldMode, ServoConfig, HOLD_TIME_RANGE, MAX_PULSE_WIDTH_RANGE,
    MIN_PULSE_WIDTH_RANGE, SMOOTH_DELAY_RANGE, SMOOTH_STEPS_RANGE,
};
pub use system::{SystemConfig, MAX_CHANNELS};
pub use validation::{validate_config, validate_servo_config};

pub(crate) use validation::validate_smoothing;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config, save_config, to_toml_string};
#[cfg(feature = "std")]
pub use shared::SharedConfig;

// Re-export unit types at config level
pub use units::{Degrees, PulseWidth, Seconds, ServoId};

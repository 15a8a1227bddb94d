//! # servo-motion
//!
//! Jitter-free hobby servo control with embedded-hal 1.0 PWM support.
//!
//! ## Features
//!
//! - **Auto-detach**: PWM is cut after a configurable hold time, so idle
//!   servos stop buzzing
//! - **Hold policies**: auto-detach, hold forever or release immediately
//! - **Smoothed moves**: optional stepwise interpolation for large moves
//! - **Per-servo workers**: moves on different servos run in parallel, moves
//!   on one servo are serialized and a new move preempts the old one
//! - **Live reconfiguration**: validated, atomically swapped settings
//! - **no_std compatible**: configuration, pulse mapping, motion planning and
//!   the power state machine work without the standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use servo_motion::{RecordingPwm, ServoId, ServoRegistry};
//!
//! // Load configuration from TOML
//! let config = servo_motion::load_config("servos.toml")?;
//!
//! // One PWM output per configured channel
//! let registry = ServoRegistry::from_config(&config, |_channel| Ok(RecordingPwm::new()))?;
//!
//! // Move servo 1 to 45°, then detach after the configured hold time
//! registry.move_servo(ServoId(1), 45.0)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): worker threads, TOML files, shared config, status events
//! - `alloc`: enables heap allocation for no_std with allocator
//! - `defmt`: enables defmt formatting for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod servo;

// Re-exports for ergonomic API
pub use config::{
    validate_config, ChannelConfig, ConfigUpdate, HoldMode, ServoConfig, SystemConfig,
};
pub use error::{Error, ErrorKind, Result};
pub use motion::{angle_to_pulse, plan, MotionPlan, MotionStep, PulseMapper};
pub use servo::{HalPwm, PostMove, PowerState, PowerStateKind, PowerStateMachine, PwmOutput};

// Runtime and configuration files (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config, save_config, SharedConfig};
#[cfg(feature = "std")]
pub use servo::{
    BatchReport, EventCause, MoveTicket, PwmWrite, RecordingPwm, ServoController, ServoRegistry,
    ServoStatus, StatusBus, StatusEvent,
};

// Unit types
pub use config::units::{Degrees, PulseWidth, Seconds, ServoId, UnitExt};

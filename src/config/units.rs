//! Unit types for physical quantities.
//!
//! Provides type-safe representations of angles, durations, pulse widths and
//! servo identifiers to prevent unit confusion at compile time.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Angular position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f32);

impl Degrees {
    /// Lowest commandable servo angle.
    pub const MIN: Self = Self(0.0);
    /// Center position.
    pub const CENTER: Self = Self(90.0);
    /// Highest commandable servo angle.
    pub const MAX: Self = Self(180.0);

    /// Create a new Degrees value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Check if the angle lies within [0, 180]. NaN is never in range.
    #[inline]
    pub fn in_servo_range(self) -> bool {
        self.0 >= Self::MIN.0 && self.0 <= Self::MAX.0
    }

    /// Linear interpolation towards `target`; `t` is clamped to [0, 1].
    #[inline]
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self(self.0 + (target.0 - self.0) * t)
    }
}

impl From<f32> for Degrees {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

impl From<u8> for Degrees {
    fn from(value: u8) -> Self {
        Self(value as f32)
    }
}

impl fmt::Display for Degrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// A duration in seconds, as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seconds(pub f32);

impl Seconds {
    /// Create a new Seconds value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to a [`Duration`], rounded to the nearest microsecond.
    ///
    /// Negative and NaN values map to zero.
    pub fn to_duration(self) -> Duration {
        if self.0.is_nan() || self.0 <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_micros(libm::roundf(self.0 * 1_000_000.0) as u64)
    }
}

/// Width of the high portion of a servo PWM period, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PulseWidth(pub f32);

impl PulseWidth {
    /// Standard hobby servo PWM period (50 Hz).
    pub const SERVO_PERIOD: Seconds = Seconds(0.020);

    /// Create a pulse width from seconds.
    #[inline]
    pub const fn new(seconds: f32) -> Self {
        Self(seconds)
    }

    /// Create a pulse width from microseconds.
    #[inline]
    pub fn from_micros(micros: f32) -> Self {
        Self(micros / 1_000_000.0)
    }

    /// Get the raw value in seconds.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Get the pulse width in microseconds.
    #[inline]
    pub fn as_micros(self) -> f32 {
        self.0 * 1_000_000.0
    }

    /// Duty-cycle register value for a PWM running with `period`.
    ///
    /// Rounds to the nearest count and saturates at `max_duty`.
    pub fn to_duty(self, period: Seconds, max_duty: u16) -> u16 {
        if period.0 <= 0.0 || self.0 <= 0.0 {
            return 0;
        }
        let counts = libm::roundf(self.0 / period.0 * max_duty as f32);
        if counts >= max_duty as f32 {
            max_duty
        } else {
            counts as u16
        }
    }
}

impl fmt::Display for PulseWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}us", self.as_micros())
    }
}

/// Identifier of one servo channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct ServoId(pub u8);

impl ServoId {
    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl From<u8> for ServoId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Degrees.
    fn degrees(self) -> Degrees;
    /// Convert to Seconds.
    fn seconds(self) -> Seconds;
    /// Convert milliseconds to a PulseWidth.
    fn pulse_ms(self) -> PulseWidth;
}

impl UnitExt for f32 {
    #[inline]
    fn degrees(self) -> Degrees {
        Degrees(self)
    }

    #[inline]
    fn seconds(self) -> Seconds {
        Seconds(self)
    }

    #[inline]
    fn pulse_ms(self) -> PulseWidth {
        PulseWidth(self / 1000.0)
    }
}

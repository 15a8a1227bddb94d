//! Angle to pulse-width mapping.

use core::cmp::Ordering;

use crate::config::units::{Degrees, PulseWidth};
use crate::config::ServoConfig;
use crate::error::MotionError;

/// Map a servo angle onto a pulse width by linear interpolation.
///
/// `pulse = min + (angle / 180) * (max - min)`
///
/// # Errors
///
/// Returns [`MotionError::OutOfRange`] if `angle` is outside [0, 180] or if
/// `min >= max`.
pub fn angle_to_pulse(
    angle: Degrees,
    min: PulseWidth,
    max: PulseWidth,
) -> Result<PulseWidth, MotionError> {
    // NaN calibrations compare as unordered and are rejected too
    let ordered = min.0.partial_cmp(&max.0) == Some(Ordering::Less);
    if !angle.in_servo_range() || !ordered {
        return Err(MotionError::OutOfRange {
            angle: angle.0,
            min: min.0,
            max: max.0,
        });
    }

    let fraction = angle.0 / Degrees::MAX.0;
    Ok(PulseWidth(min.0 + fraction * (max.0 - min.0)))
}

/// Calibrated angle-to-pulse mapper for one configuration snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseMapper {
    min: PulseWidth,
    max: PulseWidth,
}

impl PulseMapper {
    /// Create a mapper from explicit calibration bounds.
    pub fn new(min: PulseWidth, max: PulseWidth) -> Result<Self, MotionError> {
        angle_to_pulse(Degrees::MIN, min, max)?;
        Ok(Self { min, max })
    }

    /// Create a mapper from the pulse bounds of `config`.
    pub fn from_config(config: &ServoConfig) -> Result<Self, MotionError> {
        Self::new(config.min_pulse_width, config.max_pulse_width)
    }

    /// Pulse width for `angle`.
    #[inline]
    pub fn pulse_for(&self, angle: Degrees) -> Result<PulseWidth, MotionError> {
        angle_to_pulse(angle, self.min, self.max)
    }

    /// Pulse width commanding 0°.
    #[inline]
    pub fn min(&self) -> PulseWidth {
        self.min
    }

    /// Pulse width commanding 180°.
    #[inline]
    pub fn max(&self) -> PulseWidth {
        self.max
    }
}

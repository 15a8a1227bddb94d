//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::servo::{
    HOLD_TIME_RANGE, MAX_PULSE_WIDTH_RANGE, MIN_PULSE_WIDTH_RANGE, SMOOTH_DELAY_RANGE,
    SMOOTH_STEPS_RANGE,
};
use super::{ServoConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Servo settings are within bounds (see [`validate_servo_config`])
/// - Servo ids and pins are unique
/// - Initial angles are within [0, 180]
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_servo_config(&config.servo)?;

    for (i, channel) in config.channels.iter().enumerate() {
        if !channel.initial_angle.in_servo_range() {
            return Err(Error::Config(ConfigError::InvalidInitialAngle {
                servo: channel.id,
                angle: channel.initial_angle.0,
            }));
        }

        for other in &config.channels[..i] {
            if other.id == channel.id {
                return Err(Error::Config(ConfigError::DuplicateServoId(channel.id)));
            }
            if other.pin == channel.pin {
                return Err(Error::Config(ConfigError::DuplicatePin(channel.pin)));
            }
        }
    }

    Ok(())
}

/// Validate servo settings as a whole.
///
/// Bounds are inclusive; NaN is always rejected.
pub fn validate_servo_config(config: &ServoConfig) -> Result<()> {
    if !within(config.hold_time.0, HOLD_TIME_RANGE) {
        return Err(Error::Config(ConfigError::HoldTimeOutOfRange(config.hold_time.0)));
    }

    if !within(config.min_pulse_width.0, MIN_PULSE_WIDTH_RANGE) {
        return Err(Error::Config(ConfigError::MinPulseWidthOutOfRange(
            config.min_pulse_width.0,
        )));
    }

    if !within(config.max_pulse_width.0, MAX_PULSE_WIDTH_RANGE) {
        return Err(Error::Config(ConfigError::MaxPulseWidthOutOfRange(
            config.max_pulse_width.0,
        )));
    }

    if config.min_pulse_width.0 >= config.max_pulse_width.0 {
        return Err(Error::Config(ConfigError::PulseWidthOrder {
            min: config.min_pulse_width.0,
            max: config.max_pulse_width.0,
        }));
    }

    validate_smoothing(config)
}

/// Validate the smoothing fields only.
pub(crate) fn validate_smoothing(config: &ServoConfig) -> Result<()> {
    let (min_steps, max_steps) = SMOOTH_STEPS_RANGE;
    if config.smooth_steps < min_steps || config.smooth_steps > max_steps {
        return Err(Error::Config(ConfigError::SmoothStepsOutOfRange(
            config.smooth_steps,
        )));
    }

    if !within(config.smooth_delay.0, SMOOTH_DELAY_RANGE) {
        return Err(Error::Config(ConfigError::SmoothDelayOutOfRange(
            config.smooth_delay.0,
        )));
    }

    Ok(())
}

#[inline]
fn within(value: f32, (min, max): (f32, f32)) -> bool {
    value >= min && value <= max
}

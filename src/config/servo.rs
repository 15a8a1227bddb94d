//! Process-wide servo behaviour settings.

use serde::{Deserialize, Serialize};

use super::units::{PulseWidth, Seconds};
use crate::error::Result;

/// Bounds for [`ServoConfig::hold_time`] in seconds.
pub const HOLD_TIME_RANGE: (f32, f32) = (0.1, 10.0);
/// Bounds for [`ServoConfig::min_pulse_width`] in seconds.
pub const MIN_PULSE_WIDTH_RANGE: (f32, f32) = (0.0001, 0.002);
/// Bounds for [`ServoConfig::max_pulse_width`] in seconds.
pub const MAX_PULSE_WIDTH_RANGE: (f32, f32) = (0.002, 0.003);
/// Bounds for [`ServoConfig::smooth_steps`].
pub const SMOOTH_STEPS_RANGE: (u8, u8) = (3, 50);
/// Bounds for [`ServoConfig::smooth_delay`] in seconds.
pub const SMOOTH_DELAY_RANGE: (f32, f32) = (0.01, 0.2);

/// What happens to the PWM signal once a move completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum HoldMode {
    /// Keep the signal for `hold_time`, then detach (if `detach_enabled`).
    #[default]
    Auto,
    /// Keep the signal on indefinitely.
    Hold,
    /// Detach as soon as the move completes.
    Release,
}

/// Servo motion and power settings shared by every channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// Allow auto-detach after `hold_time` in [`HoldMode::Auto`].
    pub detach_enabled: bool,

    /// How long the signal is held after a move before auto-detach.
    pub hold_time: Seconds,

    /// Pulse width commanding 0°.
    pub min_pulse_width: PulseWidth,

    /// Pulse width commanding 180°.
    pub max_pulse_width: PulseWidth,

    /// Post-move power policy.
    pub hold_mode: HoldMode,

    /// Split moves into `smooth_steps` interpolated steps.
    pub smooth_enabled: bool,

    /// Number of interpolated steps per smoothed move.
    pub smooth_steps: u8,

    /// Delay between smoothed steps.
    pub smooth_delay: Seconds,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            detach_enabled: true,
            hold_time: Seconds(1.0),
            min_pulse_width: PulseWidth(0.0005),
            max_pulse_width: PulseWidth(0.0025),
            hold_mode: HoldMode::Auto,
            smooth_enabled: false,
            smooth_steps: 10,
            smooth_delay: Seconds(0.02),
        }
    }
}

impl ServoConfig {
    /// Validate every bound at once.
    pub fn validate(&self) -> Result<()> {
        super::validation::validate_servo_config(self)
    }

    /// Merge `update` over a copy of this config and validate the result.
    ///
    /// `self` is never modified; on error nothing is applied.
    pub fn merged(&self, update: &ConfigUpdate) -> Result<Self> {
        let mut next = self.clone();
        update.apply_to(&mut next);
        next.validate()?;
        Ok(next)
    }
}

/// A partial configuration change. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigUpdate {
    /// See [`ServoConfig::detach_enabled`].
    pub detach_enabled: Option<bool>,
    /// See [`ServoConfig::hold_time`].
    pub hold_time: Option<Seconds>,
    /// See [`ServoConfig::min_pulse_width`].
    pub min_pulse_width: Option<PulseWidth>,
    /// See [`ServoConfig::max_pulse_width`].
    pub max_pulse_width: Option<PulseWidth>,
    /// See [`ServoConfig::hold_mode`].
    pub hold_mode: Option<HoldMode>,
    /// See [`ServoConfig::smooth_enabled`].
    pub smooth_enabled: Option<bool>,
    /// See [`ServoConfig::smooth_steps`].
    pub smooth_steps: Option<u8>,
    /// See [`ServoConfig::smooth_delay`].
    pub smooth_delay: Option<Seconds>,
}

impl ConfigUpdate {
    /// Check whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to(&self, config: &mut ServoConfig) {
        if let Some(v) = self.detach_enabled {
            config.detach_enabled = v;
        }
        if let Some(v) = self.hold_time {
            config.hold_time = v;
        }
        if let Some(v) = self.min_pulse_width {
            config.min_pulse_width = v;
        }
        if let Some(v) = self.max_pulse_width {
            config.max_pulse_width = v;
        }
        if let Some(v) = self.hold_mode {
            config.hold_mode = v;
        }
        if let Some(v) = self.smooth_enabled {
            config.smooth_enabled = v;
        }
        if let Some(v) = self.smooth_steps {
            config.smooth_steps = v;
        }
        if let Some(v) = self.smooth_delay {
            config.smooth_delay = v;
        }
    }
}

//! Motion profiling.
//!
//! Turns one move request into a lazy sequence of intermediate angles. With
//! smoothing disabled the servo jumps straight to the target; with smoothing
//! enabled the move is split into `smooth_steps` evenly spaced steps separated
//! by `smooth_delay`, which keeps current spikes and overshoot down on large
//! moves.

use core::iter::FusedIterator;
use core::time::Duration;

use crate::config::units::Degrees;
use crate::config::{validate_smoothing, ServoConfig};
use crate::error::Result;

/// One position to write, followed by a wait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStep {
    /// Angle to command.
    pub angle: Degrees,
    /// How long to wait after writing this step before the next one.
    pub hold_duration: Duration,
}

/// Plan a move from `start` to `target` under `config`.
///
/// # Errors
///
/// Returns `ConfigError::SmoothStepsOutOfRange` or
/// `ConfigError::SmoothDelayOutOfRange` if the smoothing settings are out of
/// bounds.
pub fn plan(start: Degrees, target: Degrees, config: &ServoConfig) -> Result<MotionPlan> {
    validate_smoothing(config)?;

    if !config.smooth_enabled || start == target {
        return Ok(MotionPlan::immediate(target));
    }

    Ok(MotionPlan::smoothed(
        start,
        target,
        config.smooth_steps,
        config.smooth_delay.to_duration(),
    ))
}

/// A single-use cursor over the steps of one move.
///
/// Steps are computed on demand; nothing is allocated.
#[derive(Debug, Clone)]
pub struct MotionPlan {
    start: Degrees,
    target: Degrees,
    total: u8,
    emitted: u8,
    delay: Duration,
}

impl MotionPlan {
    /// A one-step plan jumping straight to `target`.
    pub fn immediate(target: Degrees) -> Self {
        Self {
            start: target,
            target,
            total: 1,
            emitted: 0,
            delay: Duration::ZERO,
        }
    }

    /// An evenly interpolated plan of `steps` steps ending exactly at `target`.
    ///
    /// Every step but the last is followed by `delay`. A step count of zero is
    /// treated as one.
    pub fn smoothed(start: Degrees, target: Degrees, steps: u8, delay: Duration) -> Self {
        Self {
            start,
            target,
            total: steps.max(1),
            emitted: 0,
            delay,
        }
    }

    /// Final angle of the plan.
    #[inline]
    pub fn target(&self) -> Degrees {
        self.target
    }

    /// Angle the plan started from.
    #[inline]
    pub fn start(&self) -> Degrees {
        self.start
    }

    /// Total number of steps.
    #[inline]
    pub fn total_steps(&self) -> usize {
        self.total as usize
    }

    /// Steps not yet emitted.
    #[inline]
    pub fn steps_remaining(&self) -> usize {
        (self.total - self.emitted) as usize
    }

    /// Check if every step has been emitted.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.emitted >= self.total
    }

    /// Progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        self.emitted as f32 / self.total as f32
    }

    /// Sum of the waits between steps.
    pub fn total_delay(&self) -> Duration {
        self.delay * u32::from(self.total - 1)
    }
}

impl Iterator for MotionPlan {
    type Item = MotionStep;

    fn next(&mut self) -> Option<MotionStep> {
        if self.is_complete() {
            return None;
        }

        self.emitted += 1;

        if self.emitted == self.total {
            // Land exactly on the target, no trailing wait
            return Some(MotionStep {
                angle: self.target,
                hold_duration: Duration::ZERO,
            });
        }

        let t = self.emitted as f32 / self.total as f32;
        Some(MotionStep {
            angle: self.start.lerp(self.target, t),
            hold_duration: self.delay,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps_remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for MotionPlan {}

impl FusedIterator for MotionPlan {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::Seconds;
    use crate::error::{ConfigError, Error};

    fn smoothing(steps: u8, delay: f32) -> ServoConfig {
        ServoConfig {
            smooth_enabled: true,
            smooth_steps: steps,
            smooth_delay: Seconds(delay),
            ..Default::default()
        }
    }

    #[test]
    fn test_immediate_when_smoothing_disabled() {
        let mut plan = plan(Degrees(0.0), Degrees(180.0), &ServoConfig::default()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(
            plan.next(),
            Some(MotionStep {
                angle: Degrees(180.0),
                hold_duration: Duration::ZERO,
            })
        );
        assert_eq!(plan.next(), None);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_smoothed_steps() {
        let config = smoothing(4, 0.05);
        let steps: heapless::Vec<MotionStep, 8> =
            plan(Degrees(0.0), Degrees(100.0), &config).unwrap().collect();

        assert_eq!(steps.len(), 4);
        let angles = [25.0, 50.0, 75.0, 100.0];
        for (step, expected) in steps.iter().zip(angles) {
            assert!((step.angle.value() - expected).abs() < 1e-3);
        }
        assert_eq!(steps[0].hold_duration, Duration::from_millis(50));
        assert_eq!(steps[3].hold_duration, Duration::ZERO);
        assert_eq!(steps[3].angle, Degrees(100.0));
    }

    #[test]
    fn test_smoothed_downwards() {
        let config = smoothing(5, 0.01);
        let last = plan(Degrees(150.0), Degrees(50.0), &config)
            .unwrap()
            .inspect(|s| assert!(s.angle.value() <= 150.0 && s.angle.value() >= 50.0))
            .last()
            .unwrap();
        assert_eq!(last.angle, Degrees(50.0));
    }

    #[test]
    fn test_no_op_move_is_single_step() {
        let config = smoothing(20, 0.1);
        let plan = plan(Degrees(90.0), Degrees(90.0), &config).unwrap();
        assert_eq!(plan.total_steps(), 1);
        assert_eq!(plan.total_delay(), Duration::ZERO);
    }

    #[test]
    fn test_progress_tracking() {
        let mut plan = plan(Degrees(0.0), Degrees(90.0), &smoothing(3, 0.02)).unwrap();
        assert_eq!(plan.start(), Degrees(0.0));
        assert_eq!(plan.target(), Degrees(90.0));
        assert_eq!(plan.steps_remaining(), 3);
        assert_eq!(plan.total_delay(), Duration::from_millis(40));
        plan.next();
        assert_eq!(plan.steps_remaining(), 2);
        assert!((plan.progress() - 1.0 / 3.0).abs() < 1e-6);
        plan.by_ref().for_each(drop);
        assert!((plan.progress() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_smoothing() {
        let result = plan(Degrees(0.0), Degrees(90.0), &smoothing(2, 0.05));
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::SmoothStepsOutOfRange(2)))
        ));

        let result = plan(Degrees(0.0), Degrees(90.0), &smoothing(10, 0.5));
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::SmoothDelayOutOfRange(_)))
        ));
    }
}

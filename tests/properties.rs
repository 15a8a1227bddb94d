//! Property tests for pulse mapping, motion planning, configuration merging
//! and the power state machine.

use std::time::Duration;

use proptest::prelude::*;

use servo_motion::config::units::{Degrees, PulseWidth, Seconds};
use servo_motion::config::{ConfigUpdate, HoldMode, ServoConfig};
use servo_motion::motion::{angle_to_pulse, plan};
use servo_motion::servo::{PostMove, PowerState, PowerStateMachine, PwmOutput};

struct NullOutput;

impl PwmOutput for NullOutput {
    type Error = ();

    fn set_pulse(&mut self, _pulse: PulseWidth) -> Result<(), ()> {
        Ok(())
    }

    fn disable(&mut self) -> Result<(), ()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Move(u64, PostMove),
    Hold,
    Release,
    Poll(u64),
}

fn hold_mode() -> impl Strategy<Value = HoldMode> {
    prop_oneof![
        Just(HoldMode::Auto),
        Just(HoldMode::Hold),
        Just(HoldMode::Release)
    ]
}

fn post_move() -> impl Strategy<Value = PostMove> {
    prop_oneof![
        Just(PostMove::StayAttached),
        (1u64..2000).prop_map(|ms| PostMove::DetachAfter(Duration::from_millis(ms))),
        Just(PostMove::DetachNow),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..500, post_move()).prop_map(|(dt, p)| Op::Move(dt, p)),
        Just(Op::Hold),
        Just(Op::Release),
        (0u64..3000).prop_map(Op::Poll),
    ]
}

proptest! {
    #[test]
    fn pulse_stays_within_calibration(angle in 0.0f32..=180.0) {
        let min = PulseWidth(0.0005);
        let max = PulseWidth(0.0025);
        let pulse = angle_to_pulse(Degrees(angle), min, max).unwrap();
        prop_assert!(pulse.0 >= min.0 - 1e-9);
        prop_assert!(pulse.0 <= max.0 + 1e-9);
    }

    #[test]
    fn pulse_is_monotonic(a in 0.0f32..=180.0, b in 0.0f32..=180.0) {
        let min = PulseWidth(0.0005);
        let max = PulseWidth(0.0025);
        let pa = angle_to_pulse(Degrees(a), min, max).unwrap();
        let pb = angle_to_pulse(Degrees(b), min, max).unwrap();
        if a < b {
            prop_assert!(pa.0 <= pb.0);
        }
    }

    #[test]
    fn out_of_range_angles_rejected(angle in prop_oneof![-1000.0f32..-0.001, 180.001f32..1000.0]) {
        let result = angle_to_pulse(Degrees(angle), PulseWidth(0.0005), PulseWidth(0.0025));
        prop_assert!(result.is_err());
    }

    #[test]
    fn plan_ends_exactly_on_target(
        start in 0.0f32..=180.0,
        target in 0.0f32..=180.0,
        smooth in any::<bool>(),
        steps in 3u8..=50,
    ) {
        let config = ServoConfig {
            smooth_enabled: smooth,
            smooth_steps: steps,
            smooth_delay: Seconds(0.01),
            ..Default::default()
        };
        let steps_taken: Vec<_> = plan(Degrees(start), Degrees(target), &config).unwrap().collect();

        let last = steps_taken.last().unwrap();
        prop_assert_eq!(last.angle, Degrees(target));
        prop_assert_eq!(last.hold_duration, Duration::ZERO);

        let expected = if smooth && start != target { steps as usize } else { 1 };
        prop_assert_eq!(steps_taken.len(), expected);

        let (lo, hi) = if start < target { (start, target) } else { (target, start) };
        for step in &steps_taken {
            prop_assert!(step.angle.0 >= lo - 1e-3 && step.angle.0 <= hi + 1e-3);
        }
    }

    #[test]
    fn merged_config_is_valid_or_unchanged(
        hold_time in 0.0f32..12.0,
        smooth_steps in 0u8..60,
        smooth_delay in 0.0f32..0.3,
        mode in hold_mode(),
    ) {
        let current = ServoConfig::default();
        let update = ConfigUpdate {
            hold_time: Some(Seconds(hold_time)),
            smooth_steps: Some(smooth_steps),
            smooth_delay: Some(Seconds(smooth_delay)),
            hold_mode: Some(mode),
            ..Default::default()
        };

        match current.merged(&update) {
            Ok(next) => {
                prop_assert!(next.validate().is_ok());
                prop_assert_eq!(next.hold_mode, mode);
            }
            Err(_) => prop_assert_eq!(current, ServoConfig::default()),
        }
    }

    #[test]
    fn power_machine_invariants(ops in proptest::collection::vec(op(), 1..40)) {
        let mut psm = PowerStateMachine::<Duration>::new();
        let mut out = NullOutput;
        let mut now = Duration::ZERO;

        for op in ops {
            match op {
                Op::Move(dt, policy) => {
                    now += Duration::from_millis(dt);
                    psm.begin_move();
                    prop_assert!(psm.is_powered());
                    psm.complete_move(now, policy, &mut out).unwrap();
                }
                Op::Hold => {
                    psm.hold(PulseWidth(0.0015), &mut out).unwrap();
                    prop_assert_eq!(psm.state(), PowerState::Attached);
                }
                Op::Release => {
                    psm.release(&mut out).unwrap();
                    prop_assert_eq!(psm.state(), PowerState::Detached);
                }
                Op::Poll(dt) => {
                    now += Duration::from_millis(dt);
                    let deadline = psm.deadline();
                    psm.poll(now, &mut out).unwrap();
                    if let Some(deadline) = deadline {
                        prop_assert_eq!(now >= deadline, !psm.is_powered());
                    }
                }
            }

            // A deadline only exists while a detach is pending
            let pending = matches!(psm.state(), PowerState::PendingDetach { .. });
            prop_assert_eq!(psm.deadline().is_some(), pending);
        }
    }
}

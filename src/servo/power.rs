//! Servo power state machine.
//!
//! Tracks whether the PWM signal of one servo is live and when it should be
//! cut. The signal is cut (detached) whenever the servo does not need to
//! actively hold position, which is what eliminates idle jitter.
//!
//! ```text
//!            begin_move / hold
//! Detached ──────────────────────► Attached ◄─────────┐
//!    ▲                               │  │             │ begin_move / hold
//!    │  release / Release policy     │  │ Auto policy │
//!    └───────────────────────────────┘  ▼             │
//!    ▲                          PendingDetach(deadline)
//!    └──────── poll(now >= deadline) ────┘
//! ```
//!
//! The deadline lives inside the `PendingDetach` variant, so leaving that
//! state discards it and a superseded deadline can never fire.

use core::ops::Add;
use core::time::Duration;

use serde::Serialize;

use crate::config::units::PulseWidth;
use crate::config::{HoldMode, ServoConfig};

use super::output::PwmOutput;

/// Power state of one servo output, generic over the clock's instant type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState<I> {
    /// No signal.
    Detached,
    /// Signal live, no detach scheduled.
    Attached,
    /// Signal live until `deadline`.
    PendingDetach {
        /// Instant at which the output is disabled.
        deadline: I,
    },
}

impl<I> PowerState<I> {
    /// Variant without its payload.
    pub fn kind(&self) -> PowerStateKind {
        match self {
            PowerState::Detached => PowerStateKind::Detached,
            PowerState::Attached => PowerStateKind::Attached,
            PowerState::PendingDetach { .. } => PowerStateKind::PendingDetach,
        }
    }

    /// Check if the signal is live.
    #[inline]
    pub fn is_powered(&self) -> bool {
        !matches!(self, PowerState::Detached)
    }
}

/// Power state as reported to status consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum PowerStateKind {
    /// No signal.
    Detached,
    /// Signal live.
    Attached,
    /// Signal live, detach scheduled.
    PendingDetach,
}

/// Transition applied when a move completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostMove {
    /// Keep the signal on.
    StayAttached,
    /// Keep the signal on for the given time, then detach.
    DetachAfter(Duration),
    /// Detach right away.
    DetachNow,
}

impl PostMove {
    /// Post-move policy table.
    ///
    /// | hold_mode | detach_enabled | result          |
    /// |-----------|----------------|-----------------|
    /// | Auto      | true           | DetachAfter     |
    /// | Auto      | false          | StayAttached    |
    /// | Hold      | any            | StayAttached    |
    /// | Release   | any            | DetachNow       |
    pub fn resolve(mode: HoldMode, detach_enabled: bool, hold_time: Duration) -> Self {
        match (mode, detach_enabled) {
            (HoldMode::Auto, true) => PostMove::DetachAfter(hold_time),
            (HoldMode::Auto, false) => PostMove::StayAttached,
            (HoldMode::Hold, _) => PostMove::StayAttached,
            (HoldMode::Release, _) => PostMove::DetachNow,
        }
    }

    /// Policy for a configuration snapshot.
    pub fn from_config(config: &ServoConfig) -> Self {
        Self::resolve(
            config.hold_mode,
            config.detach_enabled,
            config.hold_time.to_duration(),
        )
    }
}

/// Attach/detach lifecycle of one servo.
///
/// Methods that cut the signal take the output so the state only changes once
/// the hardware has accepted the command. Methods return the new
/// [`PowerStateKind`] when the kind changed.
#[derive(Debug, Clone)]
pub struct PowerStateMachine<I> {
    state: PowerState<I>,
    manual_hold: bool,
}

impl<I> Default for PowerStateMachine<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I> PowerStateMachine<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create a machine in the `Detached` state.
    pub const fn new() -> Self {
        Self {
            state: PowerState::Detached,
            manual_hold: false,
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> PowerState<I> {
        self.state
    }

    /// Current state without deadline.
    #[inline]
    pub fn kind(&self) -> PowerStateKind {
        self.state.kind()
    }

    /// Check if the signal is live.
    #[inline]
    pub fn is_powered(&self) -> bool {
        self.state.is_powered()
    }

    /// Pending detach deadline, if any.
    #[inline]
    pub fn deadline(&self) -> Option<I> {
        match self.state {
            PowerState::PendingDetach { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Check if a manual hold overrides the post-move policy.
    #[inline]
    pub fn has_manual_hold(&self) -> bool {
        self.manual_hold
    }

    /// A move is about to write its first step.
    ///
    /// Cancels any pending detach and clears a manual hold, so the move's
    /// own policy applies when it completes.
    pub fn begin_move(&mut self) -> Option<PowerStateKind> {
        self.manual_hold = false;
        self.enter(PowerState::Attached)
    }

    /// The last step of a move has been written at `now`.
    ///
    /// A manual hold issued during the move wins over `policy`.
    pub fn complete_move<O: PwmOutput>(
        &mut self,
        now: I,
        policy: PostMove,
        output: &mut O,
    ) -> Result<Option<PowerStateKind>, O::Error> {
        if self.manual_hold {
            return Ok(self.enter(PowerState::Attached));
        }

        match policy {
            PostMove::StayAttached => Ok(self.enter(PowerState::Attached)),
            PostMove::DetachAfter(hold) => Ok(self.enter(PowerState::PendingDetach {
                deadline: now + hold,
            })),
            PostMove::DetachNow => self.detach(output),
        }
    }

    /// Detach if a pending deadline has been reached.
    ///
    /// If the output refuses to disable, the deadline is dropped and the
    /// servo stays `Attached`.
    pub fn poll<O: PwmOutput>(
        &mut self,
        now: I,
        output: &mut O,
    ) -> Result<Option<PowerStateKind>, O::Error> {
        match self.state {
            PowerState::PendingDetach { deadline } if now >= deadline => self.detach(output),
            _ => Ok(None),
        }
    }

    /// Force the signal on at `pulse` and keep it on until the next move.
    ///
    /// The pulse is only written when coming from `Detached`; a live signal
    /// already carries the current position.
    pub fn hold<O: PwmOutput>(
        &mut self,
        pulse: PulseWidth,
        output: &mut O,
    ) -> Result<Option<PowerStateKind>, O::Error> {
        if !self.is_powered() {
            output.set_pulse(pulse)?;
        }
        self.manual_hold = true;
        Ok(self.enter(PowerState::Attached))
    }

    /// Force the signal off now, whatever the current state.
    pub fn release<O: PwmOutput>(
        &mut self,
        output: &mut O,
    ) -> Result<Option<PowerStateKind>, O::Error> {
        self.manual_hold = false;
        if let Err(e) = output.disable() {
            self.abandon_deadline();
            return Err(e);
        }
        Ok(self.enter(PowerState::Detached))
    }

    fn detach<O: PwmOutput>(&mut self, output: &mut O) -> Result<Option<PowerStateKind>, O::Error> {
        if self.is_powered() {
            if let Err(e) = output.disable() {
                self.abandon_deadline();
                return Err(e);
            }
        }
        Ok(self.enter(PowerState::Detached))
    }

    fn abandon_deadline(&mut self) {
        if let PowerState::PendingDetach { .. } = self.state {
            self.state = PowerState::Attached;
        }
    }

    fn enter(&mut self, next: PowerState<I>) -> Option<PowerStateKind> {
        let changed = self.state.kind() != next.kind();
        self.state = next;
        changed.then(|| next.kind())
    }
}

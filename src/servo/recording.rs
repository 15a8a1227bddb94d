//! In-memory PWM output (std only).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::units::PulseWidth;

use super::output::PwmOutput;

/// One command received by a [`RecordingPwm`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PwmWrite {
    /// `set_pulse` with this width.
    Pulse(PulseWidth),
    /// `disable`.
    Disable,
}

/// Error returned by a [`RecordingPwm`] once a fault has been injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedFault;

impl fmt::Display for InjectedFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected PWM fault")
    }
}

impl std::error::Error for InjectedFault {}

#[derive(Debug, Default)]
struct Recording {
    writes: Vec<PwmWrite>,
    accepted: usize,
    fail_after: Option<usize>,
}

/// PWM output that records every command instead of driving hardware.
///
/// Clones share the same log, so a test or a console can keep one handle
/// while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingPwm {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingPwm {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every accepted command, oldest first.
    pub fn writes(&self) -> Vec<PwmWrite> {
        self.inner.lock().writes.clone()
    }

    /// Accepted pulse widths, oldest first.
    pub fn pulses(&self) -> Vec<PulseWidth> {
        self.inner
            .lock()
            .writes
            .iter()
            .filter_map(|w| match w {
                PwmWrite::Pulse(p) => Some(*p),
                PwmWrite::Disable => None,
            })
            .collect()
    }

    /// Most recent accepted command.
    pub fn last(&self) -> Option<PwmWrite> {
        self.inner.lock().writes.last().copied()
    }

    /// Number of accepted `disable` calls.
    pub fn disable_count(&self) -> usize {
        self.inner
            .lock()
            .writes
            .iter()
            .filter(|w| matches!(w, PwmWrite::Disable))
            .count()
    }

    /// Forget recorded commands.
    pub fn clear(&self) {
        self.inner.lock().writes.clear();
    }

    /// Accept `n` more commands, then fail every command after that.
    pub fn fail_after(&self, n: usize) {
        let mut rec = self.inner.lock();
        rec.fail_after = Some(rec.accepted + n);
    }

    /// Stop injecting faults.
    pub fn heal(&self) {
        self.inner.lock().fail_after = None;
    }

    fn record(&self, write: PwmWrite) -> Result<(), InjectedFault> {
        let mut rec = self.inner.lock();
        if rec.fail_after.is_some_and(|limit| rec.accepted >= limit) {
            tracing::trace!(?write, "rejecting PWM command");
            return Err(InjectedFault);
        }
        rec.accepted += 1;
        rec.writes.push(write);
        tracing::trace!(?write, "PWM command");
        Ok(())
    }
}

impl PwmOutput for RecordingPwm {
    type Error = InjectedFault;

    fn set_pulse(&mut self, pulse: PulseWidth) -> Result<(), InjectedFault> {
        self.record(PwmWrite::Pulse(pulse))
    }

    fn disable(&mut self) -> Result<(), InjectedFault> {
        self.record(PwmWrite::Disable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let log = RecordingPwm::new();
        let mut out = log.clone();

        out.set_pulse(PulseWidth(0.0015)).unwrap();
        out.disable().unwrap();

        assert_eq!(
            log.writes(),
            vec![PwmWrite::Pulse(PulseWidth(0.0015)), PwmWrite::Disable]
        );
        assert_eq!(log.pulses(), vec![PulseWidth(0.0015)]);
        assert_eq!(log.disable_count(), 1);
        assert_eq!(log.last(), Some(PwmWrite::Disable));
    }

    #[test]
    fn test_fault_injection() {
        let log = RecordingPwm::new();
        let mut out = log.clone();

        log.fail_after(1);
        assert!(out.set_pulse(PulseWidth(0.001)).is_ok());
        assert_eq!(out.set_pulse(PulseWidth(0.002)), Err(InjectedFault));
        assert_eq!(out.disable(), Err(InjectedFault));
        assert_eq!(log.writes().len(), 1);

        log.heal();
        assert!(out.disable().is_ok());
    }
}

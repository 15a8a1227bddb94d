//! PWM output boundary.
//!
//! The controller only needs two primitives from the hardware: set a pulse
//! width, and stop the signal entirely. Stopping the signal is what removes
//! holding jitter, so `disable` must leave the line low rather than parked at
//! some pulse width.

use embedded_hal::pwm::SetDutyCycle;

use crate::config::units::{PulseWidth, Seconds};

/// A single servo PWM channel.
pub trait PwmOutput {
    /// Driver error type.
    type Error: core::fmt::Debug;

    /// Start or update the signal with `pulse` high time per period.
    fn set_pulse(&mut self, pulse: PulseWidth) -> Result<(), Self::Error>;

    /// Stop the signal (output held low).
    fn disable(&mut self) -> Result<(), Self::Error>;
}

impl<T: PwmOutput + ?Sized> PwmOutput for &mut T {
    type Error = T::Error;

    #[inline]
    fn set_pulse(&mut self, pulse: PulseWidth) -> Result<(), Self::Error> {
        (**self).set_pulse(pulse)
    }

    #[inline]
    fn disable(&mut self) -> Result<(), Self::Error> {
        (**self).disable()
    }
}

#[cfg(feature = "std")]
impl<T: PwmOutput + ?Sized> PwmOutput for Box<T> {
    type Error = T::Error;

    #[inline]
    fn set_pulse(&mut self, pulse: PulseWidth) -> Result<(), Self::Error> {
        (**self).set_pulse(pulse)
    }

    #[inline]
    fn disable(&mut self) -> Result<(), Self::Error> {
        (**self).disable()
    }
}

/// [`PwmOutput`] over any embedded-hal 1.0 [`SetDutyCycle`] channel.
///
/// The channel must already be configured for the servo frame rate; `period`
/// tells the adapter what that rate is so pulse widths can be turned into
/// duty-cycle counts.
#[derive(Debug)]
pub struct HalPwm<P> {
    pwm: P,
    period: Seconds,
}

impl<P: SetDutyCycle> HalPwm<P> {
    /// Wrap a channel running at the standard 50 Hz servo rate.
    pub fn new(pwm: P) -> Self {
        Self::with_period(pwm, PulseWidth::SERVO_PERIOD)
    }

    /// Wrap a channel running with a custom period.
    pub fn with_period(pwm: P, period: Seconds) -> Self {
        Self { pwm, period }
    }

    /// PWM period assumed by the adapter.
    #[inline]
    pub fn period(&self) -> Seconds {
        self.period
    }

    /// Release the underlying channel.
    pub fn into_inner(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> PwmOutput for HalPwm<P> {
    type Error = P::Error;

    fn set_pulse(&mut self, pulse: PulseWidth) -> Result<(), Self::Error> {
        let duty = pulse.to_duty(self.period, self.pwm.max_duty_cycle());
        self.pwm.set_duty_cycle(duty)
    }

    fn disable(&mut self) -> Result<(), Self::Error> {
        self.pwm.set_duty_cycle_fully_off()
    }
}

//! Servo control.
//!
//! - [`output`]: the PWM boundary and an embedded-hal 1.0 adapter
//! - [`power`]: attach/detach state machine and post-move policy
//! - controller, registry and status (std): one worker thread per servo,
//!   driven through a [`ServoRegistry`]

pub mod output;
pub mod power;

#[cfg(feature = "std")]
mod controller;
#[cfg(feature = "std")]
mod recording;
#[cfg(feature = "std")]
mod registry;
#[cfg(feature = "std")]
mod status;

pub use output::{HalPwm, PwmOutput};
pub use power::{PostMove, PowerState, PowerStateKind, PowerStateMachine};

#[cfg(feature = "std")]
pub use controller::{MoveTicket, ServoController};
#[cfg(feature = "std")]
pub use recording::{InjectedFault, PwmWrite, RecordingPwm};
#[cfg(feature = "std")]
pub use registry::{BatchReport, ServoRegistry};
#[cfg(feature = "std")]
pub use status::{EventCause, ServoStatus, StatusBus, StatusEvent};

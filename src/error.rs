//! Error types for servo-motion library.
//!
//! Provides unified error handling across configuration, motion planning and
//! servo control.

use core::fmt;

use crate::config::units::ServoId;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all servo-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Angle or pulse mapping error
    Motion(MotionError),
    /// Servo control error
    Servo(ServoError),
}

/// Coarse error classification, as seen by the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Angle outside [0, 180] or not mappable to a pulse.
    InvalidAngle,
    /// A configuration bound was violated.
    InvalidConfig,
    /// No servo with the requested id.
    UnknownServoId,
    /// The PWM driver reported a fault.
    HardwareWriteFailure,
    /// The move was superseded by a newer command.
    Preempted,
    /// The servo worker is no longer running.
    Unavailable,
    /// The servo failed to initialize and accepts no commands.
    Inactive,
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Hold time outside 0.1 s - 10.0 s
    HoldTimeOutOfRange(f32),
    /// Minimum pulse width outside 0.1 ms - 2.0 ms
    MinPulseWidthOutOfRange(f32),
    /// Maximum pulse width outside 2.0 ms - 3.0 ms
    MaxPulseWidthOutOfRange(f32),
    /// Minimum pulse width must be strictly below the maximum
    PulseWidthOrder {
        /// Minimum pulse width in seconds
        min: f32,
        /// Maximum pulse width in seconds
        max: f32,
    },
    /// Smoothing step count outside 3 - 50
    SmoothStepsOutOfRange(u8),
    /// Smoothing delay outside 0.01 s - 0.2 s
    SmoothDelayOutOfRange(f32),
    /// Two channels share a servo id
    DuplicateServoId(ServoId),
    /// Two channels share an output pin
    DuplicatePin(u8),
    /// Channel start angle outside [0, 180]
    InvalidInitialAngle {
        /// Servo id of the offending channel
        servo: ServoId,
        /// Configured start angle
        angle: f32,
    },
    /// More channels than the registry supports
    TooManyChannels,
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Angle and pulse mapping errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Requested angle outside [0, 180]
    InvalidAngle(f32),
    /// Angle or calibration cannot be mapped to a pulse width
    OutOfRange {
        /// Angle in degrees
        angle: f32,
        /// Minimum pulse width in seconds
        min: f32,
        /// Maximum pulse width in seconds
        max: f32,
    },
}

/// Servo control errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ServoError {
    /// No servo registered under this id
    UnknownServoId(ServoId),
    /// PWM output failed to set a pulse or disable
    HardwareWriteFailure(ServoId),
    /// Move was superseded before reaching its target
    Preempted {
        /// Servo id
        servo: ServoId,
        /// Target of the abandoned move
        target: f32,
    },
    /// Worker thread stopped or could not be started
    WorkerUnavailable(ServoId),
    /// PWM output could not be opened at startup
    Inactive(ServoId),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::InvalidConfig,
            // An in-range angle can only fail to map on a bad calibration
            Error::Motion(MotionError::OutOfRange { angle, .. })
                if (0.0..=180.0).contains(angle) =>
            {
                ErrorKind::InvalidConfig
            }
            Error::Motion(_) => ErrorKind::InvalidAngle,
            Error::Servo(ServoError::UnknownServoId(_)) => ErrorKind::UnknownServoId,
            Error::Servo(ServoError::HardwareWriteFailure(_)) => ErrorKind::HardwareWriteFailure,
            Error::Servo(ServoError::Preempted { .. }) => ErrorKind::Preempted,
            Error::Servo(ServoError::WorkerUnavailable(_)) => ErrorKind::Unavailable,
            Error::Servo(ServoError::Inactive(_)) => ErrorKind::Inactive,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
            Error::Servo(e) => write!(f, "Servo error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::HoldTimeOutOfRange(v) => {
                write!(f, "Invalid hold time: {}s. Must be 0.1-10.0", v)
            }
            ConfigError::MinPulseWidthOutOfRange(v) => {
                write!(f, "Invalid min pulse width: {}s. Must be 0.0001-0.002", v)
            }
            ConfigError::MaxPulseWidthOutOfRange(v) => {
                write!(f, "Invalid max pulse width: {}s. Must be 0.002-0.003", v)
            }
            ConfigError::PulseWidthOrder { min, max } => {
                write!(f, "Invalid pulse widths: min ({}) must be < max ({})", min, max)
            }
            ConfigError::SmoothStepsOutOfRange(v) => {
                write!(f, "Invalid smooth steps: {}. Must be 3-50", v)
            }
            ConfigError::SmoothDelayOutOfRange(v) => {
                write!(f, "Invalid smooth delay: {}s. Must be 0.01-0.2", v)
            }
            ConfigError::DuplicateServoId(id) => write!(f, "Duplicate servo id: {}", id),
            ConfigError::DuplicatePin(pin) => write!(f, "Duplicate output pin: {}", pin),
            ConfigError::InvalidInitialAngle { servo, angle } => {
                write!(f, "Servo {} initial angle {} outside 0-180", servo, angle)
            }
            ConfigError::TooManyChannels => write!(f, "Too many channels (max 16)"),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidAngle(angle) => {
                write!(f, "Angle {} outside 0-180 degrees", angle)
            }
            MotionError::OutOfRange { angle, min, max } => {
                write!(f, "Cannot map angle {} onto pulse range [{}, {}]", angle, min, max)
            }
        }
    }
}

impl fmt::Display for ServoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServoError::UnknownServoId(id) => write!(f, "Servo {} not found", id),
            ServoError::HardwareWriteFailure(id) => {
                write!(f, "PWM write failed on servo {}", id)
            }
            ServoError::Preempted { servo, target } => {
                write!(f, "Move of servo {} to {} superseded", servo, target)
            }
            ServoError::WorkerUnavailable(id) => write!(f, "Servo {} worker not running", id),
            ServoError::Inactive(id) => write!(f, "Servo {} is inactive", id),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

impl From<ServoError> for Error {
    fn from(e: ServoError) -> Self {
        Error::Servo(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}

#[cfg(feature = "std")]
impl std::error::Error for ServoError {}

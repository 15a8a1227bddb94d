//! Per-channel servo wiring.

use heapless::String;
use serde::{Deserialize, Serialize};

use super::units::{Degrees, ServoId};

/// One physical servo channel from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Servo id used by the control API.
    pub id: ServoId,

    /// GPIO / PWM channel number driving the servo.
    pub pin: u8,

    /// Human-readable label (max 32 chars).
    #[serde(default)]
    pub name: String<32>,

    /// Angle assumed at startup, before the first move is written.
    #[serde(default = "default_initial_angle")]
    pub initial_angle: Degrees,
}

fn default_initial_angle() -> Degrees {
    Degrees::CENTER
}

impl ChannelConfig {
    /// Create a channel with an empty name, starting at center.
    pub fn new(id: impl Into<ServoId>, pin: u8) -> Self {
        Self {
            id: id.into(),
            pin,
            name: String::new(),
            initial_angle: Degrees::CENTER,
        }
    }

    /// Set the label. Names longer than 32 chars are truncated.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name.clear();
        for c in name.chars() {
            if self.name.push(c).is_err() {
                break;
            }
        }
        self
    }

    /// Set the startup angle.
    pub fn with_initial_angle(mut self, angle: impl Into<Degrees>) -> Self {
        self.initial_angle = angle.into();
        self
    }
}

//! System configuration - root configuration structure.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use super::channel::ChannelConfig;
use super::servo::ServoConfig;
use super::units::ServoId;

/// Maximum number of servo channels in one system.
pub const MAX_CHANNELS: usize = 16;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Shared motion and power settings.
    #[serde(default)]
    pub servo: ServoConfig,

    /// Physical servo channels.
    #[serde(default)]
    pub channels: Vec<ChannelConfig, MAX_CHANNELS>,
}

impl SystemConfig {
    /// Get a channel configuration by servo id.
    pub fn channel(&self, id: ServoId) -> Option<&ChannelConfig> {
        self.channels.iter().find(|c| c.id == id)
    }
}

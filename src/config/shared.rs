//! Shared, atomically swapped configuration snapshot (std only).

use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::error::Result;

use super::{ConfigUpdate, ServoConfig};

/// Process-wide [`ServoConfig`] with single-writer / multi-reader access.
///
/// Readers take an `Arc` snapshot and keep it for as long as they need a
/// consistent view (a move holds its snapshot until it completes). Writers
/// validate the complete new configuration before publishing it, so readers
/// only ever observe validated configurations.
#[derive(Clone)]
pub struct SharedConfig {
    current: Arc<ArcSwap<ServoConfig>>,
    writer: Arc<Mutex<()>>,
}

impl SharedConfig {
    /// Create a shared cell from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` violates any bound.
    pub fn new(config: ServoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            current: Arc::new(ArcSwap::from_pointee(config)),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Current configuration snapshot.
    #[inline]
    pub fn snapshot(&self) -> Arc<ServoConfig> {
        self.current.load_full()
    }

    /// Replace the whole configuration.
    ///
    /// On error the active configuration is left untouched.
    pub fn replace(&self, config: ServoConfig) -> Result<Arc<ServoConfig>> {
        config.validate()?;
        let _guard = self.writer.lock();
        let next = Arc::new(config);
        self.current.store(Arc::clone(&next));
        tracing::info!(config = ?next, "servo configuration replaced");
        Ok(next)
    }

    /// Apply a partial update over the current configuration.
    ///
    /// The merge and validation happen under the writer lock, so concurrent
    /// updates are applied one after the other and none is lost.
    pub fn update(&self, update: &ConfigUpdate) -> Result<Arc<ServoConfig>> {
        let _guard = self.writer.lock();
        let next = match self.current.load().merged(update) {
            Ok(next) => Arc::new(next),
            Err(e) => {
                tracing::warn!(error = %e, "rejected servo configuration update");
                return Err(e);
            }
        };
        self.current.store(Arc::clone(&next));
        tracing::info!(update = ?update, "servo configuration updated");
        Ok(next)
    }
}

impl core::fmt::Debug for SharedConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("SharedConfig").field(&self.snapshot()).finish()
    }
}

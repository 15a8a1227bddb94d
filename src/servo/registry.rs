//! Multi-servo registry (std only).

use std::collections::BTreeMap;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use crate::config::units::{Degrees, ServoId};
use crate::config::{
    validate_config, ChannelConfig, ConfigUpdate, ServoConfig, SharedConfig, SystemConfig,
    MAX_CHANNELS,
};
use crate::error::{ConfigError, Error, MotionError, Result, ServoError};

use super::controller::{MoveTicket, ServoController};
use super::output::PwmOutput;
use super::status::{ServoStatus, StatusBus, StatusEvent};

/// Outcome of a command applied to every registered servo.
///
/// One servo failing never stops the command from reaching the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Servos that completed the command.
    pub succeeded: Vec<ServoId>,
    /// Servos that failed, with their error.
    pub failed: BTreeMap<ServoId, Error>,
    /// Inactive servos the command was not sent to.
    pub skipped: Vec<ServoId>,
}

impl BatchReport {
    /// Check if every servo succeeded.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of servos the command was applied to.
    #[inline]
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Check if no servo was involved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&mut self, id: ServoId, result: Result<()>) {
        match result {
            Ok(()) => self.succeeded.push(id),
            Err(e) => {
                self.failed.insert(id, e);
            }
        }
    }
}

enum Slot {
    Active(ServoController),
    Inactive(ServoStatus),
}

impl Slot {
    fn status(&self) -> ServoStatus {
        match self {
            Slot::Active(controller) => controller.status(),
            Slot::Inactive(status) => status.clone(),
        }
    }
}

/// Set of servos sharing one configuration and one status bus.
///
/// Every operation addresses servos by [`ServoId`]; ids that were never
/// registered yield `ServoError::UnknownServoId`. Servos whose output failed
/// to open stay listed as inactive: single-servo commands to them yield
/// `ServoError::Inactive` and batch commands skip them.
pub struct ServoRegistry {
    servos: BTreeMap<ServoId, Slot>,
    config: SharedConfig,
    bus: StatusBus,
}

impl ServoRegistry {
    /// Create an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` violates any bound.
    pub fn new(config: ServoConfig) -> Result<Self> {
        Ok(Self {
            servos: BTreeMap::new(),
            config: SharedConfig::new(config)?,
            bus: StatusBus::new(),
        })
    }

    /// Build a registry from a system configuration.
    ///
    /// `make_output` is called once per channel, in file order, to open the
    /// PWM output for that channel. A channel whose output fails to open is
    /// registered as inactive and the remaining channels still start.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config<P, F>(system: &SystemConfig, mut make_output: F) -> Result<Self>
    where
        P: PwmOutput + Send + 'static,
        F: FnMut(&ChannelConfig) -> Result<P>,
    {
        validate_config(system)?;

        let mut registry = Self::new(system.servo.clone())?;
        for channel in &system.channels {
            match make_output(channel) {
                Ok(output) => registry.add(channel, output)?,
                Err(error) => {
                    warn!(
                        servo = %channel.id,
                        pin = channel.pin,
                        %error,
                        "PWM output unavailable, servo inactive"
                    );
                    registry.add_inactive(channel)?;
                }
            }
        }

        info!(
            servos = registry.len(),
            active = registry.active().count(),
            "servo registry ready"
        );
        Ok(registry)
    }

    /// Register one servo and start its worker.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DuplicateServoId` / `ConfigError::DuplicatePin` on clashes
    /// - `ConfigError::InvalidInitialAngle` if the initial angle is outside [0, 180]
    /// - `ConfigError::TooManyChannels` past 16 servos
    pub fn add<P>(&mut self, channel: &ChannelConfig, output: P) -> Result<()>
    where
        P: PwmOutput + Send + 'static,
    {
        self.check_channel(channel)?;
        let controller =
            ServoController::spawn(channel, output, self.config.clone(), self.bus.clone())?;
        self.servos.insert(channel.id, Slot::Active(controller));
        Ok(())
    }

    /// Register a servo without an output.
    ///
    /// It is listed by [`list`](Self::list) with `active == false` and
    /// rejects every command with `ServoError::Inactive`.
    ///
    /// # Errors
    ///
    /// Same checks as [`add`](Self::add).
    pub fn add_inactive(&mut self, channel: &ChannelConfig) -> Result<()> {
        self.check_channel(channel)?;
        self.servos
            .insert(channel.id, Slot::Inactive(ServoStatus::inactive(channel)));
        Ok(())
    }

    fn check_channel(&self, channel: &ChannelConfig) -> Result<()> {
        if self.servos.contains_key(&channel.id) {
            return Err(ConfigError::DuplicateServoId(channel.id).into());
        }
        if self.servos.values().any(|s| s.status().pin == channel.pin) {
            return Err(ConfigError::DuplicatePin(channel.pin).into());
        }
        if !channel.initial_angle.in_servo_range() {
            return Err(ConfigError::InvalidInitialAngle {
                servo: channel.id,
                angle: channel.initial_angle.0,
            }
            .into());
        }
        if self.servos.len() >= MAX_CHANNELS {
            return Err(ConfigError::TooManyChannels.into());
        }
        Ok(())
    }

    /// Number of registered servos, inactive ones included.
    pub fn len(&self) -> usize {
        self.servos.len()
    }

    /// Check if no servo is registered.
    pub fn is_empty(&self) -> bool {
        self.servos.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<ServoId> {
        self.servos.keys().copied().collect()
    }

    /// Check if `id` is registered.
    pub fn contains(&self, id: ServoId) -> bool {
        self.servos.contains_key(&id)
    }

    /// Controller of one servo.
    ///
    /// # Errors
    ///
    /// `ServoError::UnknownServoId` or `ServoError::Inactive`.
    pub fn controller(&self, id: ServoId) -> Result<&ServoController> {
        match self.servos.get(&id) {
            Some(Slot::Active(controller)) => Ok(controller),
            Some(Slot::Inactive(_)) => Err(ServoError::Inactive(id).into()),
            None => Err(ServoError::UnknownServoId(id).into()),
        }
    }

    /// Check if `id` has a working output.
    pub fn is_active(&self, id: ServoId) -> bool {
        matches!(self.servos.get(&id), Some(Slot::Active(_)))
    }

    fn active(&self) -> impl Iterator<Item = (ServoId, &ServoController)> + '_ {
        self.servos.iter().filter_map(|(id, slot)| match slot {
            Slot::Active(controller) => Some((*id, controller)),
            Slot::Inactive(_) => None,
        })
    }

    fn inactive_ids(&self) -> Vec<ServoId> {
        self.servos
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Inactive(_)))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Move one servo and wait for completion.
    pub fn move_servo(&self, id: ServoId, angle: impl Into<Degrees>) -> Result<()> {
        self.controller(id)?.move_to(angle)
    }

    /// Queue a move on one servo without waiting.
    pub fn start_move(&self, id: ServoId, angle: impl Into<Degrees>) -> Result<MoveTicket> {
        self.controller(id)?.start_move(angle)
    }

    /// Move one servo to 90°.
    pub fn center(&self, id: ServoId) -> Result<()> {
        self.controller(id)?.center()
    }

    /// Hold one servo at its current angle.
    pub fn hold(&self, id: ServoId) -> Result<()> {
        self.controller(id)?.hold()
    }

    /// Cut the signal of one servo.
    pub fn release(&self, id: ServoId) -> Result<()> {
        self.controller(id)?.release()
    }

    /// Move every servo to `angle` concurrently.
    ///
    /// The angle is checked once up front; an invalid angle touches no servo.
    /// Otherwise all moves are started before any is waited on.
    pub fn move_all(&self, angle: impl Into<Degrees>) -> Result<BatchReport> {
        let target = angle.into();
        if !target.in_servo_range() {
            return Err(MotionError::InvalidAngle(target.0).into());
        }
        Ok(self.move_each(target))
    }

    /// Move every servo to 90°.
    pub fn center_all(&self) -> BatchReport {
        self.move_each(Degrees::CENTER)
    }

    /// Hold every servo.
    pub fn hold_all(&self) -> BatchReport {
        self.for_each(ServoController::hold)
    }

    /// Release every servo.
    pub fn release_all(&self) -> BatchReport {
        self.for_each(ServoController::release)
    }

    /// Status of one servo.
    pub fn get_status(&self, id: ServoId) -> Result<ServoStatus> {
        self.servos
            .get(&id)
            .map(Slot::status)
            .ok_or(Error::Servo(ServoError::UnknownServoId(id)))
    }

    /// Status of one servo, or of every servo when `id` is `None`.
    pub fn status(&self, id: Option<ServoId>) -> Result<Vec<ServoStatus>> {
        match id {
            Some(id) => Ok(vec![self.get_status(id)?]),
            None => Ok(self.list()),
        }
    }

    /// Status of every servo in id order.
    pub fn list(&self) -> Vec<ServoStatus> {
        self.servos.values().map(Slot::status).collect()
    }

    /// Current configuration snapshot.
    pub fn get_config(&self) -> Arc<ServoConfig> {
        self.config.snapshot()
    }

    /// Apply a partial configuration update.
    ///
    /// The update is validated as a whole; on error nothing changes.
    pub fn update_config(&self, update: &ConfigUpdate) -> Result<Arc<ServoConfig>> {
        self.config.update(update)
    }

    /// Replace the whole configuration.
    pub fn replace_config(&self, config: ServoConfig) -> Result<Arc<ServoConfig>> {
        self.config.replace(config)
    }

    /// Receive a [`StatusEvent`] for every angle or power change.
    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        self.bus.subscribe()
    }

    /// Stop every worker, disabling all outputs.
    pub fn shutdown(self) {
        for (id, slot) in self.servos {
            if let Slot::Active(controller) = slot {
                controller.shutdown();
                info!(servo = %id, "servo shut down");
            }
        }
    }

    fn move_each(&self, target: Degrees) -> BatchReport {
        let started: Vec<(ServoId, Result<MoveTicket>)> = self
            .active()
            .map(|(id, servo)| (id, servo.start_move(target)))
            .collect();

        let mut report = BatchReport {
            skipped: self.inactive_ids(),
            ..BatchReport::default()
        };
        for (id, ticket) in started {
            report.record(id, ticket.and_then(MoveTicket::wait));
        }
        log_failures("move", &report);
        report
    }

    fn for_each(&self, op: impl Fn(&ServoController) -> Result<()>) -> BatchReport {
        let mut report = BatchReport {
            skipped: self.inactive_ids(),
            ..BatchReport::default()
        };
        for (id, servo) in self.active() {
            report.record(id, op(servo));
        }
        log_failures("batch", &report);
        report
    }
}

fn log_failures(op: &str, report: &BatchReport) {
    for (id, error) in &report.failed {
        warn!(servo = %id, %error, op, "batch command failed");
    }
}

impl core::fmt::Debug for ServoRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServoRegistry")
            .field("servos", &self.ids())
            .field("inactive", &self.inactive_ids())
            .field("config", &self.config)
            .finish()
    }
}

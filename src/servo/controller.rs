//! Per-servo controller (std only).
//!
//! Each servo is owned by one worker thread. Every command for that servo
//! goes through the worker's queue, so moves, holds, releases and the
//! auto-detach timer of a servo are strictly serialized while different
//! servos run in parallel.
//!
//! The worker sleeps on its queue until the next due instant: the next step
//! of the in-flight move, or else the pending detach deadline.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::units::{Degrees, ServoId};
use crate::config::{ChannelConfig, ServoConfig, SharedConfig};
use crate::error::{Error, MotionError, Result, ServoError};
use crate::motion::{plan, MotionPlan, MotionStep, PulseMapper};

use super::output::PwmOutput;
use super::power::{PostMove, PowerStateKind, PowerStateMachine};
use super::status::{EventCause, ServoStatus, StatusBus, StatusEvent};

type Reply = Sender<Result<()>>;

enum Command {
    Move { target: Degrees, reply: Reply },
    Hold { reply: Reply },
    Release { reply: Reply },
    Shutdown,
}

/// Completion handle of a move started with [`ServoController::start_move`].
#[derive(Debug)]
pub struct MoveTicket {
    servo: ServoId,
    target: Degrees,
    reply: Receiver<Result<()>>,
}

impl MoveTicket {
    /// Servo the move runs on.
    pub fn servo(&self) -> ServoId {
        self.servo
    }

    /// Requested target.
    pub fn target(&self) -> Degrees {
        self.target
    }

    /// Block until the move completes, fails or is superseded.
    pub fn wait(self) -> Result<()> {
        self.reply
            .recv()
            .unwrap_or_else(|_| Err(ServoError::WorkerUnavailable(self.servo).into()))
    }

    /// Wait up to `timeout`; `None` if the move is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<()>> {
        match self.reply.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(Err(ServoError::WorkerUnavailable(self.servo).into()))
            }
        }
    }
}

/// Handle to one servo and its worker thread.
///
/// Dropping the controller stops the worker and disables the output.
pub struct ServoController {
    id: ServoId,
    commands: Sender<Command>,
    status: Arc<RwLock<ServoStatus>>,
    config: SharedConfig,
    worker: Option<JoinHandle<()>>,
}

impl ServoController {
    /// Start the worker for `channel` driving `output`.
    ///
    /// The servo starts `Detached` at the channel's initial angle; nothing is
    /// written until the first command.
    pub fn spawn<P>(
        channel: &ChannelConfig,
        output: P,
        config: SharedConfig,
        bus: StatusBus,
    ) -> Result<Self>
    where
        P: PwmOutput + Send + 'static,
    {
        let id = channel.id;
        let (commands, queue) = unbounded();
        let status = Arc::new(RwLock::new(ServoStatus::new(channel)));

        let worker = Worker {
            id,
            output,
            power: PowerStateMachine::new(),
            angle: channel.initial_angle,
            config: config.clone(),
            status: Arc::clone(&status),
            bus,
            active: None,
        };

        let handle = thread::Builder::new()
            .name(format!("servo-{}", id))
            .spawn(move || worker.run(queue))
            .map_err(|e| {
                warn!(servo = %id, error = %e, "failed to start servo worker");
                ServoError::WorkerUnavailable(id)
            })?;

        info!(servo = %id, pin = channel.pin, "servo worker started");

        Ok(Self {
            id,
            commands,
            status,
            config,
            worker: Some(handle),
        })
    }

    /// Servo id.
    #[inline]
    pub fn id(&self) -> ServoId {
        self.id
    }

    /// Move to `angle` and wait for completion.
    ///
    /// # Errors
    ///
    /// - `MotionError::InvalidAngle` if `angle` is outside [0, 180]
    /// - `ServoError::Preempted` if another move on this servo superseded it
    /// - `ServoError::HardwareWriteFailure` if the output rejected a step
    pub fn move_to(&self, angle: impl Into<Degrees>) -> Result<()> {
        self.start_move(angle)?.wait()
    }

    /// Queue a move to `angle` and return without waiting.
    ///
    /// The angle is validated before anything is queued.
    pub fn start_move(&self, angle: impl Into<Degrees>) -> Result<MoveTicket> {
        let target = angle.into();
        if !target.in_servo_range() {
            return Err(MotionError::InvalidAngle(target.0).into());
        }

        let (reply, rx) = bounded(1);
        self.send(Command::Move { target, reply })?;

        Ok(MoveTicket {
            servo: self.id,
            target,
            reply: rx,
        })
    }

    /// Move to 90°.
    pub fn center(&self) -> Result<()> {
        self.move_to(Degrees::CENTER)
    }

    /// Keep the signal on at the current angle until the next move.
    pub fn hold(&self) -> Result<()> {
        self.request(|reply| Command::Hold { reply })
    }

    /// Cut the signal now. An in-flight move is abandoned.
    pub fn release(&self) -> Result<()> {
        self.request(|reply| Command::Release { reply })
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<ServoConfig> {
        self.config.snapshot()
    }

    /// Replace the shared configuration.
    ///
    /// Moves already in flight finish under the snapshot they started with.
    pub fn update_config(&self, config: ServoConfig) -> Result<Arc<ServoConfig>> {
        self.config.replace(config)
    }

    /// Status snapshot.
    pub fn status(&self) -> ServoStatus {
        self.status.read().clone()
    }

    /// Last angle written to the output.
    pub fn current_angle(&self) -> Degrees {
        self.status.read().current_angle
    }

    /// Output power state.
    pub fn power_state(&self) -> PowerStateKind {
        self.status.read().power_state
    }

    /// Stop the worker and disable the output.
    pub fn shutdown(self) {
        drop(self);
    }

    fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<()> {
        let (reply, rx) = bounded(1);
        self.send(command(reply))?;
        rx.recv()
            .unwrap_or_else(|_| Err(ServoError::WorkerUnavailable(self.id).into()))
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ServoError::WorkerUnavailable(self.id).into())
    }
}

impl Drop for ServoController {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!(servo = %self.id, "servo worker panicked");
            }
        }
    }
}

impl core::fmt::Debug for ServoController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ServoController")
            .field("id", &self.id)
            .field("status", &*self.status.read())
            .finish()
    }
}

struct ActiveMove {
    plan: MotionPlan,
    config: Arc<ServoConfig>,
    mapper: PulseMapper,
    next_at: Instant,
    reply: Reply,
}

struct Worker<P> {
    id: ServoId,
    output: P,
    power: PowerStateMachine<Instant>,
    angle: Degrees,
    config: SharedConfig,
    status: Arc<RwLock<ServoStatus>>,
    bus: StatusBus,
    active: Option<ActiveMove>,
}

impl<P: PwmOutput> Worker<P> {
    fn run(mut self, queue: Receiver<Command>) {
        loop {
            let received = match self.next_wakeup() {
                Some(at) => queue.recv_deadline(at),
                None => queue.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Command::Move { target, reply }) => self.start_move(target, reply),
                Ok(Command::Hold { reply }) => {
                    let result = self.hold();
                    let _ = reply.send(result);
                }
                Ok(Command::Release { reply }) => {
                    let result = self.release();
                    let _ = reply.send(result);
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.tick(Instant::now());
        }

        self.stop();
    }

    fn next_wakeup(&self) -> Option<Instant> {
        match &self.active {
            Some(active) => Some(active.next_at),
            None => self.power.deadline(),
        }
    }

    fn tick(&mut self, now: Instant) {
        self.run_due_steps(now);
        if self.active.is_none() {
            self.poll_detach(now);
        }
    }

    fn start_move(&mut self, target: Degrees, reply: Reply) {
        let config = self.config.snapshot();

        // Nothing changes unless the new move can actually run
        let prepared = plan(self.angle, target, &config)
            .and_then(|p| Ok((p, PulseMapper::from_config(&config)?)));
        let (plan, mapper) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                debug!(servo = %self.id, error = %e, "move rejected");
                let _ = reply.send(Err(e));
                return;
            }
        };

        if let Some(previous) = self.active.take() {
            debug!(servo = %self.id, from = %previous.plan.target(), to = %target, "move preempted");
            let _ = previous.reply.send(Err(ServoError::Preempted {
                servo: self.id,
                target: previous.plan.target().0,
            }
            .into()));
        }

        debug!(
            servo = %self.id,
            from = %plan.start(),
            to = %target,
            steps = plan.total_steps(),
            "move started"
        );

        self.set_moving(true);
        if self.power.begin_move().is_some() {
            self.publish(EventCause::PowerChanged);
        }

        self.active = Some(ActiveMove {
            plan,
            config,
            mapper,
            next_at: Instant::now(),
            reply,
        });
    }

    fn run_due_steps(&mut self, now: Instant) {
        loop {
            let due = match self.active.as_mut() {
                Some(active) if active.next_at <= now => Some((active.plan.next(), active.mapper)),
                _ => None,
            };
            let Some((step, mapper)) = due else { return };
            let Some(step) = step else {
                self.finish_move(now);
                return;
            };

            if let Err(e) = self.write_step(step, mapper) {
                self.abort_move(e);
                return;
            }

            let complete = match self.active.as_mut() {
                Some(active) => {
                    active.next_at = now + step.hold_duration;
                    active.plan.is_complete()
                }
                None => return,
            };
            if complete {
                self.finish_move(now);
                return;
            }
        }
    }

    fn write_step(&mut self, step: MotionStep, mapper: PulseMapper) -> Result<()> {
        let pulse = mapper.pulse_for(step.angle)?;
        if let Err(e) = self.output.set_pulse(pulse) {
            warn!(servo = %self.id, error = ?e, angle = %step.angle, "PWM write failed");
            return Err(ServoError::HardwareWriteFailure(self.id).into());
        }

        if step.angle != self.angle {
            self.angle = step.angle;
            self.publish(EventCause::AngleChanged);
        }
        Ok(())
    }

    fn finish_move(&mut self, now: Instant) {
        let Some(active) = self.active.take() else {
            return;
        };

        let policy = PostMove::from_config(&active.config);
        let result = match self.power.complete_move(now, policy, &mut self.output) {
            Ok(change) => {
                if change.is_some() {
                    self.publish(EventCause::PowerChanged);
                }
                Ok(())
            }
            Err(e) => {
                warn!(servo = %self.id, error = ?e, "PWM disable failed after move");
                self.publish(EventCause::WriteFailed);
                Err(ServoError::HardwareWriteFailure(self.id).into())
            }
        };

        {
            let mut status = self.status.write();
            status.moving = false;
            status.last_move = Some(SystemTime::now());
        }

        debug!(servo = %self.id, angle = %self.angle, ?policy, "move complete");
        let _ = active.reply.send(result);
    }

    fn abort_move(&mut self, error: Error) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.set_moving(false);
        if matches!(error, Error::Servo(ServoError::HardwareWriteFailure(_))) {
            self.publish(EventCause::WriteFailed);
        }
        let _ = active.reply.send(Err(error));
    }

    fn hold(&mut self) -> Result<()> {
        let config = self.config.snapshot();
        let pulse = PulseMapper::from_config(&config)?.pulse_for(self.angle)?;

        match self.power.hold(pulse, &mut self.output) {
            Ok(change) => {
                if change.is_some() {
                    self.publish(EventCause::PowerChanged);
                }
                info!(servo = %self.id, angle = %self.angle, "holding");
                Ok(())
            }
            Err(e) => {
                warn!(servo = %self.id, error = ?e, "PWM write failed on hold");
                self.publish(EventCause::WriteFailed);
                Err(ServoError::HardwareWriteFailure(self.id).into())
            }
        }
    }

    fn release(&mut self) -> Result<()> {
        if let Some(active) = self.active.take() {
            self.set_moving(false);
            let _ = active.reply.send(Err(ServoError::Preempted {
                servo: self.id,
                target: active.plan.target().0,
            }
            .into()));
        }

        match self.power.release(&mut self.output) {
            Ok(change) => {
                if change.is_some() {
                    self.publish(EventCause::PowerChanged);
                }
                info!(servo = %self.id, "released");
                Ok(())
            }
            Err(e) => {
                warn!(servo = %self.id, error = ?e, "PWM disable failed on release");
                self.publish(EventCause::WriteFailed);
                Err(ServoError::HardwareWriteFailure(self.id).into())
            }
        }
    }

    fn poll_detach(&mut self, now: Instant) {
        match self.power.poll(now, &mut self.output) {
            Ok(Some(_)) => {
                debug!(servo = %self.id, "auto-detached");
                self.publish(EventCause::PowerChanged);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(servo = %self.id, error = ?e, "PWM disable failed on auto-detach");
                self.publish(EventCause::WriteFailed);
            }
        }
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active
                .reply
                .send(Err(ServoError::WorkerUnavailable(self.id).into()));
        }
        self.set_moving(false);

        if self.power.is_powered() {
            match self.power.release(&mut self.output) {
                Ok(_) => self.publish(EventCause::PowerChanged),
                Err(e) => warn!(servo = %self.id, error = ?e, "PWM disable failed on shutdown"),
            }
        }
        info!(servo = %self.id, "servo worker stopped");
    }

    fn set_moving(&self, moving: bool) {
        self.status.write().moving = moving;
    }

    /// Refresh the shared status and notify subscribers.
    fn publish(&self, cause: EventCause) {
        let event = {
            let mut status = self.status.write();
            status.current_angle = self.angle;
            status.power_state = self.power.kind();
            StatusEvent::from_status(&status, cause)
        };
        self.bus.publish(event);
    }
}

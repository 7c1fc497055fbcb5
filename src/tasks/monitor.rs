use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Configuration;
use crate::detection::DetectionEventFactory;
use crate::events::{DetectionTick, OperatorCommand};
use crate::state::{AppState, Screen};

/// Placeholder wakeup used while no toast deadline is armed; the select arm
/// is guarded, so it is never actually awaited to completion.
const IDLE_WAKEUP: Duration = Duration::from_secs(3600);

/// The single owner of [`AppState`].
///
/// Consumes scheduler ticks and operator commands, drives the toast
/// dismissal deadline, and publishes a snapshot over the watch channel after
/// every mutation. Confining all writes to this task is what makes the rest
/// of the pipeline lock-free.
pub struct Monitor {
    state: AppState,
    factory: DetectionEventFactory,
    toast_duration: Duration,
    toast_deadline: Option<Instant>,
    snapshots: watch::Sender<AppState>,
}

impl Monitor {
    pub fn new(cfg: &Configuration, seed: Option<u64>) -> Self {
        let mut factory =
            DetectionEventFactory::new(&cfg.detection, cfg.vessel_catalog.len(), 0, seed);
        let state = AppState::new(factory.startup_point(), Local::now());
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            state,
            factory,
            toast_duration: cfg.toast.duration,
            toast_deadline: None,
            snapshots,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.snapshots.subscribe()
    }

    pub async fn run(
        mut self,
        mut ticks: Receiver<DetectionTick>,
        mut commands: Receiver<OperatorCommand>,
        cancel: CancellationToken,
    ) -> Result<()> {
        // A closed input channel is not fatal: ticks can stop while manual
        // captures continue, and vice versa. Only cancellation ends the loop.
        let mut ticks_open = true;
        let mut commands_open = true;

        loop {
            let toast_wakeup = self
                .toast_deadline
                .unwrap_or_else(|| Instant::now() + IDLE_WAKEUP);

            tokio::select! {
                _ = cancel.cancelled() => break,

                maybe_tick = ticks.recv(), if ticks_open => {
                    match maybe_tick {
                        Some(DetectionTick) => self.on_tick(),
                        None => ticks_open = false,
                    }
                }

                maybe_cmd = commands.recv(), if commands_open => {
                    match maybe_cmd {
                        Some(cmd) => self.on_command(cmd),
                        None => commands_open = false,
                    }
                }

                _ = sleep_until(toast_wakeup), if self.toast_deadline.is_some() => {
                    self.toast_deadline = None;
                    if self.state.hide_toast() {
                        debug!("alert dismissed after timeout");
                        self.sync();
                    }
                }
            }
        }

        Ok(())
    }

    /// Timer fire: publish only while the operator is watching the live
    /// screen. Ticks on the detail screen are dropped, not queued; the
    /// scheduler keeps its cadence either way.
    fn on_tick(&mut self) {
        if self.state.screen() == Screen::Monitoring {
            self.publish("timer");
        } else {
            debug!("detection tick dropped while on detail screen");
        }
    }

    fn on_command(&mut self, cmd: OperatorCommand) {
        match cmd {
            // Manual capture runs the same publish path as the timer and
            // never navigates, even from the detail screen.
            OperatorCommand::Capture => self.publish("capture"),
            OperatorCommand::ViewDetails => {
                if self.state.view_details() {
                    self.toast_deadline = None;
                    self.sync();
                }
            }
            OperatorCommand::Back => {
                if self.state.back() {
                    self.sync();
                }
            }
            OperatorCommand::CloseToast => {
                self.toast_deadline = None;
                if self.state.hide_toast() {
                    self.sync();
                }
            }
        }
    }

    fn publish(&mut self, trigger: &str) {
        let event = self.factory.create(Local::now());
        info!(
            trigger,
            image_index = event.image_index,
            lat = %event.coordinates.lat,
            lng = %event.coordinates.lng,
            "vessel detection published"
        );
        self.state.publish(event);
        // A publish while the toast is already up restarts the full window.
        self.toast_deadline = Some(Instant::now() + self.toast_duration);
        self.sync();
    }

    fn sync(&mut self) {
        self.snapshots.send_replace(self.state.clone());
    }
}

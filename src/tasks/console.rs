use std::io::{self, BufRead};

use anyhow::Result;
use tokio::sync::mpsc::Sender;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::events::OperatorCommand;
use crate::state::{AppState, Screen};
use crate::timefmt::format_timestamp;

/// Map one console line to an operator action.
pub fn parse_command(line: &str) -> Option<OperatorCommand> {
    match line.trim().to_ascii_lowercase().as_str() {
        "c" | "capture" => Some(OperatorCommand::Capture),
        "d" | "details" => Some(OperatorCommand::ViewDetails),
        "b" | "back" => Some(OperatorCommand::Back),
        "x" | "close" => Some(OperatorCommand::CloseToast),
        _ => None,
    }
}

/// Blocking stdin reader: forwards operator commands and treats EOF as a
/// shutdown request, like closing the session.
pub fn spawn_stdin_operator(
    commands: Sender<OperatorCommand>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("stdin watcher failed: {err}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(cmd) => {
                    if commands.blocking_send(cmd).is_err() {
                        break;
                    }
                }
                None => warn!(input = %line.trim(), "unrecognized command (try: capture, details, back, close)"),
            }
        }
        info!("stdin closed; initiating shutdown");
        cancel.cancel();
    })
}

/// Stand-in render surface: logs every state snapshot as it changes.
pub async fn run_render(
    mut snapshots: watch::Receiver<AppState>,
    catalog: Vec<String>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        {
            let state = snapshots.borrow_and_update().clone();
            render(&state, &catalog);
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

fn render(state: &AppState, catalog: &[String]) {
    let image = catalog
        .get(state.current_image_index())
        .map(String::as_str)
        .unwrap_or("<missing>");

    match state.screen() {
        Screen::Monitoring => info!(
            screen = "monitoring",
            image,
            lat = %state.coordinates().lat,
            lng = %state.coordinates().lng,
            time = %format_timestamp(state.timestamp()),
            "live monitoring active"
        ),
        Screen::Details => info!(
            screen = "details",
            image,
            lat = %state.coordinates().lat,
            lng = %state.coordinates().lng,
            time = %format_timestamp(state.timestamp()),
            "detection details"
        ),
    }

    if state.toast_visible() {
        if let Some(detection) = state.latest_detection() {
            info!(
                lat = %detection.coordinates.lat,
                lng = %detection.coordinates.lng,
                time = %format_timestamp(&detection.timestamp),
                "ALERT: suspected vessel detected"
            );
        }
    }
}

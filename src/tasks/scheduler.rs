use anyhow::Result;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::detection::RandomSource;
use crate::events::DetectionTick;

/// The recurring detection timer: a restartable one-shot in a loop rather
/// than a fixed-period interval, because the delay is resampled every cycle.
///
/// The chain never pauses on its own; it keeps re-arming until cancelled or
/// until the monitor goes away. Whether a tick actually publishes a
/// detection is decided by the receiver, which can see the active screen.
pub async fn run(
    cfg: SchedulerConfig,
    seed: Option<u64>,
    ticks: Sender<DetectionTick>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut random = RandomSource::from_seed(seed);

    loop {
        let delay = random.delay_between(cfg.min_interval, cfg.max_interval);
        debug!(delay_ms = delay.as_millis() as u64, "detection timer armed");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(delay) => {
                if ticks.send(DetectionTick).await.is_err() {
                    debug!("tick receiver closed; stopping detection timer");
                    break;
                }
            }
        }
    }

    Ok(())
}

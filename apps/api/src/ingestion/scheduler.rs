use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::ingestion::sources::JobSource;
use crate::ingestion::IngestionPipeline;

/// Runs `pipeline` against `source` every `every`, starting immediately.
/// A failed run is logged and the next tick proceeds as usual.
pub fn spawn_periodic_ingest(
    pipeline: Arc<IngestionPipeline>,
    source: Box<dyn JobSource>,
    every: Duration,
) -> JoinHandle<()> {
    info!(
        "Periodic ingestion of '{}' every {}s",
        source.name(),
        every.as_secs()
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = pipeline.ingest(source.as_ref()).await {
                error!("Periodic ingestion of '{}' failed: {e}", source.name());
            }
        }
    })
}

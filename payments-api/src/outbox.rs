use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info};

use payments_core::ports::{MessageBus, OutboxStore};

const DRAIN_BATCH: i64 = 100;

/// Ships durable publish intents to the broker. Rows stay unprocessed until
/// the publish succeeds, so a broker outage delays delivery instead of
/// dropping the requested event.
pub struct OutboxRelay {
    store: Arc<dyn OutboxStore>,
    bus: Arc<dyn MessageBus>,
}

impl OutboxRelay {
    pub fn new(store: Arc<dyn OutboxStore>, bus: Arc<dyn MessageBus>) -> Self {
        Self { store, bus }
    }

    pub async fn run(&self) {
        let mut interval = time::interval(Duration::from_secs(5));

        loop {
            interval.tick().await;

            if let Err(e) = self.drain().await {
                error!("Error draining outbox: {}", e);
            }
        }
    }

    async fn drain(&self) -> Result<()> {
        let pending = self.store.load_pending(DRAIN_BATCH).await?;

        for event in pending {
            if let Err(e) = self.bus.publish(&event.destination, &event.event_data).await {
                error!("Failed to publish outbox event {}: {}", event.id, e);
                continue;
            }

            self.store.mark_processed(event.id).await?;
            info!("Published outbox event {} ({})", event.id, event.event_type);
        }

        Ok(())
    }
}

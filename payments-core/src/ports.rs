use anyhow::Result;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::events::PaymentEvent;
use crate::models::OutboxEventRow;
use crate::payment::Payment;

/// Durable projection store for the payment aggregate's current state.
/// Authoritative for reads; the ledger is a side-effect record.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Inserts a new payment. Fails if the id already exists.
    async fn add(&self, payment: &Payment) -> Result<()>;

    /// Absence is a negative result, not an error.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Payment>>;

    /// Full overwrite of the mutable projection, last-write-wins.
    async fn update(&self, payment: &Payment) -> Result<()>;

    /// 1-indexed page, newest-created-first. Out-of-range input clamps,
    /// past-the-end pages yield an empty vec.
    async fn list(&self, page: i64, size: i64) -> Result<Vec<Payment>>;
}

/// Append-only event ledger. Any write failure propagates uncaught so that
/// callers can rely on append-before-publish ordering.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, aggregate_id: Uuid, event: &PaymentEvent) -> Result<()>;
}

/// Durable publish intent: rows enqueued here are picked up by the outbox
/// relay and published to their destination after the surrounding workflow
/// has committed its writes.
#[async_trait]
pub trait OutboxQueue: Send + Sync {
    async fn enqueue(&self, destination: &str, event: &PaymentEvent) -> Result<()>;
}

/// Relay-side view of the outbox: unprocessed rows in enqueue order, and
/// the acknowledgement that flips a row once its publish succeeded.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    async fn load_pending(&self, limit: i64) -> Result<Vec<OutboxEventRow>>;

    async fn mark_processed(&self, id: Uuid) -> Result<()>;
}

/// Point-to-point request queue producer.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, destination: &str, body: &serde_json::Value) -> Result<()>;
}

/// Fan-out notification topic producer. Kept separate from `MessageBus`:
/// different downstream consumers, different message shapes.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        subject: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<()>;
}

/// External games-catalog price lookup.
#[async_trait]
pub trait GamesCatalog: Send + Sync {
    async fn get_price(&self, game_id: Uuid) -> Result<Option<BigDecimal>>;
}

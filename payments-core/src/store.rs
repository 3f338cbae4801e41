use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::events::PaymentEvent;
use crate::models::{NewEventRecord, NewOutboxEvent, OutboxEventRow, PaymentRow};
use crate::pagination;
use crate::payment::Payment;
use crate::ports::{EventStore, OutboxQueue, OutboxStore, PaymentRepository};
use crate::schema::{event_store, outbox_events, payments};

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: DbPool,
}

impl PgPaymentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn add(&self, payment: &Payment) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let row = PaymentRow::from(payment);

        diesel::insert_into(payments::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let mut conn = self.pool.get().await?;

        let row = payments::table
            .filter(payments::id.eq(id))
            .first::<PaymentRow>(&mut conn)
            .await
            .optional()?;

        row.map(Payment::try_from).transpose()
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let row = PaymentRow::from(payment);

        diesel::update(payments::table.filter(payments::id.eq(row.id)))
            .set((
                payments::status.eq(row.status),
                payments::updated_at_utc.eq(row.updated_at_utc),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn list(&self, page: i64, size: i64) -> Result<Vec<Payment>> {
        let mut conn = self.pool.get().await?;
        let (offset, limit) = pagination::window(page, size);

        let rows = payments::table
            .order(payments::created_at_utc.desc())
            .offset(offset)
            .limit(limit)
            .load::<PaymentRow>(&mut conn)
            .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: DbPool,
}

impl PgEventStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, aggregate_id: Uuid, event: &PaymentEvent) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let record = NewEventRecord {
            id: Uuid::new_v4(),
            aggregate_id,
            type_: event.kind().to_string(),
            data: event.payload()?,
            created_at_utc: Utc::now(),
        };

        diesel::insert_into(event_store::table)
            .values(&record)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct PgOutboxQueue {
    pool: DbPool,
}

impl PgOutboxQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxQueue for PgOutboxQueue {
    async fn enqueue(&self, destination: &str, event: &PaymentEvent) -> Result<()> {
        let mut conn = self.pool.get().await?;
        let row = NewOutboxEvent {
            id: Uuid::new_v4(),
            aggregate_id: event.aggregate_id(),
            event_type: event.kind().to_string(),
            event_data: event.payload()?,
            destination: destination.to_string(),
        };

        diesel::insert_into(outbox_events::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl OutboxStore for PgOutboxQueue {
    async fn load_pending(&self, limit: i64) -> Result<Vec<OutboxEventRow>> {
        let mut conn = self.pool.get().await?;

        let rows = outbox_events::table
            .filter(outbox_events::processed.eq(false))
            .order(outbox_events::created_at.asc())
            .limit(limit)
            .load::<OutboxEventRow>(&mut conn)
            .await?;

        Ok(rows)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        let mut conn = self.pool.get().await?;

        diesel::update(outbox_events::table.filter(outbox_events::id.eq(id)))
            .set(outbox_events::processed.eq(true))
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

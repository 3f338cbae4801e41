use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::payment::Payment;

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: BigDecimal,
    pub status: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::event_store)]
pub struct NewEventRecord {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub type_: String,
    pub data: serde_json::Value,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::outbox_events)]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub destination: String,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::outbox_events)]
pub struct NewOutboxEvent {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub event_type: String,
    pub event_data: serde_json::Value,
    pub destination: String,
}

impl From<&Payment> for PaymentRow {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id(),
            user_id: payment.user_id(),
            game_id: payment.game_id(),
            amount: payment.amount().clone(),
            status: payment.status().to_string(),
            created_at_utc: payment.created_at_utc(),
            updated_at_utc: payment.updated_at_utc(),
        }
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = anyhow::Error;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row.status.parse()?;
        Ok(Payment::rehydrate(
            row.id,
            row.user_id,
            row.game_id,
            row.amount,
            status,
            row.created_at_utc,
            row.updated_at_utc,
        ))
    }
}

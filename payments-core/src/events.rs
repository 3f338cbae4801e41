use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaymentError;
use crate::payment::{Payment, PaymentStatus};

pub const PAYMENT_REQUESTED: &str = "PaymentRequested";
pub const PAYMENT_CONFIRMED: &str = "PaymentConfirmed";

/// Request-queue message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequested {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: f64,
    pub created_at_utc: DateTime<Utc>,
}

/// Notification-topic message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmed {
    pub payment_id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub confirmed_at_utc: DateTime<Utc>,
}

/// Closed set of ledger events. The event store persists `(type, data)`
/// derived from the variant, so every `data` column has a deserializable
/// schema instead of an open-ended blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PaymentEvent {
    PaymentRequested(PaymentRequested),
    PaymentConfirmed(PaymentConfirmed),
}

impl PaymentEvent {
    pub fn requested(payment: &Payment) -> Result<Self, PaymentError> {
        Ok(Self::PaymentRequested(PaymentRequested {
            payment_id: payment.id(),
            user_id: payment.user_id(),
            game_id: payment.game_id(),
            amount: wire_amount(payment.amount())?,
            created_at_utc: payment.created_at_utc(),
        }))
    }

    /// Snapshot of a payment that just transitioned to `Paid`.
    pub fn confirmed(payment: &Payment) -> Result<Self, PaymentError> {
        let confirmed_at_utc = payment.updated_at_utc().ok_or_else(|| {
            PaymentError::validation("confirmed payment is missing its update timestamp")
        })?;
        Ok(Self::PaymentConfirmed(PaymentConfirmed {
            payment_id: payment.id(),
            user_id: payment.user_id(),
            game_id: payment.game_id(),
            amount: wire_amount(payment.amount())?,
            status: PaymentStatus::Paid,
            confirmed_at_utc,
        }))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PaymentRequested(_) => PAYMENT_REQUESTED,
            Self::PaymentConfirmed(_) => PAYMENT_CONFIRMED,
        }
    }

    pub fn aggregate_id(&self) -> Uuid {
        match self {
            Self::PaymentRequested(e) => e.payment_id,
            Self::PaymentConfirmed(e) => e.payment_id,
        }
    }

    /// The inner payload only, as stored in the ledger's `data` column and
    /// shipped as the wire body. The event type travels separately.
    pub fn payload(&self) -> Result<serde_json::Value, PaymentError> {
        let value = match self {
            Self::PaymentRequested(e) => serde_json::to_value(e),
            Self::PaymentConfirmed(e) => serde_json::to_value(e),
        };
        value.map_err(|e| PaymentError::Dependency(e.into()))
    }
}

fn wire_amount(amount: &BigDecimal) -> Result<f64, PaymentError> {
    amount.to_f64().ok_or_else(|| {
        PaymentError::validation(format!("amount {amount} is not representable on the wire"))
    })
}

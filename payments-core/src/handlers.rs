use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::PaymentError;
use crate::events::PaymentEvent;
use crate::pagination;
use crate::payment::{Payment, PaymentStatus};
use crate::ports::{EventStore, GamesCatalog, NotificationPublisher, OutboxQueue, PaymentRepository};

pub const NOTIFICATION_SUBJECT: &str = "Payment Confirmed";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: Option<DateTime<Utc>>,
}

impl PaymentDto {
    fn from_payment(payment: &Payment) -> Result<Self, PaymentError> {
        let amount = payment.amount().to_f64().ok_or_else(|| {
            PaymentError::validation(format!("amount {} is not representable", payment.amount()))
        })?;
        Ok(Self {
            id: payment.id(),
            user_id: payment.user_id(),
            game_id: payment.game_id(),
            amount,
            status: payment.status(),
            created_at_utc: payment.created_at_utc(),
            updated_at_utc: payment.updated_at_utc(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPaymentsResponse {
    pub page: i64,
    pub size: i64,
    pub count: usize,
    pub items: Vec<PaymentDto>,
}

/// Prices a payment request against the catalog, persists the pending
/// aggregate, records the `PaymentRequested` ledger entry, and enqueues the
/// request message for the outbox relay. Every durable write completes
/// before any broker interaction happens.
pub struct CreatePaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    catalog: Arc<dyn GamesCatalog>,
    ledger: Arc<dyn EventStore>,
    outbox: Arc<dyn OutboxQueue>,
}

impl CreatePaymentHandler {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        catalog: Arc<dyn GamesCatalog>,
        ledger: Arc<dyn EventStore>,
        outbox: Arc<dyn OutboxQueue>,
    ) -> Self {
        Self {
            repository,
            catalog,
            ledger,
            outbox,
        }
    }

    pub async fn handle(
        &self,
        user_id: Uuid,
        game_id: Uuid,
        queue_destination: &str,
    ) -> Result<PaymentDto, PaymentError> {
        if queue_destination.trim().is_empty() {
            return Err(PaymentError::validation("queue destination not configured"));
        }

        let price = self
            .catalog
            .get_price(game_id)
            .await
            .map_err(PaymentError::Dependency)?;
        let price = match price {
            Some(p) if p > BigDecimal::from(0) => p,
            _ => {
                return Err(PaymentError::validation(
                    "game not found or has an invalid price",
                ))
            }
        };

        let payment = Payment::new(user_id, game_id, price)?;

        self.repository
            .add(&payment)
            .await
            .map_err(PaymentError::Dependency)?;

        let requested = PaymentEvent::requested(&payment)?;
        self.ledger
            .append(payment.id(), &requested)
            .await
            .map_err(PaymentError::Dependency)?;
        self.outbox
            .enqueue(queue_destination, &requested)
            .await
            .map_err(PaymentError::Dependency)?;

        info!(payment_id = %payment.id(), game_id = %game_id, "payment requested");
        PaymentDto::from_payment(&payment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The payment transitioned to `Paid`; projection updated, ledger entry
    /// appended, notification published.
    Confirmed,
    /// Redelivery of an already-confirmed payment; nothing was written or
    /// published, the caller should still acknowledge the trigger.
    AlreadyPaid,
    /// No payment with that id; non-retryable from the caller's view.
    NotFound,
}

/// Drives the Pending -> Paid transition. Shared by the admin confirm
/// endpoint and the out-of-process confirmation consumer.
pub struct ConfirmPaymentHandler {
    repository: Arc<dyn PaymentRepository>,
    ledger: Arc<dyn EventStore>,
    notifier: Arc<dyn NotificationPublisher>,
    topic: String,
}

impl ConfirmPaymentHandler {
    pub fn new(
        repository: Arc<dyn PaymentRepository>,
        ledger: Arc<dyn EventStore>,
        notifier: Arc<dyn NotificationPublisher>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            ledger,
            notifier,
            topic: topic.into(),
        }
    }

    pub async fn handle(&self, payment_id: Uuid) -> Result<ConfirmOutcome, PaymentError> {
        let Some(mut payment) = self
            .repository
            .get_by_id(payment_id)
            .await
            .map_err(PaymentError::Dependency)?
        else {
            warn!(%payment_id, "confirmation for unknown payment");
            return Ok(ConfirmOutcome::NotFound);
        };

        if !payment.confirm()? {
            info!(%payment_id, "payment already paid, skipping re-confirmation");
            return Ok(ConfirmOutcome::AlreadyPaid);
        }

        self.repository
            .update(&payment)
            .await
            .map_err(PaymentError::Dependency)?;

        let confirmed = PaymentEvent::confirmed(&payment)?;
        self.ledger
            .append(payment.id(), &confirmed)
            .await
            .map_err(PaymentError::Dependency)?;

        self.notifier
            .publish(
                &self.topic,
                Some(NOTIFICATION_SUBJECT),
                &confirmed.payload()?,
            )
            .await
            .map_err(PaymentError::Dependency)?;

        info!(%payment_id, "payment confirmed");
        Ok(ConfirmOutcome::Confirmed)
    }
}

pub struct GetPaymentHandler {
    repository: Arc<dyn PaymentRepository>,
}

impl GetPaymentHandler {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, id: Uuid) -> Result<Option<PaymentDto>, PaymentError> {
        let payment = self
            .repository
            .get_by_id(id)
            .await
            .map_err(PaymentError::Dependency)?;
        payment.as_ref().map(PaymentDto::from_payment).transpose()
    }
}

pub struct ListPaymentsHandler {
    repository: Arc<dyn PaymentRepository>,
}

impl ListPaymentsHandler {
    pub fn new(repository: Arc<dyn PaymentRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, page: i64, size: i64) -> Result<ListPaymentsResponse, PaymentError> {
        let payments = self
            .repository
            .list(page, size)
            .await
            .map_err(PaymentError::Dependency)?;

        let items = payments
            .iter()
            .map(PaymentDto::from_payment)
            .collect::<Result<Vec<_>, _>>()?;
        let (page, size) = pagination::clamp(page, size);

        Ok(ListPaymentsResponse {
            page,
            size,
            count: items.len(),
            items,
        })
    }
}

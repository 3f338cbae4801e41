use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PaymentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(PaymentError::validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Payment aggregate root. Fields are private: the only way a payment
/// changes state is through `confirm`/`mark_failed`, which enforce the
/// Pending -> Paid | Failed machine. `Paid` and `Failed` are terminal.
#[derive(Debug, Clone)]
pub struct Payment {
    id: Uuid,
    user_id: Uuid,
    game_id: Uuid,
    amount: BigDecimal,
    status: PaymentStatus,
    created_at_utc: DateTime<Utc>,
    updated_at_utc: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(user_id: Uuid, game_id: Uuid, amount: BigDecimal) -> Result<Self, PaymentError> {
        if user_id.is_nil() {
            return Err(PaymentError::validation("user id is required"));
        }
        if game_id.is_nil() {
            return Err(PaymentError::validation("game id is required"));
        }
        if amount <= BigDecimal::from(0) {
            return Err(PaymentError::validation("amount must be positive"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            game_id,
            amount,
            status: PaymentStatus::Pending,
            created_at_utc: Utc::now(),
            updated_at_utc: None,
        })
    }

    /// Rehydrates a payment from its stored projection. Storage adapters only;
    /// invariants are assumed to have been enforced at original construction.
    pub(crate) fn rehydrate(
        id: Uuid,
        user_id: Uuid,
        game_id: Uuid,
        amount: BigDecimal,
        status: PaymentStatus,
        created_at_utc: DateTime<Utc>,
        updated_at_utc: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            game_id,
            amount,
            status,
            created_at_utc,
            updated_at_utc,
        }
    }

    /// Marks the payment as paid. Returns `Ok(true)` when a transition
    /// happened and `Ok(false)` when the payment was already paid, in which
    /// case nothing (including `updated_at_utc`) changes. Confirming a failed
    /// payment is rejected.
    pub fn confirm(&mut self) -> Result<bool, PaymentError> {
        match self.status {
            PaymentStatus::Paid => Ok(false),
            PaymentStatus::Failed => Err(PaymentError::InvalidTransition {
                from: PaymentStatus::Failed,
                to: PaymentStatus::Paid,
            }),
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Paid;
                self.updated_at_utc = Some(Utc::now());
                Ok(true)
            }
        }
    }

    /// Marks the payment as failed. Idempotent for already-failed payments;
    /// failing a paid payment is rejected.
    pub fn mark_failed(&mut self) -> Result<(), PaymentError> {
        match self.status {
            PaymentStatus::Failed => Ok(()),
            PaymentStatus::Paid => Err(PaymentError::InvalidTransition {
                from: PaymentStatus::Paid,
                to: PaymentStatus::Failed,
            }),
            PaymentStatus::Pending => {
                self.status = PaymentStatus::Failed;
                self.updated_at_utc = Some(Utc::now());
                Ok(())
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn amount(&self) -> &BigDecimal {
        &self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at_utc(&self) -> DateTime<Utc> {
        self.created_at_utc
    }

    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        self.updated_at_utc
    }
}

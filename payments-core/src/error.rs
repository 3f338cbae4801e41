use crate::payment::PaymentStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("dependency failure: {0}")]
    Dependency(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Non-retryable errors: redelivering the triggering message can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::InvalidTransition { .. }
        )
    }
}

use anyhow::Result;
use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Header, Headers, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::Message;
use std::time::Duration;
use tracing::{error, info, warn};

use payments_core::handlers::{ConfirmOutcome, ConfirmPaymentHandler};
use payments_core::PaymentRequested;

const ATTEMPTS_HEADER: &str = "deliveryAttempts";
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ConsumerConfig {
    pub request_topic: String,
    pub dead_letter_topic: String,
    pub max_delivery_attempts: u32,
    pub batch_size: usize,
}

/// Drains the request queue and drives payments from `Pending` to `Paid`.
///
/// An offset is committed only after the message has been handled to
/// completion, so a crash mid-message leaves it redeliverable. Undecodable
/// bodies and unknown payments are poison: logged and acknowledged. Transient
/// failures are republished with an attempt counter until the retry budget is
/// spent, then routed to the dead-letter topic.
pub struct ConfirmationConsumer {
    handler: ConfirmPaymentHandler,
    producer: FutureProducer,
    config: ConsumerConfig,
}

impl ConfirmationConsumer {
    pub fn new(
        handler: ConfirmPaymentHandler,
        producer: FutureProducer,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            handler,
            producer,
            config,
        }
    }

    pub async fn run(&self, consumer: StreamConsumer) {
        let mut batches = consumer.stream().ready_chunks(self.config.batch_size);

        while let Some(batch) = batches.next().await {
            for message in batch {
                match message {
                    Ok(m) => self.process(&consumer, &m).await,
                    Err(e) => error!("Error receiving message: {}", e),
                }
            }
        }
    }

    async fn process(&self, consumer: &StreamConsumer, m: &BorrowedMessage<'_>) {
        let payload = match m.payload_view::<str>() {
            Some(Ok(s)) => s,
            _ => {
                warn!("Discarding message with unreadable payload");
                self.commit(consumer, m);
                return;
            }
        };

        let request: PaymentRequested = match serde_json::from_str(payload) {
            Ok(r) => r,
            Err(e) => {
                warn!("Discarding undecodable request message: {}", e);
                self.commit(consumer, m);
                return;
            }
        };
        let key = request.payment_id.to_string();

        match self.handler.handle(request.payment_id).await {
            Ok(ConfirmOutcome::Confirmed) => {
                self.commit(consumer, m);
            }
            Ok(ConfirmOutcome::AlreadyPaid) => {
                info!(payment_id = %request.payment_id, "Redelivery of a paid payment, acknowledging");
                self.commit(consumer, m);
            }
            Ok(ConfirmOutcome::NotFound) => {
                warn!(payment_id = %request.payment_id, "No such payment, discarding message");
                self.commit(consumer, m);
            }
            Err(e) if e.is_permanent() => {
                warn!(payment_id = %request.payment_id, "Unprocessable request, dead-lettering: {}", e);
                if self.dead_letter(&key, payload, delivery_attempts(m)).await {
                    self.commit(consumer, m);
                }
            }
            Err(e) => {
                error!(payment_id = %request.payment_id, "Confirmation failed: {}", e);
                self.schedule_retry(consumer, m, &key, payload).await;
            }
        }
    }

    /// Republishes the message with an incremented attempt counter, or
    /// dead-letters it once the budget is spent. The original offset is
    /// committed only after the copy is durably queued; if the republish
    /// itself fails, the broker redelivers the original.
    async fn schedule_retry(
        &self,
        consumer: &StreamConsumer,
        m: &BorrowedMessage<'_>,
        key: &str,
        payload: &str,
    ) {
        let attempts = delivery_attempts(m).saturating_add(1);

        let sent = match retry_route(attempts, self.config.max_delivery_attempts) {
            RetryRoute::DeadLetter => {
                warn!("Retry budget exhausted after {} deliveries, dead-lettering", attempts);
                self.dead_letter(key, payload, attempts).await
            }
            RetryRoute::Retry => {
                self.send(&self.config.request_topic, key, payload, attempts)
                    .await
            }
        };

        if sent {
            self.commit(consumer, m);
        }
    }

    async fn dead_letter(&self, key: &str, payload: &str, attempts: u32) -> bool {
        self.send(&self.config.dead_letter_topic, key, payload, attempts)
            .await
    }

    async fn send(&self, topic: &str, key: &str, payload: &str, attempts: u32) -> bool {
        let attempts_value = attempts.to_string();
        let record = FutureRecord::to(topic)
            .payload(payload)
            .key(key)
            .headers(OwnedHeaders::new().insert(Header {
                key: ATTEMPTS_HEADER,
                value: Some(&attempts_value),
            }));

        match self.producer.send(record, SEND_TIMEOUT).await {
            Ok(_) => true,
            Err((e, _)) => {
                error!("Failed to publish to {}: {}", topic, e);
                false
            }
        }
    }

    fn commit(&self, consumer: &StreamConsumer, m: &BorrowedMessage<'_>) {
        if let Err(e) = consumer.commit_message(m, CommitMode::Async) {
            error!("Error committing message: {}", e);
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum RetryRoute {
    Retry,
    DeadLetter,
}

/// Where a failed message goes on its `attempts`-th delivery.
fn retry_route(attempts: u32, budget: u32) -> RetryRoute {
    if attempts >= budget {
        RetryRoute::DeadLetter
    } else {
        RetryRoute::Retry
    }
}

fn delivery_attempts(m: &BorrowedMessage<'_>) -> u32 {
    m.headers()
        .and_then(|headers| {
            headers
                .iter()
                .find(|header| header.key == ATTEMPTS_HEADER)
                .map(|header| parse_attempts(header.value))
        })
        .unwrap_or(0)
}

fn parse_attempts(value: Option<&[u8]>) -> u32 {
    value
        .and_then(|v| std::str::from_utf8(v).ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_default_to_zero() {
        assert_eq!(parse_attempts(None), 0);
        assert_eq!(parse_attempts(Some(b"not a number")), 0);
        assert_eq!(parse_attempts(Some(&[0xff, 0xfe])), 0);
    }

    #[test]
    fn attempts_parse_from_header_bytes() {
        assert_eq!(parse_attempts(Some(b"1")), 1);
        assert_eq!(parse_attempts(Some(b"42")), 42);
    }

    #[test]
    fn messages_retry_until_the_budget_is_spent() {
        assert_eq!(retry_route(1, 5), RetryRoute::Retry);
        assert_eq!(retry_route(4, 5), RetryRoute::Retry);
        assert_eq!(retry_route(5, 5), RetryRoute::DeadLetter);
        assert_eq!(retry_route(6, 5), RetryRoute::DeadLetter);
    }

    #[test]
    fn budget_of_one_dead_letters_immediately() {
        assert_eq!(retry_route(1, 1), RetryRoute::DeadLetter);
        assert_eq!(retry_route(u32::MAX, 5), RetryRoute::DeadLetter);
    }
}

use anyhow::Result;
use async_trait::async_trait;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

use crate::ports::{MessageBus, NotificationPublisher};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Messages are keyed by the payment id so that one aggregate's messages
/// land on one partition and arrive in order.
fn partition_key(body: &serde_json::Value) -> String {
    body.get("paymentId")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[derive(Clone)]
pub struct KafkaMessageBus {
    producer: FutureProducer,
}

impl KafkaMessageBus {
    pub fn new(producer: FutureProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl MessageBus for KafkaMessageBus {
    async fn publish(&self, destination: &str, body: &serde_json::Value) -> Result<()> {
        let json = serde_json::to_string(body)?;
        let key = partition_key(body);
        let record = FutureRecord::to(destination).payload(&json).key(&key);

        self.producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| anyhow::anyhow!("failed to publish to {destination}: {e}"))?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct KafkaNotificationPublisher {
    producer: FutureProducer,
}

impl KafkaNotificationPublisher {
    pub fn new(producer: FutureProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl NotificationPublisher for KafkaNotificationPublisher {
    async fn publish(
        &self,
        topic: &str,
        subject: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<()> {
        let json = serde_json::to_string(body)?;
        let key = partition_key(body);
        let mut record = FutureRecord::to(topic).payload(&json).key(&key);
        if let Some(subject) = subject {
            record = record.headers(OwnedHeaders::new().insert(Header {
                key: "subject",
                value: Some(subject),
            }));
        }

        self.producer
            .send(record, SEND_TIMEOUT)
            .await
            .map_err(|(e, _)| anyhow::anyhow!("failed to notify {topic}: {e}"))?;

        Ok(())
    }
}

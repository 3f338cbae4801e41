#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use payments_core::events::PaymentEvent;
use payments_core::pagination;
use payments_core::payment::Payment;
use payments_core::ports::{
    EventStore, GamesCatalog, MessageBus, NotificationPublisher, OutboxQueue, PaymentRepository,
};

#[derive(Default, Clone)]
pub struct InMemoryPaymentRepository {
    payments: Arc<RwLock<HashMap<Uuid, Payment>>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_existing(&self, payment: Payment) {
        self.payments.write().await.insert(payment.id(), payment);
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn add(&self, payment: &Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.id()) {
            return Err(anyhow!("duplicate payment id {}", payment.id()));
        }
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        Ok(self.payments.read().await.get(&id).cloned())
    }

    async fn update(&self, payment: &Payment) -> Result<()> {
        let mut payments = self.payments.write().await;
        if !payments.contains_key(&payment.id()) {
            return Err(anyhow!("unknown payment id {}", payment.id()));
        }
        payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn list(&self, page: i64, size: i64) -> Result<Vec<Payment>> {
        let payments = self.payments.read().await;
        let mut all: Vec<Payment> = payments.values().cloned().collect();
        all.sort_by(|a, b| b.created_at_utc().cmp(&a.created_at_utc()));

        let (offset, limit) = pagination::window(page, size);
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct RecordingEventStore {
    appends: Arc<RwLock<Vec<(Uuid, PaymentEvent)>>>,
}

impl RecordingEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn appended(&self) -> Vec<(Uuid, PaymentEvent)> {
        self.appends.read().await.clone()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn append(&self, aggregate_id: Uuid, event: &PaymentEvent) -> Result<()> {
        self.appends
            .write()
            .await
            .push((aggregate_id, event.clone()));
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingOutbox {
    entries: Arc<RwLock<Vec<(String, PaymentEvent)>>>,
}

impl RecordingOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<(String, PaymentEvent)> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl OutboxQueue for RecordingOutbox {
    async fn enqueue(&self, destination: &str, event: &PaymentEvent) -> Result<()> {
        self.entries
            .write()
            .await
            .push((destination.to_string(), event.clone()));
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingBus {
    published: Arc<RwLock<Vec<(String, serde_json::Value)>>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn published(&self) -> Vec<(String, serde_json::Value)> {
        self.published.read().await.clone()
    }
}

#[async_trait]
impl MessageBus for RecordingBus {
    async fn publish(&self, destination: &str, body: &serde_json::Value) -> Result<()> {
        self.published
            .write()
            .await
            .push((destination.to_string(), body.clone()));
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingNotifier {
    notifications: Arc<RwLock<Vec<(String, Option<String>, serde_json::Value)>>>,
    fail: Arc<RwLock<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<(String, Option<String>, serde_json::Value)> {
        self.notifications.read().await.clone()
    }

    pub async fn fail_next(&self, fail: bool) {
        *self.fail.write().await = fail;
    }
}

#[async_trait]
impl NotificationPublisher for RecordingNotifier {
    async fn publish(
        &self,
        topic: &str,
        subject: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<()> {
        if *self.fail.read().await {
            return Err(anyhow!("notification transport unavailable"));
        }
        self.notifications.write().await.push((
            topic.to_string(),
            subject.map(str::to_string),
            body.clone(),
        ));
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct StaticCatalog {
    prices: Arc<RwLock<HashMap<Uuid, BigDecimal>>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_price(&self, game_id: Uuid, price: BigDecimal) {
        self.prices.write().await.insert(game_id, price);
    }
}

#[async_trait]
impl GamesCatalog for StaticCatalog {
    async fn get_price(&self, game_id: Uuid) -> Result<Option<BigDecimal>> {
        Ok(self.prices.read().await.get(&game_id).cloned())
    }
}

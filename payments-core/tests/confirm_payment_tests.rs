mod common;

use bigdecimal::BigDecimal;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use common::{InMemoryPaymentRepository, RecordingEventStore, RecordingNotifier};
use payments_core::events::PAYMENT_CONFIRMED;
use payments_core::handlers::{ConfirmOutcome, ConfirmPaymentHandler, NOTIFICATION_SUBJECT};
use payments_core::ports::PaymentRepository;
use payments_core::{Payment, PaymentError, PaymentStatus};

const TOPIC: &str = "payments-events";

struct Setup {
    repo: InMemoryPaymentRepository,
    ledger: RecordingEventStore,
    notifier: RecordingNotifier,
    handler: ConfirmPaymentHandler,
}

fn setup() -> Setup {
    let repo = InMemoryPaymentRepository::new();
    let ledger = RecordingEventStore::new();
    let notifier = RecordingNotifier::new();
    let handler = ConfirmPaymentHandler::new(
        Arc::new(repo.clone()),
        Arc::new(ledger.clone()),
        Arc::new(notifier.clone()),
        TOPIC,
    );
    Setup {
        repo,
        ledger,
        notifier,
        handler,
    }
}

fn pending_payment() -> Payment {
    Payment::new(
        Uuid::new_v4(),
        Uuid::new_v4(),
        BigDecimal::from_str("150").unwrap(),
    )
    .unwrap()
}

#[tokio::test]
async fn confirm_updates_appends_and_notifies() {
    let s = setup();
    let payment = pending_payment();
    let id = payment.id();
    s.repo.insert_existing(payment).await;

    let outcome = s.handler.handle(id).await.unwrap();
    assert_eq!(outcome, ConfirmOutcome::Confirmed);

    let stored = s.repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.status(), PaymentStatus::Paid);
    assert!(stored.updated_at_utc().is_some());

    let appends = s.ledger.appended().await;
    assert_eq!(appends.len(), 1);
    assert_eq!(appends[0].0, id);
    assert_eq!(appends[0].1.kind(), PAYMENT_CONFIRMED);

    let notifications = s.notifier.notifications().await;
    assert_eq!(notifications.len(), 1);
    let (topic, subject, body) = &notifications[0];
    assert_eq!(topic, TOPIC);
    assert_eq!(subject.as_deref(), Some(NOTIFICATION_SUBJECT));
    assert_eq!(body["paymentId"], id.to_string().as_str());
    assert_eq!(body["status"], "Paid");
}

#[tokio::test]
async fn already_paid_payment_acknowledges_without_side_effects() {
    let s = setup();
    let mut payment = pending_payment();
    payment.confirm().unwrap();
    let id = payment.id();
    let stamped = payment.updated_at_utc();
    s.repo.insert_existing(payment).await;

    let outcome = s.handler.handle(id).await.unwrap();
    assert_eq!(outcome, ConfirmOutcome::AlreadyPaid);

    assert!(s.ledger.appended().await.is_empty());
    assert!(s.notifier.notifications().await.is_empty());

    let stored = s.repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.updated_at_utc(), stamped);
}

#[tokio::test]
async fn missing_payment_reports_not_found() {
    let s = setup();

    let outcome = s.handler.handle(Uuid::new_v4()).await.unwrap();
    assert_eq!(outcome, ConfirmOutcome::NotFound);

    assert!(s.ledger.appended().await.is_empty());
    assert!(s.notifier.notifications().await.is_empty());
}

#[tokio::test]
async fn failed_payment_rejects_confirmation() {
    let s = setup();
    let mut payment = pending_payment();
    payment.mark_failed().unwrap();
    let id = payment.id();
    s.repo.insert_existing(payment).await;

    let err = s.handler.handle(id).await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidTransition { .. }));
    assert!(s.notifier.notifications().await.is_empty());
}

#[tokio::test]
async fn notify_failure_propagates_after_durable_writes() {
    let s = setup();
    let payment = pending_payment();
    let id = payment.id();
    s.repo.insert_existing(payment).await;
    s.notifier.fail_next(true).await;

    let err = s.handler.handle(id).await.unwrap_err();
    assert!(matches!(err, PaymentError::Dependency(_)));

    // Projection and ledger were already written; redelivery will find the
    // payment paid and acknowledge without a second transition.
    let stored = s.repo.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.status(), PaymentStatus::Paid);
    assert_eq!(s.ledger.appended().await.len(), 1);

    s.notifier.fail_next(false).await;
    let outcome = s.handler.handle(id).await.unwrap();
    assert_eq!(outcome, ConfirmOutcome::AlreadyPaid);
}

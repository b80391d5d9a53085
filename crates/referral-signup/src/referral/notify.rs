//! Detached delivery of referral SMS notifications.
//!
//! Signup handlers push onto a bounded queue and move on; a worker task
//! drains the queue and sends each message in its own task, with at most
//! `capacity` sends in flight. Delivery failures end up in the log and
//! nowhere else.

use crate::error::NotificationError;
use async_trait::async_trait;
use slicktext_client::SlickTextClient;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Something that can deliver a text message to a phone number.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, number: &str, body: &str) -> Result<(), NotificationError>;
}

#[async_trait]
impl SmsSender for SlickTextClient {
    async fn send_sms(&self, number: &str, body: &str) -> Result<(), NotificationError> {
        self.send_message(number, body).await?;
        Ok(())
    }
}

/// Sender used when no SlickText credential is configured.
pub struct DisabledSender;

#[async_trait]
impl SmsSender for DisabledSender {
    async fn send_sms(&self, _number: &str, _body: &str) -> Result<(), NotificationError> {
        Err(NotificationError::Disabled)
    }
}

/// A text message owed to a referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralNotification {
    pub number: String,
    pub body: String,
}

impl ReferralNotification {
    /// Notification telling a referrer their new entry count.
    pub fn credited(number: impl Into<String>, entries: i64) -> Self {
        Self {
            number: number.into(),
            body: format!(
                "A friend signed up with your link! You now have {} giveaway entries.",
                entries
            ),
        }
    }
}

/// Producer side of the notification queue.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<ReferralNotification>,
}

impl NotificationQueue {
    /// Queue a notification without waiting.
    ///
    /// Returns false if the notification was dropped because the queue is
    /// full or the worker has stopped.
    pub fn enqueue(&self, notification: ReferralNotification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                warn!(phone_number = %n.number, "Notification queue full, dropping notification");
                false
            }
            Err(TrySendError::Closed(n)) => {
                warn!(phone_number = %n.number, "Notification worker stopped, dropping notification");
                false
            }
        }
    }
}

/// Background worker that delivers queued notifications.
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    /// Start the worker. It runs until every `NotificationQueue` clone is
    /// dropped.
    ///
    /// `capacity` bounds both the queue and the number of concurrent sends.
    pub fn spawn(
        sender: Arc<dyn SmsSender>,
        capacity: usize,
    ) -> (NotificationQueue, JoinHandle<()>) {
        let capacity = capacity.max(1);
        let (tx, mut rx) = mpsc::channel::<ReferralNotification>(capacity);
        let in_flight = Arc::new(Semaphore::new(capacity));

        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                // Stop draining while every send slot is busy so the queue
                // bound applies back pressure.
                let Ok(permit) = in_flight.clone().acquire_owned().await else {
                    break;
                };
                let sender = sender.clone();
                tokio::spawn(async move {
                    deliver(sender.as_ref(), notification).await;
                    drop(permit);
                });
            }
            debug!("Notification queue closed");
        });

        (NotificationQueue { tx }, handle)
    }
}

async fn deliver(sender: &dyn SmsSender, notification: ReferralNotification) {
    match sender.send_sms(&notification.number, &notification.body).await {
        Ok(()) => {
            info!(phone_number = %notification.number, "Referral notification sent");
        }
        Err(NotificationError::Disabled) => {
            debug!(phone_number = %notification.number, "Notifications disabled, skipping");
        }
        Err(e) => {
            warn!(phone_number = %notification.number, error = %e, "Referral notification failed");
        }
    }
}

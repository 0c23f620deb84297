// Notifier trait and implementations

use crate::account::{Account, AccountId};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Notification timed out")]
    Timeout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Transfer,
    Withdrawal,
    Earning,
}

/// A message for one account holder
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub data: HashMap<String, String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            kind,
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }
}

/// Push-notification provider
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &Account, notification: &Notification) -> Result<(), NotifyError>;
}

/// Send one notification, swallowing failure.
///
/// Balance changes are already committed when this runs; a lost
/// notification is logged and otherwise ignored.
pub async fn dispatch(notifier: &dyn Notifier, recipient: &Account, notification: Notification, timeout: Duration) {
    match tokio::time::timeout(timeout, notifier.send(recipient, &notification)).await {
        Ok(Ok(())) => debug!(account = %recipient.id(), title = %notification.title, "notification sent"),
        Ok(Err(e)) => warn!(account = %recipient.id(), error = %e, "notification failed"),
        Err(_) => warn!(account = %recipient.id(), error = %NotifyError::Timeout, "notification failed"),
    }
}

// ============================================================================
// LOG NOTIFIER
// ============================================================================

/// Writes notifications to the log instead of a push service
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &Account, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            account = %recipient.id(),
            kind = ?notification.kind,
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
        Ok(())
    }
}

// ============================================================================
// MOCK NOTIFIER
// ============================================================================

/// Mock implementation of Notifier for testing
#[derive(Default)]
pub struct MockNotifier {
    should_fail: bool,
    delay_ms: u64,
    sent: Mutex<Vec<(AccountId, Notification)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure every send to fail
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Add a delay before responding
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Every send attempted, in order
    pub fn sent(&self) -> Vec<(AccountId, Notification)> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Notifications attempted for one account
    pub fn sent_to(&self, account: &AccountId) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| id == account)
            .map(|(_, n)| n)
            .collect()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, recipient: &Account, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((*recipient.id(), notification.clone()));

        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }

        if self.should_fail {
            return Err(NotifyError::Delivery("Mock failure".to_string()));
        }
        Ok(())
    }
}

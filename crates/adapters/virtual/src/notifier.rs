//! Subscriber notifiers that never leave the process.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

use switchhub_app::error::AppError;
use switchhub_app::ports::SubscriberNotifier;
use switchhub_domain::id::UserId;
use switchhub_domain::status::Status;

/// Notifier writing every notification to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl SubscriberNotifier for LogNotifier {
    fn request_sync(&self, uid: UserId, subscribers: &BTreeSet<String>) -> Result<(), AppError> {
        for subscriber in subscribers {
            tracing::info!(%uid, subscriber, "request sync");
        }
        Ok(())
    }

    fn report_state(
        &self,
        uid: UserId,
        subscribers: &BTreeSet<String>,
        status: &Status,
    ) -> Result<(), AppError> {
        for subscriber in subscribers {
            tracing::info!(
                %uid,
                subscriber,
                dev_id = %status.device_id,
                power = status.power.as_deref(),
                "report state"
            );
        }
        Ok(())
    }
}

/// A notification kept by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    RequestSync {
        uid: UserId,
        subscribers: Vec<String>,
    },
    ReportState {
        uid: UserId,
        subscribers: Vec<String>,
        status: Status,
    },
}

/// Notifier keeping every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Notifications received so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

impl SubscriberNotifier for RecordingNotifier {
    fn request_sync(&self, uid: UserId, subscribers: &BTreeSet<String>) -> Result<(), AppError> {
        self.push(Notification::RequestSync {
            uid,
            subscribers: subscribers.iter().cloned().collect(),
        });
        Ok(())
    }

    fn report_state(
        &self,
        uid: UserId,
        subscribers: &BTreeSet<String>,
        status: &Status,
    ) -> Result<(), AppError> {
        self.push(Notification::ReportState {
            uid,
            subscribers: subscribers.iter().cloned().collect(),
            status: status.clone(),
        });
        Ok(())
    }
}

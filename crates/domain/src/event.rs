//! Events — immutable records of something that happened to a user.
//!
//! Events are queued on the [`User`](crate::user::User) aggregate while a
//! handler runs and collected by the unit of work once it commits. They are
//! bus-internal and never persisted.

use std::fmt;

use crate::change_report::ChangeReport;
use crate::id::UserId;

/// A domain event emitted by the user aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new user was created.
    UserRegistered { uid: UserId },
    /// The device list was fetched and reconciled.
    UserDevListFetched { uid: UserId },
    /// Reconciliation added, updated or removed at least one device.
    UserDevListChanged { uid: UserId },
    /// A device status was replaced by a different one.
    UserDevStateChanged { uid: UserId, dev_id: String },
    /// A webhook change report was recorded.
    UserDevReportChanged { dev_id: String, change: ChangeReport },
    /// Every device status was pulled after a device-list fetch.
    UserDevStatesAllFetched { uid: UserId },
    /// The vendor webhook now points at this service.
    UserWebhookUpdated { uid: UserId },
    /// The user's data should be downloaded again.
    UserRequestReload { uid: UserId },
}

/// Discriminant of an [`Event`], used as the handler registration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    UserRegistered,
    UserDevListFetched,
    UserDevListChanged,
    UserDevStateChanged,
    UserDevReportChanged,
    UserDevStatesAllFetched,
    UserWebhookUpdated,
    UserRequestReload,
}

impl Event {
    /// The kind this event is dispatched under.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserRegistered { .. } => EventKind::UserRegistered,
            Self::UserDevListFetched { .. } => EventKind::UserDevListFetched,
            Self::UserDevListChanged { .. } => EventKind::UserDevListChanged,
            Self::UserDevStateChanged { .. } => EventKind::UserDevStateChanged,
            Self::UserDevReportChanged { .. } => EventKind::UserDevReportChanged,
            Self::UserDevStatesAllFetched { .. } => EventKind::UserDevStatesAllFetched,
            Self::UserWebhookUpdated { .. } => EventKind::UserWebhookUpdated,
            Self::UserRequestReload { .. } => EventKind::UserRequestReload,
        }
    }

    /// The user this event is about, when it carries one.
    ///
    /// [`Event::UserDevReportChanged`] is keyed by device only.
    #[must_use]
    pub fn uid(&self) -> Option<UserId> {
        match self {
            Self::UserRegistered { uid }
            | Self::UserDevListFetched { uid }
            | Self::UserDevListChanged { uid }
            | Self::UserDevStateChanged { uid, .. }
            | Self::UserDevStatesAllFetched { uid }
            | Self::UserWebhookUpdated { uid }
            | Self::UserRequestReload { uid } => Some(*uid),
            Self::UserDevReportChanged { .. } => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_event_to_kind() {
        let uid = UserId::new();
        assert_eq!(
            Event::UserRegistered { uid }.kind(),
            EventKind::UserRegistered
        );
        assert_eq!(
            Event::UserDevStateChanged {
                uid,
                dev_id: "D".to_string()
            }
            .kind(),
            EventKind::UserDevStateChanged
        );
    }

    #[test]
    fn should_expose_uid_except_for_change_reports() {
        let uid = UserId::new();
        assert_eq!(Event::UserWebhookUpdated { uid }.uid(), Some(uid));

        let change = ChangeReport {
            event_type: "changeReport".to_string(),
            event_version: "1".to_string(),
            context: serde_json::Map::new(),
        };
        let event = Event::UserDevReportChanged {
            dev_id: "D".to_string(),
            change,
        };
        assert_eq!(event.uid(), None);
    }
}

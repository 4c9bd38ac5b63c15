//! Subscriber notification port — pushes updates to third-party consumers
//! (e.g. a voice assistant home graph) linked to a user.

use std::collections::BTreeSet;

use switchhub_domain::id::UserId;
use switchhub_domain::status::Status;

use crate::error::AppError;

/// Outbound port towards the subscribers of a user.
pub trait SubscriberNotifier {
    /// Ask every subscriber to fetch the user's device list again.
    ///
    /// # Errors
    ///
    /// Returns an error when the notification cannot be delivered.
    fn request_sync(&self, uid: UserId, subscribers: &BTreeSet<String>) -> Result<(), AppError>;

    /// Push a device's new status to every subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error when the notification cannot be delivered.
    fn report_state(
        &self,
        uid: UserId,
        subscribers: &BTreeSet<String>,
        status: &Status,
    ) -> Result<(), AppError>;
}

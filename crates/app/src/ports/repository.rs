//! Repository port — collection-like access to [`User`] aggregates.

use switchhub_domain::event::Event;
use switchhub_domain::id::UserId;
use switchhub_domain::user::User;

/// Collection of user aggregates with event tracking.
///
/// Every aggregate handed out by a mutable lookup, or added, is remembered as
/// *seen* so that [`collect_seen_events`](Self::collect_seen_events) can drain
/// the events it queued.
pub trait UserRepository {
    /// Add a new user.
    fn add(&mut self, user: User);

    /// Look up a user by id.
    fn get_by_uid(&mut self, uid: UserId) -> Option<&mut User>;

    /// Look up a user by vendor secret.
    fn get_by_secret(&mut self, secret: &str) -> Option<&mut User>;

    /// Look up the first user owning a device.
    fn get_by_dev_id(&mut self, dev_id: &str) -> Option<&mut User>;

    /// Remove a user, returning it if it existed.
    fn delete(&mut self, uid: UserId) -> Option<User>;

    /// All users, in storage order.
    fn list(&self) -> Vec<&User>;

    /// Drain, in FIFO order, the events queued by every seen aggregate and
    /// forget the seen set.
    fn collect_seen_events(&mut self) -> Vec<Event>;

    /// Number of users.
    fn count(&self) -> usize {
        self.list().len()
    }

    /// Read-only lookup by id. Does not mark the user as seen.
    fn find_by_uid(&self, uid: UserId) -> Option<&User> {
        self.list().into_iter().find(|u| u.uid() == uid)
    }

    /// Read-only lookup by secret. Does not mark the user as seen.
    fn find_by_secret(&self, secret: &str) -> Option<&User> {
        self.list().into_iter().find(|u| u.secret() == secret)
    }

    /// Read-only lookup of a device's owner. Does not mark the user as seen.
    fn find_by_dev_id(&self, dev_id: &str) -> Option<&User> {
        self.list()
            .into_iter()
            .find(|u| u.device(dev_id).is_some())
    }
}

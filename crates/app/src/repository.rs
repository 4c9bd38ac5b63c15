//! In-memory [`UserRepository`], also used as the working set of file-backed
//! units of work.

use std::collections::HashSet;

use switchhub_domain::event::Event;
use switchhub_domain::id::UserId;
use switchhub_domain::user::User;

use crate::ports::UserRepository;

/// Users held in a `Vec`, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Vec<User>,
    seen: HashSet<UserId>,
}

impl InMemoryUserRepository {
    /// Create a repository holding `users`. Nothing is marked as seen.
    #[must_use]
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users,
            seen: HashSet::new(),
        }
    }

    /// All users, in insertion order.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Consume the repository, returning its users.
    #[must_use]
    pub fn into_users(self) -> Vec<User> {
        self.users
    }

    fn mark_seen(&mut self, index: Option<usize>) -> Option<&mut User> {
        let user = self.users.get_mut(index?)?;
        self.seen.insert(user.uid());
        Some(user)
    }
}

impl UserRepository for InMemoryUserRepository {
    fn add(&mut self, user: User) {
        self.seen.insert(user.uid());
        self.users.push(user);
    }

    fn get_by_uid(&mut self, uid: UserId) -> Option<&mut User> {
        let index = self.users.iter().position(|u| u.uid() == uid);
        self.mark_seen(index)
    }

    fn get_by_secret(&mut self, secret: &str) -> Option<&mut User> {
        let index = self.users.iter().position(|u| u.secret() == secret);
        self.mark_seen(index)
    }

    fn get_by_dev_id(&mut self, dev_id: &str) -> Option<&mut User> {
        let index = self
            .users
            .iter()
            .position(|u| u.device(dev_id).is_some());
        self.mark_seen(index)
    }

    fn delete(&mut self, uid: UserId) -> Option<User> {
        let index = self.users.iter().position(|u| u.uid() == uid)?;
        self.seen.remove(&uid);
        Some(self.users.remove(index))
    }

    fn list(&self) -> Vec<&User> {
        self.users.iter().collect()
    }

    fn collect_seen_events(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        for user in &mut self.users {
            if self.seen.contains(&user.uid()) {
                events.extend(user.take_events());
            }
        }
        self.seen.clear();
        events
    }

    fn count(&self) -> usize {
        self.users.len()
    }
}

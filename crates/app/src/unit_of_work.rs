//! In-memory [`UnitOfWork`] that snapshots the repository on `begin`.

use switchhub_domain::event::Event;
use switchhub_domain::user::User;

use crate::error::AppError;
use crate::ports::{TransactionState, UnitOfWork, UserRepository};
use crate::repository::InMemoryUserRepository;

/// Unit of work over an [`InMemoryUserRepository`].
///
/// Rolling back restores the users as they were when the transaction began.
#[derive(Debug, Default)]
pub struct InMemoryUnitOfWork {
    users: InMemoryUserRepository,
    snapshot: Option<Vec<User>>,
    state: TransactionState,
    commits: usize,
}

impl InMemoryUnitOfWork {
    /// Create a unit of work over pre-existing users.
    #[must_use]
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: InMemoryUserRepository::new(users),
            ..Self::default()
        }
    }

    /// The committed users. Only meaningful outside of an open transaction.
    #[must_use]
    pub fn committed_users(&self) -> &[User] {
        self.users.users()
    }

    /// Number of successful commits.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.commits
    }

    fn ensure_open(&self) -> Result<(), AppError> {
        if self.state == TransactionState::Open {
            Ok(())
        } else {
            Err(AppError::TransactionClosed)
        }
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    type Users = InMemoryUserRepository;

    fn begin(&mut self) -> Result<(), AppError> {
        if self.state == TransactionState::Open {
            return Err(AppError::TransactionOpen);
        }
        self.users.collect_seen_events();
        self.snapshot = Some(self.users.users().to_vec());
        self.state = TransactionState::Open;
        Ok(())
    }

    fn users(&mut self) -> Result<&mut Self::Users, AppError> {
        self.ensure_open()?;
        Ok(&mut self.users)
    }

    #[tracing::instrument(skip(self))]
    fn commit(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        self.snapshot = None;
        self.state = TransactionState::Committed;
        self.commits += 1;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn rollback(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        let users = self.snapshot.take().unwrap_or_default();
        self.users = InMemoryUserRepository::new(users);
        self.state = TransactionState::RolledBack;
        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.state
    }

    fn collect_new_events(&mut self) -> Vec<Event> {
        if self.state == TransactionState::Committed {
            self.users.collect_seen_events()
        } else {
            Vec::new()
        }
    }
}

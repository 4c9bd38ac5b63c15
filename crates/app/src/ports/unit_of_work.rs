//! Unit of work port — transactional boundary around the repository.

use switchhub_domain::event::Event;

use crate::error::AppError;
use crate::ports::repository::UserRepository;

/// Lifecycle of a single transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Closed,
    Open,
    Committed,
    RolledBack,
}

/// A transaction over the user repository.
///
/// Changes made through [`users`](Self::users) become durable on
/// [`commit`](Self::commit) and are discarded on [`rollback`](Self::rollback).
/// Handlers normally go through [`transaction`](Self::transaction), which
/// rolls back automatically on failure.
pub trait UnitOfWork {
    type Users: UserRepository;

    /// Open a transaction, loading the repository.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransactionOpen`] if a transaction is already open,
    /// or a storage error when the store cannot be loaded.
    fn begin(&mut self) -> Result<(), AppError>;

    /// The repository of the open transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransactionClosed`] outside of an open transaction.
    fn users(&mut self) -> Result<&mut Self::Users, AppError>;

    /// Persist every change made since [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransactionClosed`] outside of an open transaction,
    /// or a storage error when the store cannot be written.
    fn commit(&mut self) -> Result<(), AppError>;

    /// Discard every change made since [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::TransactionClosed`] outside of an open transaction,
    /// or a storage error when the store cannot be restored.
    fn rollback(&mut self) -> Result<(), AppError>;

    /// Current lifecycle state.
    fn state(&self) -> TransactionState;

    /// Drain the events queued by the aggregates touched in the last
    /// committed transaction. Yields nothing unless the last transaction
    /// committed.
    fn collect_new_events(&mut self) -> Vec<Event>;

    /// Run `f` inside a transaction: commit when it succeeds, roll back when
    /// it or the commit fails.
    ///
    /// # Errors
    ///
    /// Returns the error of `f`, or of `begin` / `commit`. A rollback failure
    /// is logged, never returned in place of the error that caused it.
    fn transaction<T, F>(&mut self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Self::Users) -> Result<T, AppError>,
    {
        self.begin()?;
        let result = match self.users().and_then(f) {
            Ok(value) => self.commit().map(|()| value),
            Err(err) => Err(err),
        };
        if result.is_err() && self.state() == TransactionState::Open {
            if let Err(rollback_err) = self.rollback() {
                tracing::error!(error = %rollback_err, "rollback failed");
            }
        }
        result
    }

    /// Run a read-only `f` against a fresh view of the store. Always rolls
    /// back.
    ///
    /// # Errors
    ///
    /// Returns an error of `begin` or `rollback`.
    fn read<T, F>(&mut self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Self::Users) -> T,
    {
        self.begin()?;
        let value = self.users().map(|users| f(users));
        self.rollback()?;
        value
    }
}

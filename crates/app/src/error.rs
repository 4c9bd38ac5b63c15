//! Application-level errors.
//!
//! Every layer converts into [`AppError`] via `#[from]`: the domain's
//! [`DomainError`], the IoT port's [`IotError`], the bus' own [`BusError`]
//! and boxed adapter storage errors.

use switchhub_domain::command::CommandKind;
use switchhub_domain::error::DomainError;

use crate::ports::iot::IotError;

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Errors raised by the message bus itself.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// No handler is registered for a command kind.
    #[error("no handler registered for command {0}")]
    MissingHandler(CommandKind),

    /// More than one handler is registered for a command kind.
    #[error("{count} handlers registered for command {kind}")]
    AmbiguousHandler { kind: CommandKind, count: usize },

    /// The dispatch ceiling leaves no room for the command itself.
    #[error("dispatch ceiling of {limit} messages leaves no room for the command")]
    DispatchLimitExceeded { limit: usize },
}

/// Top-level error returned by handlers and the message bus.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("domain error")]
    Domain(#[from] DomainError),

    #[error("entity not found")]
    NotFound(#[from] NotFoundError),

    /// The subscriber is not linked to the user.
    #[error("subscriber {subscriber_id} is not linked to the user")]
    SubscriberNotFound { subscriber_id: String },

    /// The repository was accessed outside of an open transaction.
    #[error("unit of work is not open")]
    TransactionClosed,

    /// `begin` was called while a transaction was already open.
    #[error("unit of work is already open")]
    TransactionOpen,

    #[error("iot error")]
    Iot(#[from] IotError),

    #[error("bus error")]
    Bus(#[from] BusError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A handler received a message it was not registered for.
    #[error("unexpected message {0}")]
    UnexpectedMessage(String),
}

impl AppError {
    /// Build a [`NotFoundError`] for a user identified by `id`.
    pub(crate) fn user_not_found(id: impl ToString) -> Self {
        NotFoundError {
            entity: "User",
            id: id.to_string(),
        }
        .into()
    }
}

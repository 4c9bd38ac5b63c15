//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the handler layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod iot;
pub mod notifier;
pub mod repository;
pub mod unit_of_work;

pub use iot::{Credentials, IotApi, IotError};
pub use notifier::SubscriberNotifier;
pub use repository::UserRepository;
pub use unit_of_work::{TransactionState, UnitOfWork};

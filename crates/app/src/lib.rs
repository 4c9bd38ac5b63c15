//! # switchhub-app
//!
//! Application layer — message bus, handlers and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `UserRepository` — collection of user aggregates with event tracking
//!   - `UnitOfWork` — transactional boundary (begin, commit, rollback)
//!   - `IotApi` — the vendor cloud owning the devices
//!   - `SubscriberNotifier` — third-party consumers linked to a user
//! - Handle commands and the events they cascade into (`handlers`,
//!   `message_bus`), wired together by `bootstrap`
//! - Provide the read side (`views`)
//! - Provide **in-process infrastructure** (in-memory repository and unit of
//!   work) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `switchhub-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod message_bus;
pub mod ports;
pub mod repository;
pub mod unit_of_work;
pub mod views;

#[cfg(test)]
mod testing;

//! # switchhub-adapter-storage-json
//!
//! JSON file storage adapter — implements the [`UserRepository`] and
//! [`UnitOfWork`] port traits defined in `switchhub-app`.
//!
//! The store is a single JSON array of users. A transaction copies the live
//! file to a swap file on `begin`, rewrites the live file on `commit` and
//! restores it from the swap copy on `rollback`.
//!
//! ## Dependency rule
//!
//! Depends on `switchhub-domain` and `switchhub-app` (port traits).
//!
//! [`UserRepository`]: switchhub_app::ports::UserRepository
//! [`UnitOfWork`]: switchhub_app::ports::UnitOfWork

mod error;
mod repository;
mod unit_of_work;

pub use error::StorageError;
pub use repository::JsonFileRepository;
pub use unit_of_work::JsonFileUnitOfWork;

//! # switchhub-domain
//!
//! Pure domain model for the switchhub SwitchBot bridge.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the vendor records (**Devices**, **Statuses**, **Change reports**)
//!   with their persisted field names
//! - Define the **User** aggregate, the sole unit of transactional consistency,
//!   and its reconciliation rules
//! - Define **Commands** (intents handled by exactly one handler) and
//!   **Events** (facts handled by zero or more handlers)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod change_report;
pub mod command;
pub mod device;
pub mod event;
pub mod status;
pub mod user;

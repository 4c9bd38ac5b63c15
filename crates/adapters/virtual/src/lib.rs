//! # switchhub-adapter-virtual
//!
//! Virtual/demo adapters standing in for the outside world.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualIotApi`] | `IotApi` | Simulated cloud serving a [`VirtualCatalog`]; `turnOn` / `turnOff` / `toggle` change the device's power and queue the matching change report |
//! | [`LogNotifier`] | `SubscriberNotifier` | Logs every notification |
//! | [`RecordingNotifier`] | `SubscriberNotifier` | Keeps every notification for inspection |
//!
//! ## Dependency rule
//!
//! Depends on `switchhub-app` (port traits) and `switchhub-domain` only.

mod catalog;
mod cloud;
mod notifier;

pub use catalog::{CatalogError, VirtualCatalog};
pub use cloud::VirtualIotApi;
pub use notifier::{LogNotifier, Notification, RecordingNotifier};

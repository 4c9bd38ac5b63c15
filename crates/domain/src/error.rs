//! Errors raised by the domain model.
//!
//! Each layer defines its own typed errors and converts via `#[from]`; this is
//! the innermost one, produced only by aggregate invariants.

/// Errors raised by [`User`](crate::user::User) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// The device is not part of the user's device list.
    #[error("device {dev_id} not found")]
    DeviceNotFound { dev_id: String },

    /// The control command shape is not understood.
    #[error("unsupported command {command_type}/{command}")]
    UnsupportedCommand {
        command_type: String,
        command: String,
    },

    /// A change report did not carry `context.deviceMac`.
    #[error("change report has no device mac")]
    MissingDeviceMac,
}

//! IoT port — the vendor cloud API that owns the physical devices.

use switchhub_domain::command::DevCtrlCommand;
use switchhub_domain::device::Device;
use switchhub_domain::status::Status;
use switchhub_domain::user::User;

/// The vendor key pair a request is signed with.
#[derive(Clone, Copy)]
pub struct Credentials<'a> {
    pub secret: &'a str,
    pub token: &'a str,
}

impl<'a> From<&'a User> for Credentials<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            secret: user.secret(),
            token: user.token(),
        }
    }
}

/// Errors returned by an [`IotApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IotError {
    /// The cloud does not know the device.
    #[error("device {dev_id} unknown to the iot cloud")]
    DeviceNotFound { dev_id: String },

    /// The cloud refused the request.
    #[error("iot request rejected with status {status_code}: {message}")]
    Rejected { status_code: i64, message: String },
}

/// Outbound port to the vendor cloud.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
pub trait IotApi {
    /// List the devices bound to the account.
    ///
    /// # Errors
    ///
    /// Returns [`IotError::Rejected`] when the cloud refuses the request.
    fn get_dev_list(&self, credentials: Credentials<'_>) -> Result<Vec<Device>, IotError>;

    /// Read the current status of one device.
    ///
    /// # Errors
    ///
    /// Returns [`IotError::DeviceNotFound`] for a device the cloud does not
    /// know, or [`IotError::Rejected`].
    fn get_dev_status(&self, credentials: Credentials<'_>, dev_id: &str)
    -> Result<Status, IotError>;

    /// Send a control command to a device.
    ///
    /// # Errors
    ///
    /// Returns [`IotError::DeviceNotFound`] or [`IotError::Rejected`].
    fn send_dev_ctrl_cmd(
        &self,
        credentials: Credentials<'_>,
        dev_id: &str,
        command: &DevCtrlCommand,
    ) -> Result<(), IotError>;

    /// Enable or disable the webhook delivering change reports to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`IotError::Rejected`] when the cloud refuses the request.
    fn update_webhook_config(
        &self,
        credentials: Credentials<'_>,
        url: &str,
        enable: bool,
    ) -> Result<(), IotError>;
}

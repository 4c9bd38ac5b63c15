//! Device — a SwitchBot device as listed by the vendor cloud.
//!
//! Field names follow the vendor payload (`deviceId`, `hubDeviceId`, …) so the
//! same record is used on the wire and in the persisted store. Optional,
//! type-specific attributes are omitted when absent.

use serde::{Deserialize, Serialize};

/// A physical device registered in the user's SwitchBot account.
///
/// Equality is structural over every field; [`User::request_sync`] relies on
/// it to decide whether a device was modified.
///
/// [`User::request_sync`]: crate::user::User::request_sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub enable_cloud_service: bool,
    #[serde(default)]
    pub hub_device_id: String,

    // Curtain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curtain_devices_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibrate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_direction: Option<String>,

    // Lock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_devices_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_list: Option<serde_json::Map<String, serde_json::Value>>,

    // Blind tilt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blind_tilt_devices_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_position: Option<i64>,
}

impl Device {
    /// Create a cloud-enabled device with no hub and no type-specific attributes.
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        device_name: impl Into<String>,
        device_type: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_name: device_name.into(),
            device_type: device_type.into(),
            enable_cloud_service: true,
            hub_device_id: String::new(),
            curtain_devices_ids: None,
            calibrate: None,
            group: None,
            master: None,
            open_direction: None,
            lock_devices_ids: None,
            group_name: None,
            lock_device_id: None,
            key_list: None,
            version: None,
            blind_tilt_devices_ids: None,
            direction: None,
            slide_position: None,
        }
    }

    /// Set the hub this device is paired through.
    #[must_use]
    pub fn with_hub(mut self, hub_device_id: impl Into<String>) -> Self {
        self.hub_device_id = hub_device_id.into();
        self
    }
}

//! Status — the telemetry snapshot reported for one device.

use serde::{Deserialize, Serialize};

/// Latest known state of a device, as returned by the vendor status endpoint
/// or pushed through a state report.
///
/// Only the identifying fields are mandatory; every telemetry field is
/// optional and omitted from the serialized form when absent. Equality is
/// structural and is what makes duplicate reports a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub device_id: String,
    pub device_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hub_device_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibrate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moving: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub door_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electricity_of_day: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electric_current: Option<f64>,
}

impl Status {
    /// Create a status carrying only the identifying fields.
    #[must_use]
    pub fn new(
        device_id: impl Into<String>,
        device_type: impl Into<String>,
        hub_device_id: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            device_type: device_type.into(),
            hub_device_id: hub_device_id.into(),
            power: None,
            battery: None,
            version: None,
            device_mode: None,
            calibrate: None,
            group: None,
            moving: None,
            slide_position: None,
            temperature: None,
            humidity: None,
            lock_state: None,
            door_state: None,
            working_status: None,
            online_status: None,
            move_detected: None,
            brightness: None,
            color: None,
            color_temperature: None,
            voltage: None,
            weight: None,
            electricity_of_day: None,
            electric_current: None,
        }
    }

    /// Set the `power` attribute.
    #[must_use]
    pub fn with_power(mut self, power: impl Into<String>) -> Self {
        self.power = Some(power.into());
        self
    }

    /// Look up a telemetry attribute by its vendor (camelCase) name.
    ///
    /// Returns `None` when the attribute is absent.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => map.remove(name),
            _ => None,
        }
    }
}

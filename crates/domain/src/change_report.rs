//! Change report — a webhook notification pushed by the vendor cloud.
//!
//! ```json
//! {
//!   "eventType": "changeReport",
//!   "eventVersion": "1",
//!   "context": {
//!     "deviceType": "WoPlugUS",
//!     "deviceMac": "6055F930FF22",
//!     "powerState": "ON",
//!     "timeOfSample": 1698720698088
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// A single state-change notification. Immutable once appended to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport {
    pub event_type: String,
    pub event_version: String,
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl ChangeReport {
    /// Device the report is about (`context.deviceMac`).
    #[must_use]
    pub fn device_mac(&self) -> Option<&str> {
        self.context.get("deviceMac").and_then(serde_json::Value::as_str)
    }

    /// Sample time in epoch milliseconds (`context.timeOfSample`).
    #[must_use]
    pub fn time_of_sample(&self) -> Option<i64> {
        self.context
            .get("timeOfSample")
            .and_then(serde_json::Value::as_i64)
    }
}

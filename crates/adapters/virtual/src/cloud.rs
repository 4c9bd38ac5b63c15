//! Simulated SwitchBot cloud.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use switchhub_app::ports::{Credentials, IotApi, IotError};
use switchhub_domain::change_report::ChangeReport;
use switchhub_domain::command::DevCtrlCommand;
use switchhub_domain::device::Device;
use switchhub_domain::status::Status;
use switchhub_domain::time;

use crate::catalog::VirtualCatalog;

/// Vendor status code for a command the device does not support.
const UNSUPPORTED_COMMAND: i64 = 160;

/// In-process [`IotApi`] serving a fixed device list.
///
/// Statuses live in memory: control commands change them and later status
/// reads observe the change. Devices outside the catalog are unknown.
///
/// Every power switch queues the change report the real cloud would push to
/// its webhook; [`take_change_reports`](Self::take_change_reports) hands them
/// over for delivery.
pub struct VirtualIotApi {
    devices: Vec<Device>,
    statuses: Mutex<HashMap<String, Status>>,
    webhooks: Mutex<Vec<(String, bool)>>,
    sent: Mutex<Vec<(String, DevCtrlCommand)>>,
    reports: Mutex<Vec<ChangeReport>>,
}

impl Default for VirtualIotApi {
    fn default() -> Self {
        Self::new(VirtualCatalog::default())
    }
}

impl VirtualIotApi {
    #[must_use]
    pub fn new(catalog: VirtualCatalog) -> Self {
        let statuses = catalog
            .devices
            .iter()
            .map(|device| {
                let status = catalog
                    .statuses
                    .iter()
                    .find(|s| s.device_id == device.device_id)
                    .cloned()
                    .unwrap_or_else(|| default_status(device));
                (device.device_id.clone(), status)
            })
            .collect();
        Self {
            devices: catalog.devices,
            statuses: Mutex::new(statuses),
            webhooks: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Webhook configuration requests received so far, as `(url, enabled)`.
    #[must_use]
    pub fn webhook_requests(&self) -> Vec<(String, bool)> {
        lock(&self.webhooks).clone()
    }

    /// Control commands accepted so far, as `(device id, command)`.
    #[must_use]
    pub fn sent_commands(&self) -> Vec<(String, DevCtrlCommand)> {
        lock(&self.sent).clone()
    }

    /// Drain the change reports queued since the last call, oldest first.
    #[must_use]
    pub fn take_change_reports(&self) -> Vec<ChangeReport> {
        std::mem::take(&mut *lock(&self.reports))
    }

    fn device(&self, dev_id: &str) -> Result<&Device, IotError> {
        self.devices
            .iter()
            .find(|d| d.device_id == dev_id)
            .ok_or_else(|| IotError::DeviceNotFound {
                dev_id: dev_id.to_string(),
            })
    }
}

fn default_status(device: &Device) -> Status {
    let hub = if device.hub_device_id.is_empty() {
        device.device_id.clone()
    } else {
        device.hub_device_id.clone()
    };
    Status::new(device.device_id.clone(), device.device_type.clone(), hub).with_power("off")
}

fn change_report(device: &Device, power: &str) -> ChangeReport {
    let mut context = Map::new();
    context.insert("deviceType".to_string(), Value::from(device.device_type.clone()));
    context.insert("deviceMac".to_string(), Value::from(device.device_id.clone()));
    context.insert("powerState".to_string(), Value::from(power.to_uppercase()));
    context.insert("timeOfSample".to_string(), Value::from(time::now_millis()));
    ChangeReport {
        event_type: "changeReport".to_string(),
        event_version: "1".to_string(),
        context,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl IotApi for VirtualIotApi {
    fn get_dev_list(&self, _credentials: Credentials<'_>) -> Result<Vec<Device>, IotError> {
        Ok(self.devices.clone())
    }

    fn get_dev_status(
        &self,
        _credentials: Credentials<'_>,
        dev_id: &str,
    ) -> Result<Status, IotError> {
        let device = self.device(dev_id)?;
        Ok(lock(&self.statuses)
            .get(dev_id)
            .cloned()
            .unwrap_or_else(|| default_status(device)))
    }

    #[tracing::instrument(skip(self, _credentials))]
    fn send_dev_ctrl_cmd(
        &self,
        _credentials: Credentials<'_>,
        dev_id: &str,
        command: &DevCtrlCommand,
    ) -> Result<(), IotError> {
        let device = self.device(dev_id)?;
        if command.command_type != "command" {
            return Err(IotError::Rejected {
                status_code: UNSUPPORTED_COMMAND,
                message: format!("command type {} is not supported", command.command_type),
            });
        }

        let mut statuses = lock(&self.statuses);
        let status = statuses
            .entry(dev_id.to_string())
            .or_insert_with(|| default_status(device));
        let power = match (command.command.as_str(), status.power.as_deref()) {
            ("turnOn", _) | ("toggle", Some("off")) => "on",
            ("turnOff" | "toggle", _) => "off",
            (other, _) => {
                return Err(IotError::Rejected {
                    status_code: UNSUPPORTED_COMMAND,
                    message: format!("command {other} is not supported"),
                });
            }
        };
        status.power = Some(power.to_string());
        drop(statuses);

        tracing::info!(power, "virtual device switched");
        lock(&self.sent).push((dev_id.to_string(), command.clone()));
        lock(&self.reports).push(change_report(device, power));
        Ok(())
    }

    fn update_webhook_config(
        &self,
        _credentials: Credentials<'_>,
        url: &str,
        enable: bool,
    ) -> Result<(), IotError> {
        tracing::info!(url, enable, "virtual webhook configured");
        lock(&self.webhooks).push((url.to_string(), enable));
        Ok(())
    }
}

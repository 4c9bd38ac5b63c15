//! In-memory fakes of the outbound ports, shared by unit tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use switchhub_domain::command::DevCtrlCommand;
use switchhub_domain::device::Device;
use switchhub_domain::id::UserId;
use switchhub_domain::status::Status;

use crate::error::AppError;
use crate::ports::{Credentials, IotApi, IotError, SubscriberNotifier};

/// Cloud knowing a fixed set of devices. Unknown devices are rejected.
#[derive(Default)]
pub(crate) struct FakeIot {
    devices: Vec<Device>,
    powers: Mutex<HashMap<String, String>>,
    sent: Mutex<Vec<(String, String)>>,
    webhooks: Mutex<Vec<String>>,
}

impl FakeIot {
    pub(crate) fn with_devices(devices: Vec<Device>) -> Self {
        Self {
            devices,
            ..Self::default()
        }
    }

    pub(crate) fn set_power(&self, dev_id: &str, power: &str) {
        self.powers
            .lock()
            .unwrap()
            .insert(dev_id.to_string(), power.to_string());
    }

    pub(crate) fn sent_commands(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn webhooks(&self) -> Vec<String> {
        self.webhooks.lock().unwrap().clone()
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

impl IotApi for FakeIot {
    fn get_dev_list(&self, _credentials: Credentials<'_>) -> Result<Vec<Device>, IotError> {
        Ok(self.devices.clone())
    }

    fn get_dev_status(
        &self,
        _credentials: Credentials<'_>,
        dev_id: &str,
    ) -> Result<Status, IotError> {
        let device = self.device(dev_id)?;
        let power = self
            .powers
            .lock()
            .unwrap()
            .get(dev_id)
            .cloned()
            .unwrap_or_else(|| "on".to_string());
        Ok(Status::new(dev_id, device.device_type.clone(), dev_id).with_power(power))
    }

    fn send_dev_ctrl_cmd(
        &self,
        _credentials: Credentials<'_>,
        dev_id: &str,
        command: &DevCtrlCommand,
    ) -> Result<(), IotError> {
        self.device(dev_id)?;
        self.sent
            .lock()
            .unwrap()
            .push((dev_id.to_string(), command.command.clone()));
        Ok(())
    }

    fn update_webhook_config(
        &self,
        _credentials: Credentials<'_>,
        url: &str,
        _enable: bool,
    ) -> Result<(), IotError> {
        self.webhooks.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// Notifier remembering what it was asked to deliver.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sync_requests: Mutex<Vec<UserId>>,
    state_reports: Mutex<Vec<(UserId, String)>>,
}

impl RecordingNotifier {
    pub(crate) fn sync_requests(&self) -> Vec<UserId> {
        self.sync_requests.lock().unwrap().clone()
    }

    pub(crate) fn state_reports(&self) -> Vec<(UserId, String)> {
        self.state_reports.lock().unwrap().clone()
    }
}

impl SubscriberNotifier for RecordingNotifier {
    fn request_sync(&self, uid: UserId, _subscribers: &BTreeSet<String>) -> Result<(), AppError> {
        self.sync_requests.lock().unwrap().push(uid);
        Ok(())
    }

    fn report_state(
        &self,
        uid: UserId,
        _subscribers: &BTreeSet<String>,
        status: &Status,
    ) -> Result<(), AppError> {
        self.state_reports
            .lock()
            .unwrap()
            .push((uid, status.device_id.clone()));
        Ok(())
    }
}

//! User — the aggregate root owning a SwitchBot account's devices.
//!
//! A user carries the vendor key pair, the reconciled device list, the latest
//! status per device, the append-only change-report log and the set of
//! third-party subscribers. Every mutation that other parts of the system may
//! react to queues an [`Event`]; the unit of work drains the queue after it
//! commits.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::change_report::ChangeReport;
use crate::command::DevCtrlCommand;
use crate::device::Device;
use crate::error::DomainError;
use crate::event::Event;
use crate::id::UserId;
use crate::status::Status;

/// Desired attributes per device, keyed by vendor attribute name.
pub type TargetState = BTreeMap<String, serde_json::Value>;

/// The user aggregate.
///
/// Serialized with the persisted field names (`userId`, `userSecret`, …).
/// Pending events are transient and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userId")]
    uid: UserId,
    #[serde(rename = "userSecret")]
    secret: String,
    #[serde(rename = "userToken")]
    token: String,
    #[serde(default)]
    devices: Vec<Device>,
    #[serde(default)]
    states: Vec<Status>,
    #[serde(default)]
    changes: Vec<ChangeReport>,
    #[serde(default)]
    scenes: Vec<String>,
    #[serde(default)]
    webhooks: Vec<String>,
    #[serde(default)]
    subscribers: BTreeSet<String>,
    #[serde(
        rename = "targetStates",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    target_state: BTreeMap<String, TargetState>,
    #[serde(skip)]
    events: Vec<Event>,
}

impl User {
    /// Create a freshly registered user with a generated id.
    ///
    /// Queues [`Event::UserRegistered`].
    #[must_use]
    pub fn register(secret: impl Into<String>, token: impl Into<String>) -> Self {
        let mut user = Self::with_id(UserId::new(), secret, token);
        user.events.push(Event::UserRegistered { uid: user.uid });
        user
    }

    /// Create an empty user with a known id, without queuing any event.
    #[must_use]
    pub fn with_id(uid: UserId, secret: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            uid,
            secret: secret.into(),
            token: token.into(),
            devices: Vec::new(),
            states: Vec::new(),
            changes: Vec::new(),
            scenes: Vec::new(),
            webhooks: Vec::new(),
            subscribers: BTreeSet::new(),
            target_state: BTreeMap::new(),
            events: Vec::new(),
        }
    }
}

// Query methods
impl User {
    #[must_use]
    pub fn uid(&self) -> UserId {
        self.uid
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    #[must_use]
    pub fn states(&self) -> &[Status] {
        &self.states
    }

    #[must_use]
    pub fn changes(&self) -> &[ChangeReport] {
        &self.changes
    }

    #[must_use]
    pub fn scenes(&self) -> &[String] {
        &self.scenes
    }

    #[must_use]
    pub fn webhooks(&self) -> &[String] {
        &self.webhooks
    }

    #[must_use]
    pub fn subscribers(&self) -> &BTreeSet<String> {
        &self.subscribers
    }

    /// Returns a device by id.
    #[must_use]
    pub fn device(&self, dev_id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.device_id == dev_id)
    }

    /// Returns the last known status of a device.
    #[must_use]
    pub fn dev_state(&self, dev_id: &str) -> Option<&Status> {
        self.states.iter().find(|s| s.device_id == dev_id)
    }

    /// Returns the attributes a sent command is expected to produce but no
    /// status report has confirmed yet.
    #[must_use]
    pub fn target_state(&self, dev_id: &str) -> Option<&TargetState> {
        self.target_state.get(dev_id)
    }

    #[must_use]
    pub fn is_subscribed(&self, subscriber_id: &str) -> bool {
        self.subscribers.contains(subscriber_id)
    }

    /// Returns the change report with the latest `timeOfSample` for a device.
    ///
    /// Reports without a sample time rank below every timed report; equal
    /// times resolve to the most recently appended report.
    #[must_use]
    pub fn get_dev_last_change_report(&self, dev_id: &str) -> Option<&ChangeReport> {
        self.changes
            .iter()
            .filter(|c| c.device_mac() == Some(dev_id))
            .max_by_key(|c| c.time_of_sample())
    }

    /// Events queued since the last drain, oldest first.
    #[must_use]
    pub fn pending_events(&self) -> &[Event] {
        &self.events
    }

    /// Drain the pending events in FIFO order.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

// Command methods (queue events)
impl User {
    /// Reconcile the device list against an authoritative one, diffing by
    /// `device_id`.
    ///
    /// Devices present on both sides are replaced when structurally different,
    /// devices only in `devices` are appended and devices missing from it are
    /// removed together with their status and target state. Always queues
    /// [`Event::UserDevListFetched`]; queues [`Event::UserDevListChanged`] as
    /// well when anything was added, updated or removed.
    pub fn request_sync(&mut self, devices: Vec<Device>) {
        let incoming: HashSet<String> = devices.iter().map(|d| d.device_id.clone()).collect();
        let mut changed = false;

        for device in devices {
            match self
                .devices
                .iter_mut()
                .find(|d| d.device_id == device.device_id)
            {
                Some(current) if *current == device => {}
                Some(current) => {
                    *current = device;
                    changed = true;
                }
                None => {
                    self.devices.push(device);
                    changed = true;
                }
            }
        }

        let before = self.devices.len();
        self.devices.retain(|d| incoming.contains(&d.device_id));
        if self.devices.len() != before {
            changed = true;
            self.states.retain(|s| incoming.contains(&s.device_id));
            self.target_state.retain(|dev_id, _| incoming.contains(dev_id));
        }

        self.events.push(Event::UserDevListFetched { uid: self.uid });
        if changed {
            self.events.push(Event::UserDevListChanged { uid: self.uid });
        }
    }

    /// Record the latest status of a device.
    ///
    /// A first status is stored silently, an identical one is ignored and a
    /// different one replaces the stored status and queues
    /// [`Event::UserDevStateChanged`]. Target attributes confirmed by the
    /// status are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeviceNotFound`] when the device is not in the
    /// device list.
    pub fn update_dev_state(&mut self, state: Status) -> Result<(), DomainError> {
        if self.device(&state.device_id).is_none() {
            return Err(DomainError::DeviceNotFound {
                dev_id: state.device_id,
            });
        }
        self.confirm_target_state(&state);

        match self
            .states
            .iter_mut()
            .find(|s| s.device_id == state.device_id)
        {
            None => self.states.push(state),
            Some(current) if *current == state => {}
            Some(current) => {
                let dev_id = state.device_id.clone();
                *current = state;
                self.events.push(Event::UserDevStateChanged {
                    uid: self.uid,
                    dev_id,
                });
            }
        }
        Ok(())
    }

    /// Append a change report and queue [`Event::UserDevReportChanged`].
    ///
    /// Change reports are never deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingDeviceMac`] when the report does not name
    /// its device.
    pub fn add_change_report(&mut self, change: ChangeReport) -> Result<(), DomainError> {
        let dev_id = change
            .device_mac()
            .ok_or(DomainError::MissingDeviceMac)?
            .to_string();
        self.changes.push(change.clone());
        self.events
            .push(Event::UserDevReportChanged { dev_id, change });
        Ok(())
    }

    /// Add a subscriber. Returns `false` if it was already subscribed.
    pub fn subscribe(&mut self, subscriber_id: impl Into<String>) -> bool {
        self.subscribers.insert(subscriber_id.into())
    }

    /// Remove a subscriber. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, subscriber_id: &str) -> bool {
        self.subscribers.remove(subscriber_id)
    }

    /// Remember the state a control command sent to a device should lead to.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DeviceNotFound`] for an unknown device and
    /// [`DomainError::UnsupportedCommand`] for anything other than
    /// `command/turnOn` and `command/turnOff`.
    pub fn set_dev_ctrl_cmd_sent(
        &mut self,
        dev_id: &str,
        cmd: &DevCtrlCommand,
    ) -> Result<(), DomainError> {
        if self.device(dev_id).is_none() {
            return Err(DomainError::DeviceNotFound {
                dev_id: dev_id.to_string(),
            });
        }
        let power = match (cmd.command_type.as_str(), cmd.command.as_str()) {
            ("command", "turnOn") => "on",
            ("command", "turnOff") => "off",
            _ => {
                return Err(DomainError::UnsupportedCommand {
                    command_type: cmd.command_type.clone(),
                    command: cmd.command.clone(),
                });
            }
        };
        self.target_state
            .entry(dev_id.to_string())
            .or_default()
            .insert("power".to_string(), serde_json::Value::from(power));
        Ok(())
    }

    /// Ask for the user's data to be downloaded again.
    pub fn request_reload(&mut self) {
        self.events.push(Event::UserRequestReload { uid: self.uid });
    }

    /// Signal that every device status was pulled after a list fetch.
    pub fn mark_states_all_fetched(&mut self) {
        self.events
            .push(Event::UserDevStatesAllFetched { uid: self.uid });
    }

    /// Point the user's webhook list at `uri`.
    pub fn set_webhook_uri(&mut self, uri: impl Into<String>) {
        self.webhooks = vec![uri.into()];
        self.events.push(Event::UserWebhookUpdated { uid: self.uid });
    }

    fn confirm_target_state(&mut self, state: &Status) {
        if let Some(targets) = self.target_state.get_mut(&state.device_id) {
            targets.retain(|attr, wanted| state.attribute(attr).as_ref() != Some(wanted));
            if targets.is_empty() {
                self.target_state.remove(&state.device_id);
            }
        }
    }
}

//! Commands — requests to change state, each handled by exactly one handler.
//!
//! Every command is its own struct so handlers can take exactly the payload
//! they need; [`Command`] wraps them for dispatch and [`CommandKind`] is the
//! key the message bus registers handlers under.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::change_report::ChangeReport;
use crate::device::Device;
use crate::id::UserId;
use crate::status::Status;

/// Vendor control command payload (`POST /v1.1/devices/{id}/commands`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevCtrlCommand {
    pub command_type: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<serde_json::Value>,
}

impl DevCtrlCommand {
    /// A plain `command` type command without parameter (`turnOn`, `turnOff`, …).
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            command_type: "command".to_string(),
            command: command.into(),
            parameter: None,
        }
    }
}

/// Register a SwitchBot account (secret/token key pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub secret: String,
    pub token: String,
}

/// Remove a registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unregister {
    pub uid: UserId,
}

/// A third-party consumer subscribes to the user's devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe {
    pub uid: UserId,
    pub subscriber_id: String,
}

/// A third-party consumer stops following the user's devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscribe {
    pub uid: UserId,
    pub subscriber_id: String,
}

/// Replace the user's device list with an authoritative one.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSync {
    pub uid: UserId,
    pub devices: Vec<Device>,
}

/// Record the latest status of one of the user's devices.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportState {
    pub uid: UserId,
    pub state: Status,
}

/// Record a webhook change report; the owner is found by `deviceMac`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportChange {
    pub change: ChangeReport,
}

/// Forward a control command from a subscriber to a device.
#[derive(Debug, Clone, PartialEq)]
pub struct SendDevCtrlCmd {
    pub uid: UserId,
    pub subscriber_id: String,
    pub dev_id: String,
    pub cmd_type: String,
    pub cmd_value: String,
    pub cmd_param: Option<serde_json::Value>,
}

impl SendDevCtrlCmd {
    /// The vendor payload for this command.
    #[must_use]
    pub fn ctrl_command(&self) -> DevCtrlCommand {
        DevCtrlCommand {
            command_type: self.cmd_type.clone(),
            command: self.cmd_value.clone(),
            parameter: self.cmd_param.clone(),
        }
    }
}

/// A subscriber unlinks the user (voice assistant account unlink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub uid: UserId,
    pub subscriber_id: String,
}

/// Implemented by every command payload so handlers can be registered per
/// concrete type.
pub trait CommandMessage: Sized {
    /// Registration key.
    const KIND: CommandKind;

    /// Borrow the payload back out of a [`Command`] of the same kind.
    fn from_command(command: &Command) -> Option<&Self>;
}

macro_rules! define_commands {
    ($($name:ident),* $(,)?) => {
        /// Any command accepted by the message bus.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Command {
            $($name($name),)*
        }

        /// Discriminant of a [`Command`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum CommandKind {
            $($name,)*
        }

        impl Command {
            /// The kind this command is dispatched under.
            #[must_use]
            pub fn kind(&self) -> CommandKind {
                match self {
                    $(Self::$name(_) => CommandKind::$name,)*
                }
            }
        }

        $(
            impl CommandMessage for $name {
                const KIND: CommandKind = CommandKind::$name;

                fn from_command(command: &Command) -> Option<&Self> {
                    match command {
                        Command::$name(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$name> for Command {
                fn from(value: $name) -> Self {
                    Self::$name(value)
                }
            }
        )*
    };
}

define_commands!(
    Register,
    Unregister,
    Subscribe,
    Unsubscribe,
    RequestSync,
    ReportState,
    ReportChange,
    SendDevCtrlCmd,
    Disconnect,
);

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

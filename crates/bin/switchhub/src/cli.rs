//! Command-line surface: one subcommand per bus command plus read-only
//! queries under `show`.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use switchhub_domain::command::{
    Command, Disconnect, Register, ReportChange, ReportState, RequestSync, SendDevCtrlCmd,
    Subscribe, Unregister, Unsubscribe,
};
use switchhub_domain::id::UserId;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[clap(
    name = "switchhub",
    version = env!("CARGO_PKG_VERSION"),
    about = "Bridge SwitchBot accounts to voice assistants"
)]
pub struct Cli {
    /// Configuration file.
    #[clap(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Store file, overriding the configuration.
    #[clap(long, global = true)]
    pub store: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a SwitchBot account by its key pair.
    Register {
        #[clap(long)]
        secret: String,
        #[clap(long)]
        token: String,
    },
    /// Remove a user.
    Unregister {
        #[clap(long)]
        uid: UserId,
    },
    /// Link a voice assistant to a user.
    Subscribe(SubscriberArgs),
    /// Unlink a voice assistant from a user.
    Unsubscribe(SubscriberArgs),
    /// A voice assistant reports the account unlinked.
    Disconnect(SubscriberArgs),
    /// Replace a user's device list with a vendor device list (JSON array).
    Sync {
        #[clap(long)]
        uid: UserId,
        /// JSON file, `-` for stdin.
        #[clap(long)]
        devices: PathBuf,
    },
    /// Store a device status (JSON object).
    ReportState {
        #[clap(long)]
        uid: UserId,
        /// JSON file, `-` for stdin.
        #[clap(long)]
        state: PathBuf,
    },
    /// Append a webhook change report (JSON object).
    ReportChange {
        /// JSON file, `-` for stdin.
        #[clap(long)]
        change: PathBuf,
    },
    /// Send a control command to a device on behalf of a subscriber.
    Send {
        #[clap(long)]
        uid: UserId,
        #[clap(long)]
        subscriber: String,
        #[clap(long)]
        device: String,
        #[clap(long)]
        command: String,
        #[clap(long, default_value = "command")]
        command_type: String,
        /// Command parameter as JSON.
        #[clap(long, value_parser = parse_json)]
        parameter: Option<serde_json::Value>,
    },
    /// Query the store without changing it.
    #[clap(subcommand)]
    Show(Show),
}

#[derive(clap::Args, Debug)]
pub struct SubscriberArgs {
    #[clap(long)]
    pub uid: UserId,
    #[clap(long)]
    pub subscriber: String,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Show {
    /// Every user.
    Users,
    /// One user, by id or by secret.
    User {
        #[clap(long, conflicts_with = "secret", required_unless_present = "secret")]
        uid: Option<UserId>,
        #[clap(long)]
        secret: Option<String>,
    },
    /// Devices of a user.
    Devices {
        #[clap(long)]
        uid: UserId,
    },
    /// Last known status of a device.
    State {
        #[clap(long)]
        uid: UserId,
        #[clap(long)]
        device: String,
    },
    /// Latest change report of a device.
    LastChange {
        #[clap(long)]
        device: String,
    },
}

/// What a parsed subcommand asks for.
#[derive(Debug)]
pub enum Action {
    Dispatch(Command),
    Show(Show),
}

impl Commands {
    /// Resolve the subcommand, reading any JSON payload it points at.
    ///
    /// # Errors
    ///
    /// Returns an error when a payload file cannot be read or parsed.
    pub fn into_action(self) -> anyhow::Result<Action> {
        let command: Command = match self {
            Self::Register { secret, token } => Register { secret, token }.into(),
            Self::Unregister { uid } => Unregister { uid }.into(),
            Self::Subscribe(args) => Subscribe {
                uid: args.uid,
                subscriber_id: args.subscriber,
            }
            .into(),
            Self::Unsubscribe(args) => Unsubscribe {
                uid: args.uid,
                subscriber_id: args.subscriber,
            }
            .into(),
            Self::Disconnect(args) => Disconnect {
                uid: args.uid,
                subscriber_id: args.subscriber,
            }
            .into(),
            Self::Sync { uid, devices } => RequestSync {
                uid,
                devices: read_json(&devices)?,
            }
            .into(),
            Self::ReportState { uid, state } => ReportState {
                uid,
                state: read_json(&state)?,
            }
            .into(),
            Self::ReportChange { change } => ReportChange {
                change: read_json(&change)?,
            }
            .into(),
            Self::Send {
                uid,
                subscriber,
                device,
                command,
                command_type,
                parameter,
            } => SendDevCtrlCmd {
                uid,
                subscriber_id: subscriber,
                dev_id: device,
                cmd_type: command_type,
                cmd_value: command,
                cmd_param: parameter,
            }
            .into(),
            Self::Show(query) => return Ok(Action::Show(query)),
        };
        Ok(Action::Dispatch(command))
    }
}

fn parse_json(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(raw)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("unable to read stdin")?;
        raw
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

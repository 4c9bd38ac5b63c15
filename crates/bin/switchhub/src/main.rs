//! # switchhub — command-line bridge
//!
//! Composition root that wires all adapters together and dispatches one
//! command per invocation.
//!
//! ## Responsibilities
//! - Parse configuration (CLI args, env vars, config file)
//! - Initialize logging
//! - Construct the JSON store unit of work, the simulated cloud and the
//!   notifier (adapters)
//! - Build the message bus with its registration table
//! - Dispatch the requested command or run the requested query, printing
//!   JSON on stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod cli;
mod config;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use switchhub_adapter_storage_json::JsonFileUnitOfWork;
use switchhub_adapter_virtual::{LogNotifier, VirtualCatalog, VirtualIotApi};
use switchhub_app::bootstrap::Bootstrap;
use switchhub_app::ports::UnitOfWork;
use switchhub_app::views;
use switchhub_domain::command::{Command, ReportChange};

use crate::cli::{Action, Cli, Show};
use crate::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("unable to load {}", cli.config.display()))?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }
    init_tracing(&config.logging.filter);

    // Adapters
    let uow = JsonFileUnitOfWork::new(&config.store.path);
    let iot = match &config.virtual_cloud.catalog {
        Some(path) => VirtualIotApi::new(VirtualCatalog::load(path)?),
        None => VirtualIotApi::default(),
    };

    // Bus
    let mut bus = Bootstrap::new(uow, iot, LogNotifier)
        .webhook_url(config.webhook.url)
        .max_dispatch(config.bus.max_dispatch)
        .build();

    let output = match cli.command.into_action()? {
        Action::Dispatch(command) => {
            let kind = command.kind();
            let secret = match &command {
                Command::Register(register) => Some(register.secret.clone()),
                _ => None,
            };
            let mut events = bus
                .handle(command)
                .with_context(|| format!("{kind:?} failed"))?;
            tracing::debug!(command = ?kind, events = events.len(), "command handled");

            // webhook deliveries from the simulated cloud
            for change in bus.context().iot.take_change_reports() {
                match bus.handle(Command::from(ReportChange { change })) {
                    Ok(delivered) => events.extend(delivered),
                    Err(err) => tracing::warn!(error = %err, "change report rejected"),
                }
            }

            match secret {
                Some(secret) => {
                    serde_json::to_value(views::user_by_secret(&mut bus.context_mut().uow, &secret)?)?
                }
                None => serde_json::json!({
                    "command": format!("{kind:?}"),
                    "events": events
                        .iter()
                        .map(|event| format!("{:?}", event.kind()))
                        .collect::<Vec<_>>(),
                }),
            }
        }
        Action::Show(query) => show(&mut bus.context_mut().uow, query)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn show<U: UnitOfWork>(uow: &mut U, query: Show) -> anyhow::Result<serde_json::Value> {
    let value = match query {
        Show::Users => serde_json::to_value(views::users(uow)?)?,
        Show::User {
            uid: Some(uid), ..
        } => serde_json::to_value(views::user_by_uid(uow, uid)?)?,
        Show::User { secret, .. } => {
            let secret = secret.unwrap_or_default();
            serde_json::to_value(views::user_by_secret(uow, &secret)?)?
        }
        Show::Devices { uid } => serde_json::to_value(views::devices(uow, uid)?)?,
        Show::State { uid, device } => {
            serde_json::to_value(views::device_state(uow, uid, &device)?)?
        }
        Show::LastChange { device } => {
            serde_json::to_value(views::last_change_report(uow, &device)?)?
        }
    };
    Ok(value)
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

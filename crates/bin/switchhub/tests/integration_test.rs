//! End-to-end tests for the full switchhub stack.
//!
//! Each test wires the complete application (JSON store on a temporary
//! directory, simulated cloud, recording notifier, real message bus) and
//! drives it through commands, checking what lands in the store file.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

use switchhub_adapter_storage_json::JsonFileUnitOfWork;
use switchhub_adapter_virtual::{Notification, RecordingNotifier, VirtualCatalog, VirtualIotApi};
use switchhub_app::bootstrap::{Bootstrap, SwitchHubBus};
use switchhub_app::error::AppError;
use switchhub_app::ports::{Credentials, IotApi};
use switchhub_app::views;
use switchhub_domain::command::{
    Command, Register, ReportChange, ReportState, RequestSync, SendDevCtrlCmd, Subscribe,
};
use switchhub_domain::device::Device;
use switchhub_domain::event::EventKind;
use switchhub_domain::id::UserId;

type Bus = SwitchHubBus<JsonFileUnitOfWork, VirtualIotApi, RecordingNotifier>;

const WEBHOOK_URL: &str = "https://hub.example.com/change";

/// Build a fully-wired bus over `store.json` inside `dir`.
fn app(dir: &TempDir, catalog: VirtualCatalog) -> Bus {
    Bootstrap::new(
        JsonFileUnitOfWork::new(store_path(dir)),
        VirtualIotApi::new(catalog),
        RecordingNotifier::default(),
    )
    .webhook_url(WEBHOOK_URL)
    .build()
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("store.json")
}

fn swap_path(path: &Path) -> PathBuf {
    path.with_file_name("store.json.swp")
}

fn register(bus: &mut Bus, secret: &str) -> UserId {
    bus.handle(Command::from(Register {
        secret: secret.to_string(),
        token: "t1".to_string(),
    }))
    .unwrap();
    views::user_by_secret(&mut bus.context_mut().uow, secret)
        .unwrap()
        .unwrap()
        .uid
}

fn stored(dir: &TempDir) -> Value {
    serde_json::from_slice(&fs::read(store_path(dir)).unwrap()).unwrap()
}

fn plugs() -> Vec<Device> {
    serde_json::from_value(json!([
        {
            "deviceId": "6055F92FCFD2",
            "deviceName": "小風扇開關",
            "deviceType": "Plug Mini (US)",
            "enableCloudService": true,
            "hubDeviceId": ""
        },
        {
            "deviceId": "6055F930FF22",
            "deviceName": "風扇開關",
            "deviceType": "Plug Mini (US)",
            "enableCloudService": true,
            "hubDeviceId": ""
        }
    ]))
    .unwrap()
}

fn plug_state() -> Value {
    json!({
        "deviceId": "6055F92FCFD2",
        "deviceType": "Plug Mini (US)",
        "hubDeviceId": "6055F92FCFD2",
        "power": "off",
        "version": "V1.4-1.4",
        "voltage": 112.2,
        "weight": 0.0,
        "electricityOfDay": 43,
        "electricCurrent": 0.0
    })
}

// ---------------------------------------------------------------------------
// Store round trip
// ---------------------------------------------------------------------------

#[test]
fn should_persist_registered_user_synced_devices_and_reported_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::empty());
    let uid = register(&mut bus, "s1");

    bus.handle(Command::from(RequestSync {
        uid,
        devices: plugs(),
    }))
    .unwrap();

    let store = stored(&dir);
    assert_eq!(store.as_array().unwrap().len(), 1);
    assert_eq!(store[0]["userId"], json!(uid.to_string()));
    assert_eq!(store[0]["userSecret"], json!("s1"));
    assert_eq!(store[0]["devices"].as_array().unwrap().len(), 2);
    assert_eq!(store[0]["devices"][0]["deviceName"], json!("小風扇開關"));
    assert_eq!(store[0]["devices"][1]["deviceName"], json!("風扇開關"));
    assert_eq!(store[0]["states"].as_array().unwrap().len(), 0);

    bus.handle(Command::from(ReportState {
        uid,
        state: serde_json::from_value(plug_state()).unwrap(),
    }))
    .unwrap();

    let store = stored(&dir);
    assert_eq!(store[0]["states"], json!([plug_state()]));
}

#[test]
fn should_see_committed_users_from_a_fresh_bus() {
    let dir = tempfile::tempdir().unwrap();
    let uid = register(&mut app(&dir, VirtualCatalog::empty()), "s1");

    let mut reopened = app(&dir, VirtualCatalog::empty());
    let summary = views::user_by_uid(&mut reopened.context_mut().uow, uid)
        .unwrap()
        .unwrap();

    assert_eq!(summary.uid, uid);
    assert!(!swap_path(&store_path(&dir)).exists());
}

#[test]
fn should_keep_one_user_per_secret() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::empty());
    let uid = register(&mut bus, "s1");

    let handled = bus
        .handle(Command::from(Register {
            secret: "s1".to_string(),
            token: "t2".to_string(),
        }))
        .unwrap();

    assert_eq!(handled[0].kind(), EventKind::UserRequestReload);
    let users = views::users(&mut bus.context_mut().uow).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].uid, uid);
}

// ---------------------------------------------------------------------------
// Rollback
// ---------------------------------------------------------------------------

#[test]
fn should_leave_store_byte_identical_when_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::empty());
    let uid = register(&mut bus, "s1");
    let before = fs::read(store_path(&dir)).unwrap();

    let result = bus.handle(Command::from(ReportState {
        uid,
        state: serde_json::from_value(plug_state()).unwrap(),
    }));

    assert!(matches!(result, Err(AppError::Domain(_))));
    assert_eq!(fs::read(store_path(&dir)).unwrap(), before);
    assert!(!swap_path(&store_path(&dir)).exists());
}

#[test]
fn should_reject_change_report_for_unknown_device() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::empty());
    register(&mut bus, "s1");
    let before = fs::read(store_path(&dir)).unwrap();

    let result = bus.handle(Command::from(ReportChange {
        change: serde_json::from_value(json!({
            "eventType": "changeReport",
            "eventVersion": "1",
            "context": {"deviceMac": "UNKNOWN", "powerState": "ON", "timeOfSample": 1}
        }))
        .unwrap(),
    }));

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(fs::read(store_path(&dir)).unwrap(), before);
}

// ---------------------------------------------------------------------------
// Cascade against the simulated cloud
// ---------------------------------------------------------------------------

#[test]
fn should_load_devices_states_and_webhook_on_register() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::demo());

    let handled = bus
        .handle(Command::from(Register {
            secret: "s1".to_string(),
            token: "t1".to_string(),
        }))
        .unwrap();

    let kinds: Vec<EventKind> = handled.iter().map(|event| event.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::UserRegistered,
            EventKind::UserDevListFetched,
            EventKind::UserDevListChanged,
            EventKind::UserDevStatesAllFetched,
            EventKind::UserWebhookUpdated,
        ]
    );
    let store = stored(&dir);
    assert_eq!(store[0]["devices"].as_array().unwrap().len(), 2);
    assert_eq!(store[0]["states"][0], plug_state());
    assert_eq!(store[0]["webhooks"], json!([WEBHOOK_URL]));
    assert_eq!(
        bus.context().iot.webhook_requests(),
        vec![(WEBHOOK_URL.to_string(), true)]
    );
}

#[test]
fn should_refresh_state_after_change_report() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::demo());
    let uid = register(&mut bus, "s1");
    bus.handle(Command::from(Subscribe {
        uid,
        subscriber_id: "aog".to_string(),
    }))
    .unwrap();
    let credentials = Credentials {
        secret: "s1",
        token: "t1",
    };
    bus.context()
        .iot
        .send_dev_ctrl_cmd(
            credentials,
            "6055F92FCFD2",
            &switchhub_domain::command::DevCtrlCommand::command("turnOn"),
        )
        .unwrap();

    bus.handle(Command::from(ReportChange {
        change: serde_json::from_value(json!({
            "eventType": "changeReport",
            "eventVersion": "1",
            "context": {
                "deviceType": "WoPlugUS",
                "deviceMac": "6055F92FCFD2",
                "powerState": "ON",
                "timeOfSample": 1_698_720_698_088_i64
            }
        }))
        .unwrap(),
    }))
    .unwrap();

    let state = views::device_state(&mut bus.context_mut().uow, uid, "6055F92FCFD2")
        .unwrap()
        .unwrap();
    assert_eq!(state.power.as_deref(), Some("on"));
    let last = views::last_change_report(&mut bus.context_mut().uow, "6055F92FCFD2")
        .unwrap()
        .unwrap();
    assert_eq!(last.time_of_sample(), Some(1_698_720_698_088));
    assert!(bus.context().notifier.notifications().iter().any(|n| matches!(
        n,
        Notification::ReportState { status, .. } if status.device_id == "6055F92FCFD2"
    )));
}

#[test]
fn should_switch_virtual_device_when_subscriber_sends_command() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::demo());
    let uid = register(&mut bus, "s1");
    bus.handle(Command::from(Subscribe {
        uid,
        subscriber_id: "aog".to_string(),
    }))
    .unwrap();

    bus.handle(Command::from(SendDevCtrlCmd {
        uid,
        subscriber_id: "aog".to_string(),
        dev_id: "6055F930FF22".to_string(),
        cmd_type: "command".to_string(),
        cmd_value: "turnOff".to_string(),
        cmd_param: None,
    }))
    .unwrap();

    let iot = &bus.context().iot;
    assert_eq!(iot.sent_commands().len(), 1);
    let status = iot
        .get_dev_status(
            Credentials {
                secret: "s1",
                token: "t1",
            },
            "6055F930FF22",
        )
        .unwrap();
    assert_eq!(status.power.as_deref(), Some("off"));
    assert_eq!(
        stored(&dir)[0]["targetStates"]["6055F930FF22"]["power"],
        json!("off")
    );
}

#[test]
fn should_refuse_command_from_unknown_subscriber() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::demo());
    let uid = register(&mut bus, "s1");
    let before = fs::read(store_path(&dir)).unwrap();

    let result = bus.handle(Command::from(SendDevCtrlCmd {
        uid,
        subscriber_id: "alexa".to_string(),
        dev_id: "6055F930FF22".to_string(),
        cmd_type: "command".to_string(),
        cmd_value: "turnOn".to_string(),
        cmd_param: None,
    }));

    assert!(matches!(result, Err(AppError::SubscriberNotFound { .. })));
    assert!(bus.context().iot.sent_commands().is_empty());
    assert_eq!(fs::read(store_path(&dir)).unwrap(), before);
}

#[test]
fn should_clear_target_state_once_webhook_report_confirms_it() {
    let dir = tempfile::tempdir().unwrap();
    let mut bus = app(&dir, VirtualCatalog::demo());
    let uid = register(&mut bus, "s1");
    bus.handle(Command::from(Subscribe {
        uid,
        subscriber_id: "aog".to_string(),
    }))
    .unwrap();
    bus.handle(Command::from(SendDevCtrlCmd {
        uid,
        subscriber_id: "aog".to_string(),
        dev_id: "6055F930FF22".to_string(),
        cmd_type: "command".to_string(),
        cmd_value: "turnOff".to_string(),
        cmd_param: None,
    }))
    .unwrap();

    for change in bus.context().iot.take_change_reports() {
        bus.handle(Command::from(ReportChange { change })).unwrap();
    }

    let store = stored(&dir);
    assert!(store[0].get("targetStates").is_none());
    assert_eq!(store[0]["changes"].as_array().unwrap().len(), 1);
    let state = views::device_state(&mut bus.context_mut().uow, uid, "6055F930FF22")
        .unwrap()
        .unwrap();
    assert_eq!(state.power.as_deref(), Some("off"));
    assert_eq!(
        bus.context().notifier.notifications().last(),
        Some(&Notification::ReportState {
            uid,
            subscribers: vec!["aog".to_string()],
            status: state,
        })
    );
}

//! Command and event handlers.
//!
//! Every handler runs one transaction through the [`UnitOfWork`] it is given
//! and returns the events the touched aggregates queued, collected after the
//! commit. Collaborators (`iot`, `notifier`, the webhook URL) are passed in
//! explicitly; [`bootstrap`](crate::bootstrap) decides which handler gets
//! which.

use switchhub_domain::command::{
    Disconnect, Register, ReportChange, ReportState, RequestSync, SendDevCtrlCmd, Subscribe,
    Unregister, Unsubscribe,
};
use switchhub_domain::error::DomainError;
use switchhub_domain::event::Event;
use switchhub_domain::id::UserId;
use switchhub_domain::time;
use switchhub_domain::user::User;

use crate::error::{AppError, NotFoundError};
use crate::ports::{Credentials, IotApi, SubscriberNotifier, UnitOfWork, UserRepository};

fn unexpected(event: &Event) -> AppError {
    AppError::UnexpectedMessage(event.kind().to_string())
}

fn device_not_found(dev_id: &str) -> AppError {
    NotFoundError {
        entity: "Device",
        id: dev_id.to_string(),
    }
    .into()
}

fn user_mut<R: UserRepository>(users: &mut R, uid: UserId) -> Result<&mut User, AppError> {
    users
        .get_by_uid(uid)
        .ok_or_else(|| AppError::user_not_found(uid))
}

// ── Commands ────────────────────────────────────────────────────────

/// Register a key pair. A secret already in use reloads its user instead of
/// creating a second one.
///
/// # Errors
///
/// Returns a storage error from the unit of work.
#[tracing::instrument(skip_all)]
pub fn register<U: UnitOfWork>(cmd: &Register, uow: &mut U) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        if let Some(user) = users.get_by_secret(&cmd.secret) {
            tracing::warn!(uid = %user.uid(), "secret already registered, reloading user");
            user.request_reload();
        } else {
            let user = User::register(cmd.secret.clone(), cmd.token.clone());
            tracing::info!(uid = %user.uid(), "user registered");
            users.add(user);
        }
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Delete a user.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist.
#[tracing::instrument(skip(uow))]
pub fn unregister<U: UnitOfWork>(cmd: &Unregister, uow: &mut U) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        users
            .delete(cmd.uid)
            .map(|_| ())
            .ok_or_else(|| AppError::user_not_found(cmd.uid))
    })?;
    Ok(uow.collect_new_events())
}

/// Link a subscriber to a user.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist.
#[tracing::instrument(skip(uow))]
pub fn subscribe<U: UnitOfWork>(cmd: &Subscribe, uow: &mut U) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        user_mut(users, cmd.uid)?.subscribe(cmd.subscriber_id.clone());
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Unlink a subscriber from a user.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist.
#[tracing::instrument(skip(uow))]
pub fn unsubscribe<U: UnitOfWork>(
    cmd: &Unsubscribe,
    uow: &mut U,
) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        user_mut(users, cmd.uid)?.unsubscribe(&cmd.subscriber_id);
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Unlink a subscriber; an unknown user is not an error.
///
/// # Errors
///
/// Returns a storage error from the unit of work.
#[tracing::instrument(skip(uow))]
pub fn disconnect<U: UnitOfWork>(cmd: &Disconnect, uow: &mut U) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        match users.get_by_uid(cmd.uid) {
            Some(user) => {
                user.unsubscribe(&cmd.subscriber_id);
            }
            None => tracing::debug!("user already gone"),
        }
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Reconcile a user's devices against the given list.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist.
#[tracing::instrument(skip_all, fields(uid = %cmd.uid, devices = cmd.devices.len()))]
pub fn request_sync<U: UnitOfWork>(
    cmd: &RequestSync,
    uow: &mut U,
) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        user_mut(users, cmd.uid)?.request_sync(cmd.devices.clone());
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Record a device status reported for a user.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist and
/// [`DomainError::DeviceNotFound`] when the device is not the user's.
#[tracing::instrument(skip_all, fields(uid = %cmd.uid, dev_id = %cmd.state.device_id))]
pub fn report_state<U: UnitOfWork>(
    cmd: &ReportState,
    uow: &mut U,
) -> Result<Vec<Event>, AppError> {
    uow.transaction(|users| {
        user_mut(users, cmd.uid)?.update_dev_state(cmd.state.clone())?;
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Record a webhook change report on the user owning the device.
///
/// # Errors
///
/// Returns [`DomainError::MissingDeviceMac`] when the report names no device
/// and [`AppError::NotFound`] when no user owns it.
#[tracing::instrument(skip_all, fields(dev_id = cmd.change.device_mac()))]
pub fn report_change<U: UnitOfWork>(
    cmd: &ReportChange,
    uow: &mut U,
) -> Result<Vec<Event>, AppError> {
    let dev_id = cmd
        .change
        .device_mac()
        .ok_or(DomainError::MissingDeviceMac)?;
    uow.transaction(|users| {
        let user = users
            .get_by_dev_id(dev_id)
            .ok_or_else(|| device_not_found(dev_id))?;
        user.add_change_report(cmd.change.clone())?;
        Ok(())
    })?;
    tracing::debug!(
        sampled_at = cmd
            .change
            .time_of_sample()
            .and_then(time::sample_time_rfc3339)
            .as_deref(),
        "change report recorded"
    );
    Ok(uow.collect_new_events())
}

/// Forward a subscriber's control command to the IoT cloud.
///
/// The target state is recorded before the command is sent, so a rejected
/// command leaves nothing behind.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown user,
/// [`AppError::SubscriberNotFound`] when the subscriber is not linked, a
/// [`DomainError`] for an unknown device or unsupported command, and the
/// IoT error when the cloud refuses it.
#[tracing::instrument(skip_all, fields(uid = %cmd.uid, dev_id = %cmd.dev_id))]
pub fn send_dev_ctrl_cmd<U: UnitOfWork, I: IotApi>(
    cmd: &SendDevCtrlCmd,
    uow: &mut U,
    iot: &I,
) -> Result<Vec<Event>, AppError> {
    let command = cmd.ctrl_command();
    uow.transaction(|users| {
        let user = user_mut(users, cmd.uid)?;
        if !user.is_subscribed(&cmd.subscriber_id) {
            return Err(AppError::SubscriberNotFound {
                subscriber_id: cmd.subscriber_id.clone(),
            });
        }
        user.set_dev_ctrl_cmd_sent(&cmd.dev_id, &command)?;
        iot.send_dev_ctrl_cmd(Credentials::from(&*user), &cmd.dev_id, &command)?;
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

// ── Events ──────────────────────────────────────────────────────────

/// Pull the device list of a newly registered (or reloaded) user.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown user or the IoT error.
#[tracing::instrument(skip_all, fields(event = %event.kind()))]
pub fn fetch_dev_list<U: UnitOfWork, I: IotApi>(
    event: &Event,
    uow: &mut U,
    iot: &I,
) -> Result<Vec<Event>, AppError> {
    let (Event::UserRegistered { uid } | Event::UserRequestReload { uid }) = event else {
        return Err(unexpected(event));
    };
    uow.transaction(|users| {
        let user = user_mut(users, *uid)?;
        let devices = iot.get_dev_list(Credentials::from(&*user))?;
        user.request_sync(devices);
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Pull the status of every device after a device-list fetch.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown user or the first IoT error;
/// no status is kept in that case.
#[tracing::instrument(skip_all, fields(event = %event.kind()))]
pub fn fetch_dev_all_states<U: UnitOfWork, I: IotApi>(
    event: &Event,
    uow: &mut U,
    iot: &I,
) -> Result<Vec<Event>, AppError> {
    let Event::UserDevListFetched { uid } = event else {
        return Err(unexpected(event));
    };
    uow.transaction(|users| {
        let user = user_mut(users, *uid)?;
        let dev_ids: Vec<String> = user.devices().iter().map(|d| d.device_id.clone()).collect();
        for dev_id in dev_ids {
            let status = iot.get_dev_status(Credentials::from(&*user), &dev_id)?;
            user.update_dev_state(status)?;
        }
        user.mark_states_all_fetched();
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Enable the vendor webhook once the user's data is fully loaded.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown user or the IoT error.
#[tracing::instrument(skip_all, fields(event = %event.kind()))]
pub fn setup_webhook<U: UnitOfWork, I: IotApi>(
    event: &Event,
    uow: &mut U,
    iot: &I,
    webhook_url: &str,
) -> Result<Vec<Event>, AppError> {
    let Event::UserDevStatesAllFetched { uid } = event else {
        return Err(unexpected(event));
    };
    uow.transaction(|users| {
        let user = user_mut(users, *uid)?;
        iot.update_webhook_config(Credentials::from(&*user), webhook_url, true)?;
        user.set_webhook_uri(webhook_url);
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Refresh a device's status after the cloud reported a change for it.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when no user owns the device, the IoT error
/// or a [`DomainError`].
#[tracing::instrument(skip_all, fields(event = %event.kind()))]
pub fn refresh_reported_dev_state<U: UnitOfWork, I: IotApi>(
    event: &Event,
    uow: &mut U,
    iot: &I,
) -> Result<Vec<Event>, AppError> {
    let Event::UserDevReportChanged { dev_id, .. } = event else {
        return Err(unexpected(event));
    };
    uow.transaction(|users| {
        let user = users
            .get_by_dev_id(dev_id)
            .ok_or_else(|| device_not_found(dev_id))?;
        let status = iot.get_dev_status(Credentials::from(&*user), dev_id)?;
        user.update_dev_state(status)?;
        Ok(())
    })?;
    Ok(uow.collect_new_events())
}

/// Ask the user's subscribers to resync after the device list changed.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown user or the notifier error.
#[tracing::instrument(skip_all, fields(event = %event.kind()))]
pub fn notify_dev_list_changed<U: UnitOfWork, N: SubscriberNotifier>(
    event: &Event,
    uow: &mut U,
    notifier: &N,
) -> Result<Vec<Event>, AppError> {
    let Event::UserDevListChanged { uid } = event else {
        return Err(unexpected(event));
    };
    let subscribers = uow
        .read(|users| users.find_by_uid(*uid).map(|u| u.subscribers().clone()))?
        .ok_or_else(|| AppError::user_not_found(uid))?;
    if subscribers.is_empty() {
        tracing::debug!("no subscriber to notify");
    } else {
        notifier.request_sync(*uid, &subscribers)?;
    }
    Ok(Vec::new())
}

/// Push a device's new status to the user's subscribers.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] for an unknown user or device, or the
/// notifier error.
#[tracing::instrument(skip_all, fields(event = %event.kind()))]
pub fn report_dev_state<U: UnitOfWork, N: SubscriberNotifier>(
    event: &Event,
    uow: &mut U,
    notifier: &N,
) -> Result<Vec<Event>, AppError> {
    let Event::UserDevStateChanged { uid, dev_id } = event else {
        return Err(unexpected(event));
    };
    let (subscribers, status) = uow
        .read(|users| {
            users
                .find_by_uid(*uid)
                .map(|u| (u.subscribers().clone(), u.dev_state(dev_id).cloned()))
        })?
        .ok_or_else(|| AppError::user_not_found(uid))?;
    let status = status.ok_or_else(|| device_not_found(dev_id))?;
    if subscribers.is_empty() {
        tracing::debug!("no subscriber to notify");
    } else {
        notifier.report_state(*uid, &subscribers, &status)?;
    }
    Ok(Vec::new())
}

/// Log that the vendor webhook now points at this service.
///
/// # Errors
///
/// Returns [`AppError::UnexpectedMessage`] for any other event.
pub fn log_webhook_updated(event: &Event) -> Result<Vec<Event>, AppError> {
    let Event::UserWebhookUpdated { uid } = event else {
        return Err(unexpected(event));
    };
    tracing::info!(%uid, "webhook configured");
    Ok(Vec::new())
}

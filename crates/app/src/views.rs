//! Read side — queries the presentation layer runs against the store.
//!
//! Views open a transaction, read and roll back; they never mutate and never
//! mark aggregates as seen.

use serde::Serialize;

use switchhub_domain::change_report::ChangeReport;
use switchhub_domain::device::Device;
use switchhub_domain::id::UserId;
use switchhub_domain::status::Status;
use switchhub_domain::user::User;

use crate::error::AppError;
use crate::ports::{UnitOfWork, UserRepository};

/// What a user looks like from the outside. Never exposes the key pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub uid: UserId,
    pub devices: usize,
    pub states: usize,
    pub changes: usize,
    pub subscribers: Vec<String>,
    pub webhooks: Vec<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid(),
            devices: user.devices().len(),
            states: user.states().len(),
            changes: user.changes().len(),
            subscribers: user.subscribers().iter().cloned().collect(),
            webhooks: user.webhooks().to_vec(),
        }
    }
}

/// Every user.
///
/// # Errors
///
/// Returns a storage error from the unit of work.
pub fn users<U: UnitOfWork>(uow: &mut U) -> Result<Vec<UserSummary>, AppError> {
    uow.read(|users| users.list().into_iter().map(UserSummary::from).collect())
}

/// A user by id.
///
/// # Errors
///
/// Returns a storage error from the unit of work.
pub fn user_by_uid<U: UnitOfWork>(
    uow: &mut U,
    uid: UserId,
) -> Result<Option<UserSummary>, AppError> {
    uow.read(|users| users.find_by_uid(uid).map(UserSummary::from))
}

/// A user by vendor secret.
///
/// # Errors
///
/// Returns a storage error from the unit of work.
pub fn user_by_secret<U: UnitOfWork>(
    uow: &mut U,
    secret: &str,
) -> Result<Option<UserSummary>, AppError> {
    uow.read(|users| users.find_by_secret(secret).map(UserSummary::from))
}

/// The device list of a user.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist.
pub fn devices<U: UnitOfWork>(uow: &mut U, uid: UserId) -> Result<Vec<Device>, AppError> {
    uow.read(|users| users.find_by_uid(uid).map(|u| u.devices().to_vec()))?
        .ok_or_else(|| AppError::user_not_found(uid))
}

/// The last known status of one of a user's devices.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the user does not exist.
pub fn device_state<U: UnitOfWork>(
    uow: &mut U,
    uid: UserId,
    dev_id: &str,
) -> Result<Option<Status>, AppError> {
    uow.read(|users| {
        users
            .find_by_uid(uid)
            .map(|u| u.dev_state(dev_id).cloned())
    })?
    .ok_or_else(|| AppError::user_not_found(uid))
}

/// The change report with the latest sample time for a device, whoever owns
/// it.
///
/// # Errors
///
/// Returns a storage error from the unit of work.
pub fn last_change_report<U: UnitOfWork>(
    uow: &mut U,
    dev_id: &str,
) -> Result<Option<ChangeReport>, AppError> {
    uow.read(|users| {
        users
            .find_by_dev_id(dev_id)
            .and_then(|u| u.get_dev_last_change_report(dev_id).cloned())
    })
}

//! Swap-file [`UnitOfWork`] over a [`JsonFileRepository`].

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use switchhub_app::error::AppError;
use switchhub_app::ports::{TransactionState, UnitOfWork, UserRepository};
use switchhub_domain::event::Event;

use crate::error::StorageError;
use crate::repository::JsonFileRepository;

/// Unit of work persisting to a JSON file.
///
/// `begin` copies the live file to `<file>.swp`. `commit` rewrites the live
/// file and removes the swap copy, rolling back when the write fails;
/// `rollback` moves the swap copy back, or removes a live file that did not
/// exist when the transaction began.
///
/// There is no locking: two units of work over the same file must not be
/// open at the same time.
#[derive(Debug)]
pub struct JsonFileUnitOfWork {
    path: PathBuf,
    swap_path: PathBuf,
    users: Option<JsonFileRepository>,
    existed_at_begin: bool,
    state: TransactionState,
}

fn swap_path_of(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, ToOwned::to_owned);
    name.push(".swp");
    path.with_file_name(name)
}

impl JsonFileUnitOfWork {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            swap_path: swap_path_of(&path),
            path,
            users: None,
            existed_at_begin: false,
            state: TransactionState::Closed,
        }
    }

    /// The live store file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The swap copy taken on `begin`.
    #[must_use]
    pub fn swap_path(&self) -> &Path {
        &self.swap_path
    }

    fn ensure_open(&self) -> Result<(), AppError> {
        if self.state == TransactionState::Open {
            Ok(())
        } else {
            Err(AppError::TransactionClosed)
        }
    }

    /// A swap file left behind means a commit or a rollback was interrupted.
    /// If the live file is missing or no longer parses, the swap copy is the
    /// last good state.
    fn recover_interrupted_commit(&self) -> Result<(), StorageError> {
        if !self.swap_path.exists() {
            return Ok(());
        }
        if self.path.is_file() && JsonFileRepository::load(&self.path).is_ok() {
            tracing::warn!(swap = %self.swap_path.display(), "discarding stale swap file");
            return self.discard_swap();
        }
        tracing::warn!(
            swap = %self.swap_path.display(),
            "live store is missing or corrupt, restoring swap file"
        );
        fs::rename(&self.swap_path, &self.path).map_err(StorageError::io(&self.path))
    }

    fn discard_swap(&self) -> Result<(), StorageError> {
        if self.swap_path.exists() {
            fs::remove_file(&self.swap_path).map_err(StorageError::io(&self.swap_path))?;
        }
        Ok(())
    }
}

impl UnitOfWork for JsonFileUnitOfWork {
    type Users = JsonFileRepository;

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn begin(&mut self) -> Result<(), AppError> {
        if self.state == TransactionState::Open {
            return Err(AppError::TransactionOpen);
        }
        self.users = None;
        self.recover_interrupted_commit()?;

        self.existed_at_begin = self.path.exists();
        if self.existed_at_begin {
            fs::copy(&self.path, &self.swap_path).map_err(StorageError::io(&self.swap_path))?;
        }
        let users = match JsonFileRepository::load(&self.path) {
            Ok(users) => users,
            Err(err) => {
                self.discard_swap()?;
                return Err(err.into());
            }
        };
        self.users = Some(users);
        self.state = TransactionState::Open;
        Ok(())
    }

    fn users(&mut self) -> Result<&mut Self::Users, AppError> {
        self.ensure_open()?;
        self.users.as_mut().ok_or(AppError::TransactionClosed)
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn commit(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        let saved = match &self.users {
            Some(users) => users.save(),
            None => Ok(()),
        };
        if let Err(err) = saved {
            if let Err(rollback_err) = self.rollback() {
                tracing::error!(error = %rollback_err, "rollback after failed save failed");
            }
            return Err(err.into());
        }
        self.state = TransactionState::Committed;
        // the live file is already written, a leftover swap is dropped on the next begin
        if let Err(err) = self.discard_swap() {
            tracing::warn!(error = %err, "unable to remove swap file");
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn rollback(&mut self) -> Result<(), AppError> {
        self.ensure_open()?;
        self.users = None;
        self.state = TransactionState::RolledBack;
        if self.existed_at_begin {
            fs::rename(&self.swap_path, &self.path).map_err(StorageError::io(&self.path))?;
        } else if self.path.exists() {
            fs::remove_file(&self.path).map_err(StorageError::io(&self.path))?;
        }
        Ok(())
    }

    fn state(&self) -> TransactionState {
        self.state
    }

    fn collect_new_events(&mut self) -> Vec<Event> {
        match (&mut self.users, self.state) {
            (Some(users), TransactionState::Committed) => users.collect_seen_events(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchhub_domain::event::EventKind;
    use switchhub_domain::user::User;

    fn store_with_user(dir: &Path) -> PathBuf {
        let path = dir.join("store.json");
        let mut uow = JsonFileUnitOfWork::new(&path);
        uow.transaction(|users| {
            users.add(User::register("s1", "t1"));
            Ok(())
        })
        .unwrap();
        path
    }

    #[test]
    fn should_name_swap_file_after_store() {
        let uow = JsonFileUnitOfWork::new("/data/.repository.json");
        assert_eq!(uow.swap_path(), Path::new("/data/.repository.json.swp"));
    }

    #[test]
    fn should_create_store_and_drop_swap_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut uow = JsonFileUnitOfWork::new(&path);

        uow.transaction(|users| {
            users.add(User::register("s1", "t1"));
            Ok(())
        })
        .unwrap();

        assert!(path.exists());
        assert!(!uow.swap_path().exists());
        let events = uow.collect_new_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EventKind::UserRegistered);
        assert!(uow.collect_new_events().is_empty());
    }

    #[test]
    fn should_keep_file_byte_identical_when_transaction_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with_user(dir.path());
        let before = fs::read(&path).unwrap();
        let mut uow = JsonFileUnitOfWork::new(&path);

        let result: Result<(), AppError> = uow.transaction(|users| {
            users.add(User::register("s2", "t2"));
            let uid = users.list()[0].uid();
            users.delete(uid);
            Err(AppError::TransactionClosed)
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(!uow.swap_path().exists());
        assert!(uow.collect_new_events().is_empty());
    }

    #[test]
    fn should_restore_live_file_on_rollback_after_external_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with_user(dir.path());
        let before = fs::read(&path).unwrap();
        let mut uow = JsonFileUnitOfWork::new(&path);

        uow.begin().unwrap();
        fs::write(&path, b"[]").unwrap();
        uow.rollback().unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn should_remove_store_created_during_rolled_back_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut uow = JsonFileUnitOfWork::new(&path);

        uow.begin().unwrap();
        uow.users().unwrap().add(User::register("s1", "t1"));
        uow.users().unwrap().save().unwrap();
        uow.rollback().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn should_fail_begin_on_corrupt_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, b"not json").unwrap();
        let mut uow = JsonFileUnitOfWork::new(&path);

        let result = uow.begin();

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(uow.state(), TransactionState::Closed);
        assert!(!uow.swap_path().exists());
    }

    #[test]
    fn should_recover_from_interrupted_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with_user(dir.path());
        let good = fs::read(&path).unwrap();
        let mut uow = JsonFileUnitOfWork::new(&path);
        fs::write(uow.swap_path(), &good).unwrap();
        fs::write(&path, b"[{\"userId\": ").unwrap();

        let count = uow.read(|users| users.count()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(&path).unwrap(), good);
    }

    #[test]
    fn should_roll_back_and_recover_when_commit_cannot_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with_user(dir.path());
        let before = fs::read(&path).unwrap();
        let mut uow = JsonFileUnitOfWork::new(&path);

        let result = uow.transaction(|users| {
            users.add(User::register("s2", "t2"));
            fs::remove_file(&path).unwrap();
            fs::create_dir(&path).unwrap();
            Ok(())
        });

        assert!(matches!(result, Err(AppError::Storage(_))));
        assert_eq!(uow.state(), TransactionState::RolledBack);
        assert!(uow.collect_new_events().is_empty());
        assert!(matches!(uow.commit(), Err(AppError::TransactionClosed)));

        fs::remove_dir(&path).unwrap();
        let count = uow.read(|users| users.count()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(!uow.swap_path().exists());
    }

    #[test]
    fn should_drop_stale_swap_when_live_store_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_with_user(dir.path());
        let good = fs::read(&path).unwrap();
        let mut uow = JsonFileUnitOfWork::new(&path);
        fs::write(uow.swap_path(), b"[]").unwrap();

        let count = uow.read(|users| users.count()).unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(&path).unwrap(), good);
    }

    #[test]
    fn should_reject_access_outside_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let mut uow = JsonFileUnitOfWork::new(dir.path().join("store.json"));
        assert!(matches!(uow.users(), Err(AppError::TransactionClosed)));
        assert!(matches!(uow.commit(), Err(AppError::TransactionClosed)));
    }
}

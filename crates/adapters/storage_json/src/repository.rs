//! JSON file implementation of [`UserRepository`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use switchhub_app::ports::UserRepository;
use switchhub_app::repository::InMemoryUserRepository;
use switchhub_domain::event::Event;
use switchhub_domain::id::UserId;
use switchhub_domain::user::User;

use crate::error::StorageError;

/// Users loaded from a JSON file, kept in memory until [`save`](Self::save).
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    users: InMemoryUserRepository,
}

impl JsonFileRepository {
    /// Load the users stored at `path`.
    ///
    /// A missing or empty file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the file cannot be read and
    /// [`StorageError::CorruptStore`] when it is not a JSON array of users.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let users = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice::<Vec<User>>(&bytes).map_err(|source| {
                StorageError::CorruptStore {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(StorageError::io(&path)(err)),
        };
        tracing::debug!(path = %path.display(), users = users.len(), "store loaded");
        Ok(Self {
            path,
            users: InMemoryUserRepository::new(users),
        })
    }

    /// Rewrite the whole file from the in-memory users.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Encode`] or [`StorageError::Io`].
    pub fn save(&self) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(self.users.users()).map_err(StorageError::Encode)?;
        fs::write(&self.path, bytes).map_err(StorageError::io(&self.path))?;
        tracing::debug!(path = %self.path.display(), users = self.users.count(), "store saved");
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UserRepository for JsonFileRepository {
    fn add(&mut self, user: User) {
        self.users.add(user);
    }

    fn get_by_uid(&mut self, uid: UserId) -> Option<&mut User> {
        self.users.get_by_uid(uid)
    }

    fn get_by_secret(&mut self, secret: &str) -> Option<&mut User> {
        self.users.get_by_secret(secret)
    }

    fn get_by_dev_id(&mut self, dev_id: &str) -> Option<&mut User> {
        self.users.get_by_dev_id(dev_id)
    }

    fn delete(&mut self, uid: UserId) -> Option<User> {
        self.users.delete(uid)
    }

    fn list(&self) -> Vec<&User> {
        self.users.list()
    }

    fn collect_seen_events(&mut self) -> Vec<Event> {
        self.users.collect_seen_events()
    }

    fn count(&self) -> usize {
        self.users.count()
    }
}

//! JSON-file record store backing the CLI.
//!
//! Stands in for the hosted backend while honoring the same contract. The
//! goals of the on-disk handling:
//! - Restrictive permissions (0600) for both store and lock files.
//! - Safe concurrent usage via advisory file locks.
//! - Crash-safe writes via the write-temp, fsync, atomic-rename pattern.
//!
//! The whole document is rewritten on every mutation, which is what makes
//! `apply_rotation` genuinely transactional here: one rename either lands
//! the full batch or none of it.

use crate::store::records::{
    SubscriptionPatch, SubscriptionRecord, UserPatch, UserRecord,
};
use crate::store::{RecordStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

const STORE_ENV: &str = "SELAV_STORE";
const APP_DIR: &str = "selav";
const DEFAULT_STORE_FILE: &str = "store.json";

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    user: UserRecord,
    #[serde(default)]
    subscriptions: Vec<SubscriptionRecord>,
}

/// Resolve the store file path: explicit override, then `SELAV_STORE`, then
/// the platform config directory.
pub fn store_path(override_path: Option<&Path>) -> Result<PathBuf, StoreError> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = std::env::var_os(STORE_ENV) {
        return Ok(PathBuf::from(path));
    }

    let mut dir = dirs::config_dir().ok_or(StoreError::StoreDirUnavailable)?;
    dir.push(APP_DIR);
    dir.push(DEFAULT_STORE_FILE);
    Ok(dir)
}

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create a fresh store for `email`. Refuses to clobber an existing one.
    pub fn init(path: &Path, email: &str) -> Result<Self, StoreError> {
        if path.exists() {
            return Err(StoreError::AlreadyExists(path.display().to_string()));
        }

        let store = Self::open(path);
        let doc = StoreDocument {
            schema_version: SCHEMA_VERSION,
            user: UserRecord {
                email: email.to_string(),
                vault_check: None,
                monthly_income_enc: None,
            },
            subscriptions: Vec::new(),
        };
        store.save(&doc)?;
        Ok(store)
    }

    fn load(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotInitialized);
        }

        let _lock = StoreLock::acquire(&lock_path_for(&self.path), LockMode::Shared)?;
        let mut file = File::open(&self.path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let doc: StoreDocument = serde_json::from_slice(&buf)?;
        if doc.schema_version != SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema(doc.schema_version));
        }
        Ok(doc)
    }

    fn save(&self, doc: &StoreDocument) -> Result<(), StoreError> {
        let _lock = StoreLock::acquire(&lock_path_for(&self.path), LockMode::Exclusive)?;
        ensure_parent_dir(&self.path)?;

        let bytes = serde_json::to_vec_pretty(doc)?;
        let dir = parent_dir(&self.path)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;

        tmp.as_file_mut().write_all(&bytes)?;
        tmp.as_file_mut().sync_all()?;

        #[cfg(unix)]
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))?;

        tmp.persist(&self.path).map_err(std::io::Error::from)?;
        set_permissions_0600(&self.path)?;

        fsync_dir(dir)?;
        Ok(())
    }

    fn mutate<F>(&mut self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StoreDocument) -> Result<(), StoreError>,
    {
        let mut doc = self.load()?;
        f(&mut doc)?;
        self.save(&doc)
    }
}

impl RecordStore for FileStore {
    fn user_record(&self) -> Result<UserRecord, StoreError> {
        Ok(self.load()?.user)
    }

    fn update_user(&mut self, patch: UserPatch) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.user.apply(patch);
            Ok(())
        })
    }

    fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, StoreError> {
        Ok(self.load()?.subscriptions)
    }

    fn create_subscription(&mut self, record: SubscriptionRecord) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.subscriptions.push(record);
            Ok(())
        })
    }

    fn update_subscription(
        &mut self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> Result<(), StoreError> {
        self.mutate(|doc| {
            let sub = doc
                .subscriptions
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or(StoreError::SubscriptionNotFound(id))?;
            sub.apply(patch);
            Ok(())
        })
    }

    fn delete_subscription(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.mutate(|doc| {
            let before = doc.subscriptions.len();
            doc.subscriptions.retain(|s| s.id != id);
            if doc.subscriptions.len() == before {
                return Err(StoreError::SubscriptionNotFound(id));
            }
            Ok(())
        })
    }

    fn apply_rotation(
        &mut self,
        user: UserPatch,
        subscriptions: Vec<(Uuid, SubscriptionPatch)>,
    ) -> Result<(), StoreError> {
        // Single read-modify-rename; the batch is atomic by construction.
        self.mutate(|doc| {
            for (id, _) in &subscriptions {
                if !doc.subscriptions.iter().any(|s| s.id == *id) {
                    return Err(StoreError::SubscriptionNotFound(*id));
                }
            }

            doc.user.apply(user);
            for (id, patch) in subscriptions {
                let sub = doc
                    .subscriptions
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or(StoreError::SubscriptionNotFound(id))?;
                sub.apply(patch);
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct StoreLock {
    #[allow(dead_code)]
    file: File,
}

impl StoreLock {
    fn acquire(lock_path: &Path, mode: LockMode) -> Result<Self, StoreError> {
        ensure_parent_dir(lock_path)?;

        #[cfg(unix)]
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .mode(0o600)
            .open(lock_path)?;

        #[cfg(not(unix))]
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(lock_path)?;

        set_permissions_0600(lock_path)?;
        lock_file(&file, mode)?;
        Ok(Self { file })
    }
}

fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut p = store_path.as_os_str().to_os_string();
    p.push(".lock");
    PathBuf::from(p)
}

fn parent_dir(path: &Path) -> Result<&Path, StoreError> {
    path.parent().ok_or(StoreError::StoreDirUnavailable)
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(parent_dir(path)?)?;
    Ok(())
}

fn set_permissions_0600(path: &Path) -> Result<(), StoreError> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn fsync_dir(dir: &Path) -> Result<(), StoreError> {
    #[cfg(unix)]
    {
        let file = File::open(dir)?;
        file.sync_all()?;
    }
    Ok(())
}

fn lock_file(file: &File, mode: LockMode) -> Result<(), StoreError> {
    #[cfg(unix)]
    unsafe {
        let op = match mode {
            LockMode::Shared => libc::LOCK_SH,
            LockMode::Exclusive => libc::LOCK_EX,
        };

        let rc = libc::flock(file.as_raw_fd(), op);
        if rc == 0 {
            return Ok(());
        }
        return Err(StoreError::LockFailed);
    }

    #[cfg(not(unix))]
    {
        let _ = file;
        let _ = mode;
        Err(StoreError::LockFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::records::{BillingCycle, Category, Currency};

    fn sample_subscription() -> SubscriptionRecord {
        SubscriptionRecord {
            id: Uuid::new_v4(),
            name_enc: "sv1:abc".to_string(),
            amount_enc: "sv1:def".to_string(),
            currency: Currency::Usd,
            billing_cycle: BillingCycle::Monthly,
            next_billing: "2026-09-01".to_string(),
            auto_renew: true,
            is_trial: false,
            category: Category::Entertainment,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn init_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::init(&path, "u@x.com").unwrap();
        let user = store.user_record().unwrap();
        assert_eq!(user.email, "u@x.com");
        assert_eq!(user.vault_check, None);
        assert!(store.subscriptions().unwrap().is_empty());
    }

    #[test]
    fn init_refuses_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        FileStore::init(&path, "u@x.com").unwrap();
        let err = FileStore::init(&path, "u@x.com").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[test]
    fn missing_store_is_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("store.json"));
        assert!(matches!(
            store.user_record().unwrap_err(),
            StoreError::NotInitialized
        ));
    }

    #[test]
    fn subscription_crud() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = FileStore::init(&path, "u@x.com").unwrap();

        let sub = sample_subscription();
        let id = sub.id;
        store.create_subscription(sub).unwrap();
        assert_eq!(store.subscriptions().unwrap().len(), 1);

        store
            .update_subscription(
                id,
                SubscriptionPatch {
                    name_enc: Some("sv1:xyz".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(store.subscriptions().unwrap()[0].name_enc, "sv1:xyz");

        store.delete_subscription(id).unwrap();
        assert!(store.subscriptions().unwrap().is_empty());

        let err = store.delete_subscription(id).unwrap_err();
        assert!(matches!(err, StoreError::SubscriptionNotFound(_)));
    }

    #[test]
    fn rotation_batch_rejects_unknown_ids_without_partial_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = FileStore::init(&path, "u@x.com").unwrap();
        store.create_subscription(sample_subscription()).unwrap();

        let err = store
            .apply_rotation(
                UserPatch {
                    vault_check: Some("t2".to_string()),
                    ..Default::default()
                },
                vec![(Uuid::new_v4(), SubscriptionPatch::default())],
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::SubscriptionNotFound(_)));

        // Nothing from the failed batch may have landed.
        assert_eq!(store.user_record().unwrap().vault_check, None);
    }

    #[cfg(unix)]
    #[test]
    fn store_file_permissions_are_restrictive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        FileStore::init(&path, "u@x.com").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

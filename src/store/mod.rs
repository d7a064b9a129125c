//! Record storage the vault core runs against.
//!
//! The hosted backend is an external collaborator; only its contract lives
//! here. [`RecordStore`] carries the handful of operations the vault needs:
//! read the user record, patch it, CRUD the subscription records, and one
//! all-or-nothing batch used by PIN rotation. Ciphertext and verification
//! tokens are owned by the store but meaningless without the session's key.
//!
//! Two implementations: a JSON file store backing the CLI, and an in-memory
//! store (with failure injection) backing tests.

mod file;
#[cfg(test)]
mod memory;
mod records;

pub use file::{FileStore, store_path};
#[cfg(test)]
pub use memory::MemoryStore;
pub use records::{
    BillingCycle, Category, Currency, SubscriptionPatch, SubscriptionRecord, UserPatch, UserRecord,
};

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store not initialized; run `selav init` first")]
    NotInitialized,

    #[error("store already exists at {0}")]
    AlreadyExists(String),

    #[error("unable to determine store directory")]
    StoreDirUnavailable,

    #[error("no subscription with id {0}")]
    SubscriptionNotFound(Uuid),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("failed to acquire store lock")]
    LockFailed,

    #[error("store file is corrupt")]
    Corrupt(#[from] serde_json::Error),

    #[error("unsupported store schema version {0}")]
    UnsupportedSchema(u32),
}

/// Contract the vault consumes from the record backend.
///
/// Persistence calls may fail; the vault treats such failures as local state
/// having gotten ahead of durable state, and callers retry the persist step
/// without re-deriving keys.
pub trait RecordStore {
    fn user_record(&self) -> Result<UserRecord, StoreError>;

    fn update_user(&mut self, patch: UserPatch) -> Result<(), StoreError>;

    fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, StoreError>;

    fn create_subscription(&mut self, record: SubscriptionRecord) -> Result<(), StoreError>;

    fn update_subscription(
        &mut self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> Result<(), StoreError>;

    fn delete_subscription(&mut self, id: Uuid) -> Result<(), StoreError>;

    /// Persist a PIN-rotation batch: the user patch (new verification token
    /// plus re-sealed income) and re-sealed fields for every subscription,
    /// as one logical transaction. Either everything lands or nothing does —
    /// rotation switches the active key only after this returns `Ok`.
    fn apply_rotation(
        &mut self,
        user: UserPatch,
        subscriptions: Vec<(Uuid, SubscriptionPatch)>,
    ) -> Result<(), StoreError>;
}

//! In-memory record store for tests.
//!
//! Mirrors the file store's semantics, plus failure injection so tests can
//! exercise the persistence-failure paths (setup token not durable, rotation
//! batch rejected) without touching a filesystem.

use crate::store::records::{
    SubscriptionPatch, SubscriptionRecord, UserPatch, UserRecord,
};
use crate::store::{RecordStore, StoreError};
use uuid::Uuid;

pub struct MemoryStore {
    user: UserRecord,
    subscriptions: Vec<SubscriptionRecord>,
    fail_next_write: bool,
}

impl MemoryStore {
    pub fn new(email: &str) -> Self {
        Self {
            user: UserRecord {
                email: email.to_string(),
                vault_check: None,
                monthly_income_enc: None,
            },
            subscriptions: Vec::new(),
            fail_next_write: false,
        }
    }

    /// Make the next mutating call fail, leaving the stored data untouched.
    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }

    fn check_write(&mut self) -> Result<(), StoreError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(StoreError::Io(std::io::Error::other(
                "injected write failure",
            )));
        }
        Ok(())
    }

    fn subscription_mut(&mut self, id: Uuid) -> Result<&mut SubscriptionRecord, StoreError> {
        self.subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StoreError::SubscriptionNotFound(id))
    }
}

impl RecordStore for MemoryStore {
    fn user_record(&self) -> Result<UserRecord, StoreError> {
        Ok(self.user.clone())
    }

    fn update_user(&mut self, patch: UserPatch) -> Result<(), StoreError> {
        self.check_write()?;
        self.user.apply(patch);
        Ok(())
    }

    fn subscriptions(&self) -> Result<Vec<SubscriptionRecord>, StoreError> {
        Ok(self.subscriptions.clone())
    }

    fn create_subscription(&mut self, record: SubscriptionRecord) -> Result<(), StoreError> {
        self.check_write()?;
        self.subscriptions.push(record);
        Ok(())
    }

    fn update_subscription(
        &mut self,
        id: Uuid,
        patch: SubscriptionPatch,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.subscription_mut(id)?.apply(patch);
        Ok(())
    }

    fn delete_subscription(&mut self, id: Uuid) -> Result<(), StoreError> {
        self.check_write()?;
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        if self.subscriptions.len() == before {
            return Err(StoreError::SubscriptionNotFound(id));
        }
        Ok(())
    }

    fn apply_rotation(
        &mut self,
        user: UserPatch,
        subscriptions: Vec<(Uuid, SubscriptionPatch)>,
    ) -> Result<(), StoreError> {
        self.check_write()?;

        // Validate the whole batch before mutating anything.
        for (id, _) in &subscriptions {
            if !self.subscriptions.iter().any(|s| s.id == *id) {
                return Err(StoreError::SubscriptionNotFound(*id));
            }
        }

        self.user.apply(user);
        for (id, patch) in subscriptions {
            self.subscription_mut(id)?.apply(patch);
        }
        Ok(())
    }
}

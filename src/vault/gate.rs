//! Setup / unlock protocol over a user session.
//!
//! Once per login the caller asks [`vault_status`] whether the account has a
//! verification token on record, then drives either the setup transition
//! (first PIN) or the unlock transition (existing PIN) through a
//! [`VaultGate`]. The gate also owns the wrong-PIN retry policy: the stored
//! token places no bound on guesses, so backoff has to be an explicit,
//! testable policy here rather than an accident of UI latency.

use crate::store::{RecordStore, StoreError, UserPatch};
use crate::vault::crypto::{self, CryptoError, KdfParams};
use crate::vault::session::VaultSession;
use secrecy::SecretString;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    /// No verification token on record; the user has never set a PIN.
    NeedsSetup,
    /// Token on record, no key in the session yet.
    NeedsUnlock,
}

impl VaultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VaultStatus::NeedsSetup => "needs-setup",
            VaultStatus::NeedsUnlock => "needs-unlock",
        }
    }
}

/// Decide setup-vs-unlock from the persisted user record.
pub fn vault_status(store: &dyn RecordStore) -> Result<VaultStatus, StoreError> {
    let user = store.user_record()?;
    Ok(match user.vault_check {
        None => VaultStatus::NeedsSetup,
        Some(_) => VaultStatus::NeedsUnlock,
    })
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("incorrect PIN")]
    WrongPin {
        /// Backoff the caller must enforce before the next attempt, if the
        /// policy says this miss crossed the free-attempt threshold.
        wait: Option<Duration>,
    },

    #[error("vault already set up; use rotation to change the PIN")]
    AlreadySetUp,

    #[error("no PIN has been set up yet")]
    NotSetUp,

    /// The session was activated but the token write did not land. The PIN
    /// works locally for this session, but a future unlock would find no (or
    /// a stale) token, so the caller must surface this loudly and retry the
    /// persist.
    #[error("PIN set locally but could not be persisted")]
    SetupNotDurable(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Wrong-PIN backoff schedule.
///
/// The first `free_attempts` consecutive misses carry no delay; each miss
/// after that doubles the wait, capped at `max_delay`. Pure arithmetic —
/// enforcement and clocks belong to the caller, which keeps the schedule
/// directly testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockPolicy {
    pub free_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        Self {
            free_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl UnlockPolicy {
    /// Delay to enforce after the `misses`-th consecutive mismatch.
    pub fn delay_after(&self, misses: u32) -> Option<Duration> {
        if misses <= self.free_attempts {
            return None;
        }
        let exponent = (misses - self.free_attempts - 1).min(63);
        let delay = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(exponent));
        Some(delay.min(self.max_delay))
    }
}

/// Drives the NeedsSetup / NeedsUnlock / Unlocked transitions for one login.
pub struct VaultGate {
    kdf: KdfParams,
    policy: UnlockPolicy,
    consecutive_misses: u32,
}

impl VaultGate {
    pub fn new(kdf: KdfParams) -> Self {
        Self::with_policy(kdf, UnlockPolicy::default())
    }

    pub fn with_policy(kdf: KdfParams, policy: UnlockPolicy) -> Self {
        Self {
            kdf,
            policy,
            consecutive_misses: 0,
        }
    }

    /// First-time setup: derive the key, activate the session, persist the
    /// verification token.
    ///
    /// The session is activated before the token write so dependent writes
    /// (income, subscriptions) can proceed immediately. A failed token write
    /// surfaces as [`GateError::SetupNotDurable`] without deactivating the
    /// session.
    pub fn setup(
        &mut self,
        store: &mut dyn RecordStore,
        session: &mut VaultSession,
        pin: &SecretString,
    ) -> Result<(), GateError> {
        let user = store.user_record()?;
        if user.vault_check.is_some() {
            return Err(GateError::AlreadySetUp);
        }

        let key = crypto::derive_vault_key(pin, &user.email, self.kdf)?;
        let token = crypto::verification_token(&key)?;
        session.activate(key);
        self.consecutive_misses = 0;

        store
            .update_user(UserPatch {
                vault_check: Some(token),
                ..Default::default()
            })
            .map_err(GateError::SetupNotDurable)
    }

    /// Unlock: derive a key from the entered PIN, compare its token against
    /// the stored one, activate the session only on a match.
    pub fn unlock(
        &mut self,
        store: &dyn RecordStore,
        session: &mut VaultSession,
        pin: &SecretString,
    ) -> Result<(), GateError> {
        let user = store.user_record()?;
        let Some(stored_token) = user.vault_check else {
            return Err(GateError::NotSetUp);
        };

        let key = crypto::derive_vault_key(pin, &user.email, self.kdf)?;
        let token = crypto::verification_token(&key)?;

        if token != stored_token {
            self.consecutive_misses += 1;
            return Err(GateError::WrongPin {
                wait: self.policy.delay_after(self.consecutive_misses),
            });
        }

        session.activate(key);
        self.consecutive_misses = 0;
        Ok(())
    }
}

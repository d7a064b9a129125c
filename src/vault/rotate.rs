//! PIN rotation: re-key every sealed field the user owns.
//!
//! Two-step interactive flow. The verify step checks the entered current PIN
//! against the stored verification token; the commit step re-encrypts under
//! the new key. Decryption during commit uses the key already active in the
//! session (rotation assumes an unlocked vault), not a key re-derived from
//! the verify step's input.
//!
//! Ordering is a strict data dependency, not an optimization: every field is
//! decrypted under the old key and captured in memory before anything else
//! happens, because activating the new key discards the old one
//! irrecoverably. The whole re-sealed batch (new token, income, all
//! subscription fields) is then persisted through one
//! [`RecordStore::apply_rotation`] call, and only after that durable commit
//! does the session switch keys. A persist failure leaves the session on the
//! old key with nothing partially rewritten; the caller can simply retry.
//!
//! A field that no longer opens under the old key (stale ciphertext from
//! some earlier inconsistency) is carried through unchanged rather than
//! destroyed, and counted in the outcome so the caller can warn.

use crate::store::{RecordStore, StoreError, SubscriptionPatch, UserPatch};
use crate::vault::crypto::{self, CryptoError, KdfParams, VaultKey};
use crate::vault::session::{Decrypted, VaultSession};
use secrecy::SecretString;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RotateError {
    #[error("incorrect current PIN")]
    WrongPin,

    #[error("no PIN has been set up yet")]
    NotSetUp,

    #[error("vault must be unlocked to rotate the PIN")]
    VaultLocked,

    /// The re-sealed batch did not land. The session still holds the old
    /// key; retry the commit step.
    #[error("rotation could not be persisted")]
    Persist(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// What the commit step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Fields decrypted under the old key and re-sealed under the new one.
    pub resealed_fields: usize,
    /// Fields that would not open under the old key and were carried
    /// through unchanged.
    pub carried_unreadable: usize,
}

/// Verify step: does the entered PIN reproduce the stored token?
///
/// Mismatch is recoverable; the caller clears the input and lets the user
/// retry.
pub fn verify_current_pin(
    store: &dyn RecordStore,
    pin: &SecretString,
    kdf: KdfParams,
) -> Result<(), RotateError> {
    let user = store.user_record()?;
    let Some(stored_token) = user.vault_check else {
        return Err(RotateError::NotSetUp);
    };

    let key = crypto::derive_vault_key(pin, &user.email, kdf)?;
    if crypto::verification_token(&key)? != stored_token {
        return Err(RotateError::WrongPin);
    }
    Ok(())
}

/// Commit step: re-seal everything under the key derived from `new_pin`,
/// persist the batch, then switch the session key.
pub fn rotate_pin(
    store: &mut dyn RecordStore,
    session: &mut VaultSession,
    new_pin: &SecretString,
    kdf: KdfParams,
) -> Result<RotationOutcome, RotateError> {
    if !session.is_unlocked() {
        return Err(RotateError::VaultLocked);
    }

    let user = store.user_record()?;
    let subscriptions = store.subscriptions()?;

    let new_key = crypto::derive_vault_key(new_pin, &user.email, kdf)?;
    let new_token = crypto::verification_token(&new_key)?;

    // Capture and re-seal all plaintext while the old key is still the
    // active one. The new key is not installed until the store commit
    // succeeds.
    let mut outcome = RotationOutcome {
        resealed_fields: 0,
        carried_unreadable: 0,
    };

    let income_enc = reseal(
        session,
        &new_key,
        user.monthly_income_enc.as_deref(),
        &mut outcome,
    )?;

    let mut sub_patches: Vec<(Uuid, SubscriptionPatch)> = Vec::new();
    for sub in &subscriptions {
        let patch = SubscriptionPatch {
            name_enc: reseal(session, &new_key, Some(&sub.name_enc), &mut outcome)?,
            amount_enc: reseal(session, &new_key, Some(&sub.amount_enc), &mut outcome)?,
            ..Default::default()
        };
        if patch != SubscriptionPatch::default() {
            sub_patches.push((sub.id, patch));
        }
    }

    let user_patch = UserPatch {
        vault_check: Some(new_token),
        monthly_income_enc: income_enc,
    };

    store
        .apply_rotation(user_patch, sub_patches)
        .map_err(RotateError::Persist)?;

    session.activate(new_key);
    Ok(outcome)
}

/// Re-seal one field: decrypt under the session's (old) key, encrypt under
/// `new_key`. Returns `None` when there is nothing to rewrite — the field is
/// empty, or unreadable and carried through unchanged.
fn reseal(
    session: &VaultSession,
    new_key: &VaultKey,
    ciphertext: Option<&str>,
    outcome: &mut RotationOutcome,
) -> Result<Option<String>, RotateError> {
    match session.decrypt_opt(ciphertext) {
        Decrypted::Empty => Ok(None),
        Decrypted::Plain(plaintext) => {
            outcome.resealed_fields += 1;
            Ok(Some(crypto::seal_field(new_key, plaintext.as_bytes())?))
        }
        Decrypted::Failed | Decrypted::Locked => {
            outcome.carried_unreadable += 1;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{BillingCycle, Category, Currency, MemoryStore, SubscriptionRecord};
    use crate::vault::gate::VaultGate;

    fn pin(s: &str) -> SecretString {
        SecretString::new(s.to_string().into_boxed_str())
    }

    fn kdf() -> KdfParams {
        KdfParams::for_tests()
    }

    fn setup_account(pin_str: &str) -> (MemoryStore, VaultSession) {
        let mut store = MemoryStore::new("u@x.com");
        let mut session = VaultSession::new();
        VaultGate::new(kdf())
            .setup(&mut store, &mut session, &pin(pin_str))
            .unwrap();
        (store, session)
    }

    fn add_subscription(
        store: &mut MemoryStore,
        session: &VaultSession,
        name: &str,
        amount: &str,
    ) -> Uuid {
        let id = Uuid::new_v4();
        store
            .create_subscription(SubscriptionRecord {
                id,
                name_enc: session.encrypt(name).unwrap(),
                amount_enc: session.encrypt(amount).unwrap(),
                currency: Currency::Usd,
                billing_cycle: BillingCycle::Monthly,
                next_billing: "2026-09-01".to_string(),
                auto_renew: true,
                is_trial: false,
                category: Category::Entertainment,
                created_at: 1,
                updated_at: 1,
            })
            .unwrap();
        id
    }

    fn set_income(store: &mut MemoryStore, session: &VaultSession, amount: &str) {
        store
            .update_user(UserPatch {
                monthly_income_enc: Some(session.encrypt(amount).unwrap()),
                ..Default::default()
            })
            .unwrap();
    }

    #[test]
    fn verify_step_accepts_current_pin_and_rejects_others() {
        let (store, _session) = setup_account("1234");
        verify_current_pin(&store, &pin("1234"), kdf()).unwrap();

        let err = verify_current_pin(&store, &pin("9999"), kdf()).unwrap_err();
        assert!(matches!(err, RotateError::WrongPin));
    }

    #[test]
    fn rotation_requires_an_unlocked_session() {
        let (mut store, _) = setup_account("1234");
        let mut locked = VaultSession::new();
        let err = rotate_pin(&mut store, &mut locked, &pin("5678"), kdf()).unwrap_err();
        assert!(matches!(err, RotateError::VaultLocked));
    }

    #[test]
    fn rotation_rekeys_income_and_every_subscription() {
        let (mut store, mut session) = setup_account("1234");
        set_income(&mut store, &session, "50000");
        add_subscription(&mut store, &session, "Netflix", "15.49");
        add_subscription(&mut store, &session, "Spotify", "9.99");

        let outcome = rotate_pin(&mut store, &mut session, &pin("5678"), kdf()).unwrap();
        // income + 2 * (name, amount)
        assert_eq!(outcome.resealed_fields, 5);
        assert_eq!(outcome.carried_unreadable, 0);

        // The live session reads everything under the new key.
        let user = store.user_record().unwrap();
        assert_eq!(
            session
                .decrypt_opt(user.monthly_income_enc.as_deref())
                .text(),
            "50000"
        );
        let subs = store.subscriptions().unwrap();
        let names: Vec<String> = subs
            .iter()
            .map(|s| session.decrypt(&s.name_enc).text().to_string())
            .collect();
        assert!(names.contains(&"Netflix".to_string()));
        assert!(names.contains(&"Spotify".to_string()));

        // A fresh unlock with the new PIN reproduces the new token and
        // reads the re-sealed data; the old PIN no longer unlocks.
        let mut fresh = VaultSession::new();
        let mut gate = VaultGate::new(kdf());
        assert!(gate.unlock(&store, &mut fresh, &pin("1234")).is_err());
        gate.unlock(&store, &mut fresh, &pin("5678")).unwrap();
        assert_eq!(
            fresh.decrypt_opt(user.monthly_income_enc.as_deref()).text(),
            "50000"
        );
    }

    #[test]
    fn rotation_with_no_encrypted_fields_still_swaps_the_token() {
        let (mut store, mut session) = setup_account("1234");
        let old_token = store.user_record().unwrap().vault_check;

        let outcome = rotate_pin(&mut store, &mut session, &pin("5678"), kdf()).unwrap();
        assert_eq!(outcome.resealed_fields, 0);

        let new_token = store.user_record().unwrap().vault_check;
        assert_ne!(old_token, new_token);
    }

    #[test]
    fn persist_failure_leaves_the_old_key_active() {
        let (mut store, mut session) = setup_account("1234");
        set_income(&mut store, &session, "50000");
        let old_income = store.user_record().unwrap().monthly_income_enc;

        store.fail_next_write();
        let err = rotate_pin(&mut store, &mut session, &pin("5678"), kdf()).unwrap_err();
        assert!(matches!(err, RotateError::Persist(_)));

        // No partial switch: stored ciphertext untouched and still readable
        // under the session's (old) key.
        let user = store.user_record().unwrap();
        assert_eq!(user.monthly_income_enc, old_income);
        assert_eq!(
            session
                .decrypt_opt(user.monthly_income_enc.as_deref())
                .text(),
            "50000"
        );

        // And the retry succeeds.
        rotate_pin(&mut store, &mut session, &pin("5678"), kdf()).unwrap();
        let user = store.user_record().unwrap();
        assert_eq!(
            session
                .decrypt_opt(user.monthly_income_enc.as_deref())
                .text(),
            "50000"
        );
    }

    #[test]
    fn unreadable_fields_are_carried_through_unchanged() {
        let (mut store, mut session) = setup_account("1234");

        // Ciphertext sealed under some other key entirely.
        let stranger = {
            let mut s = VaultSession::new();
            let key = crypto::derive_vault_key(&pin("0000"), "other@x.com", kdf()).unwrap();
            s.activate(key);
            s.encrypt("ghost").unwrap()
        };
        store
            .update_user(UserPatch {
                monthly_income_enc: Some(stranger.clone()),
                ..Default::default()
            })
            .unwrap();

        let outcome = rotate_pin(&mut store, &mut session, &pin("5678"), kdf()).unwrap();
        assert_eq!(outcome.carried_unreadable, 1);
        assert_eq!(
            store.user_record().unwrap().monthly_income_enc,
            Some(stranger)
        );
    }
}

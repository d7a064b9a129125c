//! Session-lifetime holder of the active vault key.
//!
//! `VaultSession` is the single point every plaintext-to-ciphertext
//! conversion flows through. It exclusively owns the one active key slot; no
//! other component holds or caches key material. Two states: Locked (no key)
//! and Unlocked (exactly one key). `lock` drops the key, and drop zeroizes
//! it.
//!
//! The encrypt and decrypt paths are deliberately asymmetric. Encrypting
//! while locked is a hard error: silently writing plaintext (or garbage)
//! where ciphertext belongs must never happen. Decrypting while locked, or
//! under the wrong key, collapses to "no data visible" — many reads happen
//! before the user has passed the unlock gate, and the UI renders a
//! placeholder rather than an exception.

use crate::vault::crypto::{self, CryptoError, VaultKey};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("vault is locked")]
    Locked,

    #[error(transparent)]
    Crypto(CryptoError),
}

/// Outcome of a decrypt call.
///
/// Callers that only care about the UI contract use [`Decrypted::text`],
/// which collapses everything but `Plain` to the empty string. The variants
/// exist so tests and repair paths can tell "field was never set" apart from
/// "field exists but this key cannot read it".
#[derive(Debug)]
pub enum Decrypted {
    /// No ciphertext was given (empty or absent field).
    Empty,
    /// No key is active; nothing is visible.
    Locked,
    /// Ciphertext exists but did not open: wrong key, tampered data, or
    /// not-a-ciphertext input.
    Failed,
    Plain(Zeroizing<String>),
}

impl Decrypted {
    /// The UI-facing contract: plaintext when readable, `""` otherwise.
    pub fn text(&self) -> &str {
        match self {
            Decrypted::Plain(s) => s,
            _ => "",
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Decrypted::Plain(_))
    }
}

/// At most one active key at a time; starts Locked.
#[derive(Default)]
pub struct VaultSession {
    key: Option<VaultKey>,
}

impl VaultSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `key` as the active key, replacing any previous one.
    ///
    /// The replaced key is dropped (and zeroized) before this returns; there
    /// is no window in which two keys are live for writes.
    pub fn activate(&mut self, key: VaultKey) {
        self.key = Some(key);
    }

    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Discard the active key. Idempotent.
    pub fn lock(&mut self) {
        self.key = None;
    }

    /// Encrypt one sensitive field value.
    ///
    /// Empty input is a no-op that succeeds regardless of lock state: an
    /// empty field has nothing to protect and round-trips as `""`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, SessionError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let key = self.key.as_ref().ok_or(SessionError::Locked)?;
        crypto::seal_field(key, plaintext.as_bytes()).map_err(SessionError::Crypto)
    }

    /// Decrypt one sealed field value. Never errors; see [`Decrypted`].
    pub fn decrypt(&self, ciphertext: &str) -> Decrypted {
        if ciphertext.is_empty() {
            return Decrypted::Empty;
        }
        let Some(key) = self.key.as_ref() else {
            return Decrypted::Locked;
        };
        match crypto::open_field(key, ciphertext) {
            Ok(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(s) => Decrypted::Plain(Zeroizing::new(s)),
                Err(_) => Decrypted::Failed,
            },
            Err(_) => Decrypted::Failed,
        }
    }

    /// Decrypt an optional field, treating `None` the same as `""`.
    pub fn decrypt_opt(&self, ciphertext: Option<&str>) -> Decrypted {
        self.decrypt(ciphertext.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::crypto::{KdfParams, derive_vault_key};
    use secrecy::SecretString;

    fn key(pin: &str) -> VaultKey {
        let pin = SecretString::new(pin.to_string().into_boxed_str());
        derive_vault_key(&pin, "u@x.com", KdfParams::for_tests()).unwrap()
    }

    fn unlocked(pin: &str) -> VaultSession {
        let mut session = VaultSession::new();
        session.activate(key(pin));
        session
    }

    #[test]
    fn starts_locked() {
        let session = VaultSession::new();
        assert!(!session.is_unlocked());
    }

    #[test]
    fn encrypt_while_locked_is_an_error() {
        let session = VaultSession::new();
        assert!(matches!(
            session.encrypt("Netflix"),
            Err(SessionError::Locked)
        ));
    }

    #[test]
    fn decrypt_while_locked_is_empty_text() {
        let sealed = unlocked("1234").encrypt("Netflix").unwrap();

        let session = VaultSession::new();
        let out = session.decrypt(&sealed);
        assert!(matches!(out, Decrypted::Locked));
        assert_eq!(out.text(), "");
    }

    #[test]
    fn empty_input_passes_through_regardless_of_lock_state() {
        let locked = VaultSession::new();
        assert_eq!(locked.encrypt("").unwrap(), "");
        assert!(matches!(locked.decrypt(""), Decrypted::Empty));
        assert!(matches!(locked.decrypt_opt(None), Decrypted::Empty));

        let session = unlocked("1234");
        assert_eq!(session.encrypt("").unwrap(), "");
        assert!(matches!(session.decrypt(""), Decrypted::Empty));
    }

    #[test]
    fn roundtrip_under_same_key() {
        let session = unlocked("1234");
        let sealed = session.encrypt("Netflix").unwrap();
        let out = session.decrypt(&sealed);
        assert_eq!(out.text(), "Netflix");
    }

    #[test]
    fn wrong_key_decrypts_to_failed_not_garbage() {
        let sealed = unlocked("1234").encrypt("Netflix").unwrap();

        let other = unlocked("5678");
        let out = other.decrypt(&sealed);
        assert!(matches!(out, Decrypted::Failed));
        assert_eq!(out.text(), "");
    }

    #[test]
    fn non_ciphertext_input_decrypts_to_failed() {
        let session = unlocked("1234");
        assert!(matches!(session.decrypt("stale junk"), Decrypted::Failed));
    }

    #[test]
    fn activate_replaces_previous_key() {
        let mut session = unlocked("1234");
        let sealed_old = session.encrypt("50000").unwrap();

        session.activate(key("5678"));
        assert!(session.is_unlocked());
        assert!(matches!(session.decrypt(&sealed_old), Decrypted::Failed));

        let sealed_new = session.encrypt("50000").unwrap();
        assert_eq!(session.decrypt(&sealed_new).text(), "50000");
    }

    #[test]
    fn lock_discards_the_key() {
        let mut session = unlocked("1234");
        session.lock();
        assert!(!session.is_unlocked());
        assert!(matches!(session.encrypt("x"), Err(SessionError::Locked)));
    }
}

//! Cryptographic building blocks for the PIN vault.
//!
//! Design notes:
//!
//! - KDF: Argon2id stretches the 4-digit PIN into `kdf_out` using a salt
//!   derived from the account email, so the same (PIN, email) pair always
//!   yields the same key on every device.
//! - Key separation: HKDF-SHA256 derives independent subkeys from `kdf_out`.
//!   The field-encryption key and the verification token use distinct `info`
//!   labels, so the token stored on the user record is not a hash of the key
//!   that actually encrypts anything.
//! - AEAD: XChaCha20-Poly1305 with a fresh random 24-byte nonce per field.
//!   The nonce travels inside the ciphertext string, which is self-contained:
//!   anything `seal_field` emits is decryptable by `open_field` given the
//!   same derived key, across process restarts.
//!
//! The PIN space is only 10,000 values. Stretching adds friction against an
//! attacker holding the verification token and salt, nothing more; that is an
//! accepted trade-off of the 4-digit UX, not something this module tries to
//! paper over.
//!
//! Security foot-guns to avoid:
//!
//! - Do not log or print key material or decrypted field values.
//! - Treat returned plaintext as sensitive; it stays in `Zeroizing` wrappers.

use argon2::{Algorithm, Argon2, Params as Argon2Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD as B64;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use thiserror::Error;
use zeroize::Zeroizing;

/// Output size (bytes) of Argon2id.
pub const KDF_OUT_LEN: usize = 32;
/// Size (bytes) of XChaCha20-Poly1305 nonces.
pub const XCHACHA_NONCE_LEN: usize = 24;
/// Size (bytes) of the Poly1305 authentication tag.
pub const AEAD_TAG_LEN: usize = 16;

/// Prefix carried by every sealed field string.
const FIELD_PREFIX: &str = "sv1:";

/// Domain-separation label mixed into the email before hashing it to a salt.
const SALT_CONTEXT: &[u8] = b"selav/vault/v1/salt";
/// HKDF `info` label for the field-encryption subkey.
const HKDF_INFO_FIELD_KEY: &[u8] = b"selav/vault/v1/field-key";
/// HKDF `info` label for the verification token.
const HKDF_INFO_CHECK: &[u8] = b"selav/vault/v1/check";
/// AAD binding sealed fields to this scheme version.
const FIELD_AAD: &[u8] = b"selav/field/v1";

/// Secret bytes held in memory with zeroize-on-drop semantics.
pub type SecretBytes = SecretSlice<u8>;

/// Argon2id tuning parameters.
///
/// The defaults must stay fixed: key derivation has to be deterministic
/// across devices and releases, so unlike a salted-hash store there is no
/// per-user record of the parameters to migrate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl KdfParams {
    /// Interactive-grade parameters: sub-second on current hardware, while
    /// still multiplying the cost of walking the 10,000-PIN space.
    pub fn interactive() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }

    pub fn for_tests() -> Self {
        Self {
            memory_kib: 8 * 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn to_argon2_params(self, output_len: usize) -> Result<Argon2Params, CryptoError> {
        Ok(Argon2Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(output_len),
        )?)
    }
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("argon2 error")]
    Argon2(#[from] argon2::Error),

    #[error("hkdf error")]
    Hkdf,

    #[error("aead error")]
    Aead,

    #[error("malformed ciphertext")]
    MalformedCiphertext,
}

/// Symmetric key material derived from (PIN, email).
///
/// Deterministic for a given pair, zeroized on drop. `VaultSession` is the
/// only component that should hold one of these for longer than a call.
pub struct VaultKey {
    kdf_out: SecretBytes,
}

impl VaultKey {
    #[cfg(test)]
    pub fn expose_for_tests(&self) -> &[u8] {
        self.kdf_out.expose_secret()
    }
}

/// Generate `N` cryptographically-secure random bytes.
fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Normalize the account email into the KDF salt.
///
/// Case and surrounding whitespace are stripped so the same account derives
/// the same key no matter how the identity provider capitalizes the address.
/// Hashing also guarantees Argon2's minimum salt length for short addresses.
fn email_salt(email: &str) -> [u8; 32] {
    let normalized = email.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(SALT_CONTEXT);
    hasher.update(normalized.as_bytes());
    hasher.finalize().into()
}

/// Derive the vault key from the user's PIN and email.
///
/// Pure and deterministic: same (pin, email) always yields byte-identical
/// key material. The PIN is expected to be exactly 4 digits; this function
/// does not enforce that contract, the prompt layer does.
pub fn derive_vault_key(
    pin: &SecretString,
    email: &str,
    params: KdfParams,
) -> Result<VaultKey, CryptoError> {
    let argon2_params = params.to_argon2_params(KDF_OUT_LEN)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let salt = email_salt(email);
    let mut out = vec![0u8; KDF_OUT_LEN];
    argon2.hash_password_into(pin.expose_secret().as_bytes(), &salt, &mut out)?;
    Ok(VaultKey {
        kdf_out: SecretBytes::from(out),
    })
}

fn hkdf_expand(key: &VaultKey, info: &[u8]) -> Result<SecretBytes, CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, key.kdf_out.expose_secret());

    let mut out = vec![0u8; 32];
    hk.expand(info, &mut out).map_err(|_| CryptoError::Hkdf)?;
    Ok(SecretBytes::from(out))
}

/// Compute the non-secret verification token for a key.
///
/// One-way and deterministic; stored on the user record and compared for
/// byte equality to decide whether an entered PIN is correct. Never used for
/// anything else.
pub fn verification_token(key: &VaultKey) -> Result<String, CryptoError> {
    let check = hkdf_expand(key, HKDF_INFO_CHECK)?;
    Ok(hex_string(check.expose_secret()))
}

/// Encrypt one sensitive field value under the vault key.
///
/// Output format: `sv1:` + base64(nonce || ciphertext+tag). Each call draws
/// a fresh nonce, so sealing the same plaintext twice yields different
/// strings that both open to it.
pub fn seal_field(key: &VaultKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let field_key = hkdf_expand(key, HKDF_INFO_FIELD_KEY)?;
    let cipher = XChaCha20Poly1305::new_from_slice(field_key.expose_secret())
        .map_err(|_| CryptoError::Aead)?;

    let nonce = random_bytes::<XCHACHA_NONCE_LEN>();
    let ct = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: FIELD_AAD,
            },
        )
        .map_err(|_| CryptoError::Aead)?;

    let mut raw = Vec::with_capacity(XCHACHA_NONCE_LEN + ct.len());
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&ct);

    let mut out = String::with_capacity(FIELD_PREFIX.len() + raw.len().div_ceil(3) * 4);
    out.push_str(FIELD_PREFIX);
    B64.encode_string(&raw, &mut out);
    Ok(out)
}

/// Decrypt one sealed field string under the vault key.
///
/// Fails with `MalformedCiphertext` when the string is not something
/// `seal_field` could have produced, and with `Aead` when authentication
/// fails (wrong key or tampered data).
pub fn open_field(key: &VaultKey, sealed: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let encoded = sealed
        .strip_prefix(FIELD_PREFIX)
        .ok_or(CryptoError::MalformedCiphertext)?;
    let raw = B64
        .decode(encoded)
        .map_err(|_| CryptoError::MalformedCiphertext)?;
    if raw.len() < XCHACHA_NONCE_LEN + AEAD_TAG_LEN {
        return Err(CryptoError::MalformedCiphertext);
    }
    let (nonce, ct) = raw.split_at(XCHACHA_NONCE_LEN);

    let field_key = hkdf_expand(key, HKDF_INFO_FIELD_KEY)?;
    let cipher = XChaCha20Poly1305::new_from_slice(field_key.expose_secret())
        .map_err(|_| CryptoError::Aead)?;
    let plaintext = cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ct,
                aad: FIELD_AAD,
            },
        )
        .map_err(|_| CryptoError::Aead)?;
    Ok(Zeroizing::new(plaintext))
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(pin: &str, email: &str) -> VaultKey {
        let pin = SecretString::new(pin.to_string().into_boxed_str());
        derive_vault_key(&pin, email, KdfParams::for_tests()).unwrap()
    }

    #[test]
    fn derivation_is_deterministic() {
        let a = key("1234", "u@x.com");
        let b = key("1234", "u@x.com");
        assert_eq!(a.expose_for_tests(), b.expose_for_tests());
    }

    #[test]
    fn email_salt_ignores_case_and_whitespace() {
        let a = key("1234", " User@Example.com ");
        let b = key("1234", "user@example.com");
        assert_eq!(a.expose_for_tests(), b.expose_for_tests());
    }

    #[test]
    fn different_pins_yield_different_keys_and_tokens() {
        let a = key("1234", "a@b.com");
        let b = key("4321", "a@b.com");
        assert_ne!(a.expose_for_tests(), b.expose_for_tests());
        assert_ne!(
            verification_token(&a).unwrap(),
            verification_token(&b).unwrap()
        );
    }

    #[test]
    fn verification_token_is_stable() {
        let a = key("1234", "u@x.com");
        let b = key("1234", "u@x.com");
        assert_eq!(
            verification_token(&a).unwrap(),
            verification_token(&b).unwrap()
        );
    }

    #[test]
    fn seal_open_roundtrip() {
        let k = key("1234", "u@x.com");
        let sealed = seal_field(&k, b"Netflix").unwrap();
        assert!(sealed.starts_with("sv1:"));

        let opened = open_field(&k, &sealed).unwrap();
        assert_eq!(opened.as_slice(), b"Netflix");
    }

    #[test]
    fn sealing_twice_differs_but_both_open() {
        let k = key("1234", "u@x.com");
        let a = seal_field(&k, b"50000").unwrap();
        let b = seal_field(&k, b"50000").unwrap();
        assert_ne!(a, b);
        assert_eq!(open_field(&k, &a).unwrap().as_slice(), b"50000");
        assert_eq!(open_field(&k, &b).unwrap().as_slice(), b"50000");
    }

    #[test]
    fn open_fails_under_wrong_key() {
        let k1 = key("1234", "u@x.com");
        let k2 = key("5678", "u@x.com");
        let sealed = seal_field(&k1, b"Netflix").unwrap();
        let err = open_field(&k2, &sealed).unwrap_err();
        assert!(matches!(err, CryptoError::Aead));
    }

    #[test]
    fn open_fails_on_tamper() {
        let k = key("1234", "u@x.com");
        let sealed = seal_field(&k, b"Netflix").unwrap();

        let mut raw = B64.decode(sealed.strip_prefix("sv1:").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let mut tampered = String::from("sv1:");
        B64.encode_string(&raw, &mut tampered);

        let err = open_field(&k, &tampered).unwrap_err();
        assert!(matches!(err, CryptoError::Aead));
    }

    #[test]
    fn open_rejects_garbage_input() {
        let k = key("1234", "u@x.com");
        for junk in ["", "not-a-ciphertext", "sv1:", "sv1:!!!!", "sv1:AAAA"] {
            let err = open_field(&k, junk).unwrap_err();
            assert!(matches!(err, CryptoError::MalformedCiphertext), "{junk}");
        }
    }
}

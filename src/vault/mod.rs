pub mod crypto;
pub mod gate;
pub mod rotate;
pub mod session;

mod prompt;

pub use gate::{GateError, UnlockPolicy, VaultGate, VaultStatus, vault_status};
pub use prompt::{PromptError, prompt_new_pin, prompt_pin};
pub use rotate::{RotateError, RotationOutcome, rotate_pin, verify_current_pin};
pub use session::{Decrypted, SessionError, VaultSession};

const TEST_KDF_ENV: &str = "SELAV_TEST_KDF";

/// KDF parameters for this process: interactive-grade, or the cheap test
/// profile when `SELAV_TEST_KDF` is set (integration tests derive dozens of
/// keys and must not pay the interactive cost each time).
pub fn kdf_params() -> crypto::KdfParams {
    if std::env::var_os(TEST_KDF_ENV).is_some() {
        crypto::KdfParams::for_tests()
    } else {
        crypto::KdfParams::interactive()
    }
}

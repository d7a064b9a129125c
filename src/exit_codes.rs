use crate::store::StoreError;
use crate::vault::{GateError, PromptError, RotateError, SessionError};
use crate::config;
use std::process::ExitCode;

pub const EXIT_USAGE: u8 = 64;
pub const EXIT_IO: u8 = 2;
pub const EXIT_SOFTWARE: u8 = 1;

pub fn exit_code_for_store_error(error: &StoreError) -> ExitCode {
    use StoreError::*;

    match error {
        NotInitialized | AlreadyExists(_) | SubscriptionNotFound(_) => ExitCode::from(EXIT_USAGE),
        Io(_) | LockFailed | StoreDirUnavailable => ExitCode::from(EXIT_IO),
        Corrupt(_) | UnsupportedSchema(_) => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_gate_error(error: &GateError) -> ExitCode {
    use GateError::*;

    match error {
        WrongPin { .. } | AlreadySetUp | NotSetUp => ExitCode::from(EXIT_USAGE),
        SetupNotDurable(_) => ExitCode::from(EXIT_IO),
        Store(err) => exit_code_for_store_error(err),
        Crypto(_) => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_rotate_error(error: &RotateError) -> ExitCode {
    use RotateError::*;

    match error {
        WrongPin | NotSetUp | VaultLocked => ExitCode::from(EXIT_USAGE),
        Persist(_) => ExitCode::from(EXIT_IO),
        Store(err) => exit_code_for_store_error(err),
        Crypto(_) => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_prompt_error(error: &PromptError) -> ExitCode {
    use PromptError::*;

    match error {
        Io(_) => ExitCode::from(EXIT_IO),
        NotFourDigits | Mismatch => ExitCode::from(EXIT_USAGE),
    }
}

pub fn exit_code_for_session_error(error: &SessionError) -> ExitCode {
    use SessionError::*;

    match error {
        Locked => ExitCode::from(EXIT_USAGE),
        Crypto(_) => ExitCode::from(EXIT_SOFTWARE),
    }
}

pub fn exit_code_for_config_error(error: &config::ConfigError) -> ExitCode {
    use config::ConfigError::*;

    match error {
        ConfigDirUnavailable | Io(_) => ExitCode::from(EXIT_IO),
        Parse(_) | Serialize(_) => ExitCode::from(EXIT_SOFTWARE),
    }
}

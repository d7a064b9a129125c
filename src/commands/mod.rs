mod config;
mod income;
mod init;
mod pin;
mod status;
mod sub;

use crate::app::AppContext;
use crate::store::{FileStore, store_path};
use crate::vault::{self, VaultGate, VaultSession};
use crate::{cli, exit_codes};
use std::process::ExitCode;

pub fn dispatch(command: cli::Commands, ctx: &AppContext) -> ExitCode {
    match command {
        cli::Commands::Init(args) => init::run(args, ctx),
        cli::Commands::Status(args) => status::run(args, ctx),
        cli::Commands::SetPin(args) => pin::set_pin(args, ctx),
        cli::Commands::RotatePin(args) => pin::rotate_pin(args, ctx),
        cli::Commands::Income(args) => income::run(args, ctx),
        cli::Commands::Sub(args) => sub::run(args, ctx),
        cli::Commands::Config(args) => config::run(args, ctx),
    }
}

pub(crate) fn open_store(arg: &cli::StorePathArg) -> Result<FileStore, ExitCode> {
    match store_path(arg.store.as_deref()) {
        Ok(path) => Ok(FileStore::open(&path)),
        Err(error) => {
            eprintln!("Error: {error}");
            Err(exit_codes::exit_code_for_store_error(&error))
        }
    }
}

/// Prompt for the PIN and unlock a fresh session against the stored
/// verification token. Every command that touches plaintext goes through
/// here; the session lives for the rest of the process and is dropped (key
/// zeroized) on exit.
pub(crate) fn unlock_interactive(store: &FileStore) -> Result<VaultSession, ExitCode> {
    let pin = match vault::prompt_pin("PIN: ") {
        Ok(pin) => pin,
        Err(error) => {
            eprintln!("Error: {error}");
            return Err(exit_codes::exit_code_for_prompt_error(&error));
        }
    };

    let mut session = VaultSession::new();
    let mut gate = VaultGate::new(vault::kdf_params());
    match gate.unlock(store, &mut session, &pin) {
        Ok(()) => Ok(session),
        Err(error) => {
            eprintln!("Error: {error}");
            Err(exit_codes::exit_code_for_gate_error(&error))
        }
    }
}

pub(crate) fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

use crate::app::AppContext;
use crate::vault::{self, GateError, VaultGate, VaultSession};
use crate::{cli, exit_codes, output};
use serde_json::json;
use std::process::ExitCode;

pub fn set_pin(args: cli::SetPinArgs, ctx: &AppContext) -> ExitCode {
    let mut store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let pin = match vault::prompt_new_pin("New PIN: ", "Confirm PIN: ") {
        Ok(pin) => pin,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_prompt_error(&error);
        }
    };

    let mut session = VaultSession::new();
    let mut gate = VaultGate::new(vault::kdf_params());
    match gate.setup(&mut store, &mut session, &pin) {
        Ok(()) => output::print_value(
            "PIN set".to_string(),
            json!({
                "kind": "set-pin",
                "path": store.path().display().to_string(),
            }),
            &ctx.output_mode,
        ),
        Err(error @ GateError::SetupNotDurable(_)) => {
            // The PIN works for this session only; without a durable token a
            // future unlock will not recognize it.
            eprintln!("Error: {error}");
            eprintln!("Run `selav set-pin` again once the store is writable.");
            exit_codes::exit_code_for_gate_error(&error)
        }
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_gate_error(&error)
        }
    }
}

pub fn rotate_pin(args: cli::RotatePinArgs, ctx: &AppContext) -> ExitCode {
    let mut store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    // Verify step: the current PIN must reproduce the stored token.
    let current = match vault::prompt_pin("Current PIN: ") {
        Ok(pin) => pin,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_prompt_error(&error);
        }
    };

    if let Err(error) = vault::verify_current_pin(&store, &current, vault::kdf_params()) {
        eprintln!("Error: {error}");
        return exit_codes::exit_code_for_rotate_error(&error);
    }

    // Load the old key into the session; rotation decrypts with it below.
    let mut session = VaultSession::new();
    let mut gate = VaultGate::new(vault::kdf_params());
    if let Err(error) = gate.unlock(&store, &mut session, &current) {
        eprintln!("Error: {error}");
        return exit_codes::exit_code_for_gate_error(&error);
    }

    // Commit step: new PIN, re-seal everything, switch keys atomically.
    let new_pin = match vault::prompt_new_pin("New PIN: ", "Confirm new PIN: ") {
        Ok(pin) => pin,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_prompt_error(&error);
        }
    };

    match vault::rotate_pin(&mut store, &mut session, &new_pin, vault::kdf_params()) {
        Ok(outcome) => {
            if outcome.carried_unreadable > 0 {
                eprintln!(
                    "Warning: {} field(s) could not be read under the old key and were left as-is.",
                    outcome.carried_unreadable
                );
            }
            output::print_value(
                format!("PIN rotated; {} field(s) re-encrypted", outcome.resealed_fields),
                json!({
                    "kind": "rotate-pin",
                    "path": store.path().display().to_string(),
                    "resealed_fields": outcome.resealed_fields,
                    "carried_unreadable": outcome.carried_unreadable,
                }),
                &ctx.output_mode,
            )
        }
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_rotate_error(&error)
        }
    }
}

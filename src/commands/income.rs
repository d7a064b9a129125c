use crate::app::AppContext;
use crate::store::{RecordStore, UserPatch};
use crate::{cli, exit_codes, output};
use serde_json::json;
use std::process::ExitCode;

pub fn run(args: cli::IncomeArgs, ctx: &AppContext) -> ExitCode {
    match args.command {
        cli::IncomeCommands::Set(args) => set(args, ctx),
        cli::IncomeCommands::Show(args) => show(args, ctx),
    }
}

fn set(args: cli::IncomeSetArgs, ctx: &AppContext) -> ExitCode {
    if args.amount.parse::<f64>().is_err() {
        eprintln!("Error: amount must be a number");
        return ExitCode::from(exit_codes::EXIT_USAGE);
    }

    let mut store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let session = match super::unlock_interactive(&store) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let sealed = match session.encrypt(&args.amount) {
        Ok(sealed) => sealed,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_session_error(&error);
        }
    };

    match store.update_user(UserPatch {
        monthly_income_enc: Some(sealed),
        ..Default::default()
    }) {
        Ok(()) => output::print_value(
            "income saved".to_string(),
            json!({
                "kind": "income-set",
                "path": store.path().display().to_string(),
            }),
            &ctx.output_mode,
        ),
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_store_error(&error)
        }
    }
}

fn show(args: cli::IncomeShowArgs, ctx: &AppContext) -> ExitCode {
    let store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let session = match super::unlock_interactive(&store) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let user = match store.user_record() {
        Ok(user) => user,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_store_error(&error);
        }
    };

    // Empty-string decrypts mean "no data visible", rendered as zero; they
    // are never an error here.
    let decrypted = session.decrypt_opt(user.monthly_income_enc.as_deref());
    let amount = if decrypted.text().is_empty() {
        "0".to_string()
    } else {
        decrypted.text().to_string()
    };

    output::print_value(
        amount.clone(),
        json!({
            "kind": "income-show",
            "amount": amount,
            "readable": decrypted.is_plain(),
        }),
        &ctx.output_mode,
    )
}

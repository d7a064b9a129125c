use crate::app::AppContext;
use crate::vault::vault_status;
use crate::{cli, exit_codes, output};
use serde_json::json;
use std::process::ExitCode;

pub fn run(args: cli::StatusArgs, ctx: &AppContext) -> ExitCode {
    let store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    if !store.exists() {
        return output::print_value(
            "missing".to_string(),
            json!({
                "kind": "status",
                "path": store.path().display().to_string(),
                "status": "missing",
            }),
            &ctx.output_mode,
        );
    }

    match vault_status(&store) {
        Ok(status) => output::print_value(
            status.as_str().to_string(),
            json!({
                "kind": "status",
                "path": store.path().display().to_string(),
                "status": status.as_str(),
            }),
            &ctx.output_mode,
        ),
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_store_error(&error)
        }
    }
}

use crate::app::AppContext;
use crate::store::{FileStore, store_path};
use crate::{cli, exit_codes, output};
use serde_json::json;
use std::process::ExitCode;

pub fn run(args: cli::InitArgs, ctx: &AppContext) -> ExitCode {
    let path = match store_path(args.path.store.as_deref()) {
        Ok(path) => path,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_store_error(&error);
        }
    };

    match FileStore::init(&path, &args.email) {
        Ok(store) => output::print_value(
            store.path().display().to_string(),
            json!({
                "kind": "init",
                "path": store.path().display().to_string(),
                "email": args.email,
            }),
            &ctx.output_mode,
        ),
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_store_error(&error)
        }
    }
}

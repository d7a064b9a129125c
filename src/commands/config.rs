use crate::app::AppContext;
use crate::config::{self, Preferences};
use crate::{cli, exit_codes, output};
use serde_json::json;
use std::process::ExitCode;

pub fn run(args: cli::ConfigArgs, ctx: &AppContext) -> ExitCode {
    match args.command {
        cli::ConfigCommands::SetCurrency(args) => set_currency(args, ctx),
        cli::ConfigCommands::Show => show(ctx),
    }
}

fn set_currency(args: cli::ConfigSetCurrencyArgs, ctx: &AppContext) -> ExitCode {
    let mut prefs = match config::load_preferences() {
        Ok(prefs) => prefs,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_config_error(&error);
        }
    };

    prefs.currency = args.currency;

    match config::save_preferences(&prefs) {
        Ok(()) => output::print_value(
            prefs.currency.symbol().to_string(),
            json!({
                "kind": "config-set-currency",
                "currency": prefs.currency.symbol(),
            }),
            &ctx.output_mode,
        ),
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_config_error(&error)
        }
    }
}

fn show(ctx: &AppContext) -> ExitCode {
    let Preferences { currency } = match config::load_preferences() {
        Ok(prefs) => prefs,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_config_error(&error);
        }
    };

    output::print_value(
        format!("currency:\t{}", currency.symbol()),
        json!({
            "kind": "config-show",
            "currency": currency.symbol(),
        }),
        &ctx.output_mode,
    )
}

use crate::app::AppContext;
use crate::config;
use crate::output::subscription::{subscription_summary_json, subscription_summary_text};
use crate::store::{RecordStore, SubscriptionPatch, SubscriptionRecord};
use crate::vault::VaultSession;
use crate::{cli, exit_codes, output};
use serde_json::json;
use std::process::ExitCode;
use uuid::Uuid;

pub fn run(args: cli::SubArgs, ctx: &AppContext) -> ExitCode {
    match args.command {
        cli::SubCommands::Add(args) => add(args, ctx),
        cli::SubCommands::List(args) => list(args, ctx),
        cli::SubCommands::Edit(args) => edit(args, ctx),
        cli::SubCommands::Rm(args) => rm(args, ctx),
    }
}

fn add(args: cli::SubAddArgs, ctx: &AppContext) -> ExitCode {
    if args.amount.parse::<f64>().is_err() {
        eprintln!("Error: amount must be a number");
        return ExitCode::from(exit_codes::EXIT_USAGE);
    }

    let currency = match args.currency {
        Some(currency) => currency,
        None => match config::load_preferences() {
            Ok(prefs) => prefs.currency,
            Err(error) => {
                eprintln!("Error: {error}");
                return exit_codes::exit_code_for_config_error(&error);
            }
        },
    };

    let mut store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let session = match super::unlock_interactive(&store) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let (name_enc, amount_enc) = match seal_pair(&session, &args.name, &args.amount) {
        Ok(pair) => pair,
        Err(code) => return code,
    };

    let now = super::now_secs();
    let record = SubscriptionRecord {
        id: Uuid::new_v4(),
        name_enc,
        amount_enc,
        currency,
        billing_cycle: args.cycle,
        next_billing: args.next_billing,
        auto_renew: !args.no_auto_renew,
        is_trial: args.trial,
        category: args.category,
        created_at: now,
        updated_at: now,
    };
    let id = record.id;

    match store.create_subscription(record) {
        Ok(()) => {
            let value = id.to_string();
            let meta = json!({
                "kind": "sub-add",
                "path": store.path().display().to_string(),
                "id": value,
            });

            if ctx.output_mode.quiet {
                output::print_value(value, meta, &ctx.output_mode)
            } else {
                output::print_value(format!("Added {value}"), meta, &ctx.output_mode)
            }
        }
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_store_error(&error)
        }
    }
}

fn list(args: cli::SubListArgs, ctx: &AppContext) -> ExitCode {
    let store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let session = match super::unlock_interactive(&store) {
        Ok(session) => session,
        Err(code) => return code,
    };

    let subscriptions = match store.subscriptions() {
        Ok(subs) => subs,
        Err(error) => {
            eprintln!("Error: {error}");
            return exit_codes::exit_code_for_store_error(&error);
        }
    };

    if ctx.output_mode.json {
        let rows: Vec<serde_json::Value> = subscriptions
            .iter()
            .map(|record| {
                let name = session.decrypt(&record.name_enc);
                let amount = session.decrypt(&record.amount_enc);
                subscription_summary_json(record, name.text(), amount.text())
            })
            .collect();
        let payload = json!({
            "value": rows,
            "meta": { "kind": "sub-list", "count": subscriptions.len() },
        });
        println!("{payload}");
        return ExitCode::SUCCESS;
    }

    for record in &subscriptions {
        let name = session.decrypt(&record.name_enc);
        let amount = session.decrypt(&record.amount_enc);
        println!(
            "{}",
            subscription_summary_text(record, name.text(), amount.text())
        );
    }
    ExitCode::SUCCESS
}

fn edit(args: cli::SubEditArgs, ctx: &AppContext) -> ExitCode {
    let id = match parse_id(&args.id) {
        Ok(id) => id,
        Err(code) => return code,
    };

    if let Some(amount) = args.amount.as_deref() {
        if amount.parse::<f64>().is_err() {
            eprintln!("Error: amount must be a number");
            return ExitCode::from(exit_codes::EXIT_USAGE);
        }
    }

    let mut store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let session = match super::unlock_interactive(&store) {
        Ok(session) => session,
        Err(code) => return code,
    };

    // Edited sensitive fields are replaced wholesale with fresh ciphertext.
    let mut patch = SubscriptionPatch {
        currency: args.currency,
        billing_cycle: args.cycle,
        next_billing: args.next_billing,
        category: args.category,
        updated_at: Some(super::now_secs()),
        ..Default::default()
    };
    if let Some(name) = args.name.as_deref() {
        match session.encrypt(name) {
            Ok(sealed) => patch.name_enc = Some(sealed),
            Err(error) => {
                eprintln!("Error: {error}");
                return exit_codes::exit_code_for_session_error(&error);
            }
        }
    }
    if let Some(amount) = args.amount.as_deref() {
        match session.encrypt(amount) {
            Ok(sealed) => patch.amount_enc = Some(sealed),
            Err(error) => {
                eprintln!("Error: {error}");
                return exit_codes::exit_code_for_session_error(&error);
            }
        }
    }

    match store.update_subscription(id, patch) {
        Ok(()) => output::print_value(
            format!("Updated {id}"),
            json!({
                "kind": "sub-edit",
                "path": store.path().display().to_string(),
                "id": id.to_string(),
            }),
            &ctx.output_mode,
        ),
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_store_error(&error)
        }
    }
}

fn rm(args: cli::SubRmArgs, ctx: &AppContext) -> ExitCode {
    let id = match parse_id(&args.id) {
        Ok(id) => id,
        Err(code) => return code,
    };

    let mut store = match super::open_store(&args.path) {
        Ok(store) => store,
        Err(code) => return code,
    };

    match store.delete_subscription(id) {
        Ok(()) => output::print_value(
            format!("Removed {id}"),
            json!({
                "kind": "sub-rm",
                "path": store.path().display().to_string(),
                "id": id.to_string(),
            }),
            &ctx.output_mode,
        ),
        Err(error) => {
            eprintln!("Error: {error}");
            exit_codes::exit_code_for_store_error(&error)
        }
    }
}

fn seal_pair(
    session: &VaultSession,
    name: &str,
    amount: &str,
) -> Result<(String, String), ExitCode> {
    let name_enc = session.encrypt(name).map_err(|error| {
        eprintln!("Error: {error}");
        exit_codes::exit_code_for_session_error(&error)
    })?;
    let amount_enc = session.encrypt(amount).map_err(|error| {
        eprintln!("Error: {error}");
        exit_codes::exit_code_for_session_error(&error)
    })?;
    Ok((name_enc, amount_enc))
}

fn parse_id(raw: &str) -> Result<Uuid, ExitCode> {
    Uuid::parse_str(raw).map_err(|_| {
        eprintln!("Error: invalid subscription id '{raw}'");
        ExitCode::from(exit_codes::EXIT_USAGE)
    })
}

mod app;
mod cli;
mod commands;
mod config;
mod exit_codes;
mod output;
mod store;
mod vault;

use std::process::ExitCode;

fn main() -> ExitCode {
    app::run()
}

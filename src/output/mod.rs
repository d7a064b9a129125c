pub mod subscription;

use serde_json::json;
use std::process::ExitCode;

pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
}

pub fn print_value(value: String, meta: serde_json::Value, output_mode: &OutputMode) -> ExitCode {
    if output_mode.json {
        let payload = json!({
            "value": value,
            "meta": meta,
        });
        println!("{payload}");
    } else {
        println!("{value}");
    }

    ExitCode::SUCCESS
}

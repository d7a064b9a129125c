use crate::store::{BillingCycle, Category, Currency};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "selav",
    author,
    version,
    about = "Subscription tracker with a PIN-locked, zero-knowledge vault.",
    long_about = "Subscription tracker whose sensitive fields (names, amounts, income) are \
encrypted client-side with a key derived from your 4-digit PIN. The store only ever holds \
ciphertext and a verification hash, never the PIN or the key."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true, help = "Emit machine-readable JSON output.")]
    pub json: bool,

    #[arg(long, global = true, help = "Suppress decorative output.")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Create a local store for an account.")]
    Init(InitArgs),

    #[command(about = "Report whether the vault needs setup or a PIN unlock.")]
    Status(StatusArgs),

    #[command(name = "set-pin", about = "Set up the vault PIN for the first time.")]
    SetPin(SetPinArgs),

    #[command(
        name = "rotate-pin",
        about = "Change the PIN, re-encrypting all vault data under the new key."
    )]
    RotatePin(RotatePinArgs),

    #[command(about = "Manage the encrypted monthly income.")]
    Income(IncomeArgs),

    #[command(about = "Manage subscriptions (names and amounts are encrypted).")]
    Sub(SubArgs),

    #[command(about = "Manage non-secret preferences.")]
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct StorePathArg {
    #[arg(
        long,
        value_name = "FILE",
        help = "Override the store file path (also settable via SELAV_STORE)."
    )]
    pub store: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(long, help = "Account email; doubles as the key-derivation salt.")]
    pub email: String,

    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct SetPinArgs {
    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct RotatePinArgs {
    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct IncomeArgs {
    #[command(subcommand)]
    pub command: IncomeCommands,
}

#[derive(Debug, Subcommand)]
pub enum IncomeCommands {
    #[command(about = "Encrypt and store the monthly income.")]
    Set(IncomeSetArgs),

    #[command(about = "Decrypt and print the monthly income.")]
    Show(IncomeShowArgs),
}

#[derive(Debug, Args)]
pub struct IncomeSetArgs {
    #[arg(help = "Monthly income amount, e.g. 50000.")]
    pub amount: String,

    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct IncomeShowArgs {
    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct SubArgs {
    #[command(subcommand)]
    pub command: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    #[command(about = "Add a subscription.")]
    Add(SubAddArgs),

    #[command(about = "List subscriptions (decrypted with your PIN).")]
    List(SubListArgs),

    #[command(about = "Edit a subscription.")]
    Edit(SubEditArgs),

    #[command(about = "Remove a subscription.")]
    Rm(SubRmArgs),
}

#[derive(Debug, Args)]
pub struct SubAddArgs {
    #[arg(long, help = "Service name (stored encrypted).")]
    pub name: String,

    #[arg(long, help = "Billing amount (stored encrypted).")]
    pub amount: String,

    #[arg(long, value_enum, help = "Billing currency; defaults to the configured one.")]
    pub currency: Option<Currency>,

    #[arg(long, value_enum, default_value = "monthly", help = "Billing cycle.")]
    pub cycle: BillingCycle,

    #[arg(long, value_name = "DATE", help = "Next billing date, e.g. 2026-09-01.")]
    pub next_billing: String,

    #[arg(long, value_enum, default_value = "other", help = "Category.")]
    pub category: Category,

    #[arg(long, action = clap::ArgAction::SetTrue, help = "Mark as a trial.")]
    pub trial: bool,

    #[arg(long, action = clap::ArgAction::SetTrue, help = "Disable auto-renew.")]
    pub no_auto_renew: bool,

    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct SubListArgs {
    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct SubEditArgs {
    #[arg(help = "Subscription id.")]
    pub id: String,

    #[arg(long, help = "New service name (re-encrypted).")]
    pub name: Option<String>,

    #[arg(long, help = "New billing amount (re-encrypted).")]
    pub amount: Option<String>,

    #[arg(long, value_enum, help = "New billing currency.")]
    pub currency: Option<Currency>,

    #[arg(long, value_enum, help = "New billing cycle.")]
    pub cycle: Option<BillingCycle>,

    #[arg(long, value_name = "DATE", help = "New next billing date.")]
    pub next_billing: Option<String>,

    #[arg(long, value_enum, help = "New category.")]
    pub category: Option<Category>,

    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct SubRmArgs {
    #[arg(help = "Subscription id.")]
    pub id: String,

    #[command(flatten)]
    pub path: StorePathArg,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Set the default currency for new subscriptions.")]
    SetCurrency(ConfigSetCurrencyArgs),

    #[command(about = "Print the current preferences.")]
    Show,
}

#[derive(Debug, Args)]
pub struct ConfigSetCurrencyArgs {
    #[arg(value_enum)]
    pub currency: Currency,
}

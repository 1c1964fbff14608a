// ledgermatch - reconcile two transaction ledgers from the command line

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ledgermatch_recon::{FieldType, ModeName, ReconError, Status};

use exit_codes::{recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "ledgermatch")]
#[command(about = "Reconcile two transaction ledgers (bank, processor, books)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile ledger A against ledger B
    #[command(after_help = "\
Examples:
  ledgermatch reconcile bank.csv books.csv
  ledgermatch reconcile bank.csv books.csv --id-a Ref --id-b transaction_id --json
  ledgermatch reconcile bank.csv stripe.csv --detect --export diffs.csv --status MISMATCH
  ledgermatch reconcile bank.csv books.csv --mode custom --keys-a Date,Memo --keys-b posted,narrative \\
      --field-type Date=date --field-type posted=date --amount-tolerance 0.01
  ledgermatch reconcile bank.csv books.csv --config daily.recon.toml

Exit codes:
  0  every record MATCHED
  1  differences found
  2  usage error
  3  input parse error
  4  invalid request or config")]
    Reconcile(ReconcileArgs),

    /// Detect which columns carry id, amount, date and description
    #[command(after_help = "\
Examples:
  ledgermatch profile bank.csv
  ledgermatch profile bank.csv --json")]
    Profile {
        /// CSV file to inspect
        file: PathBuf,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate a request file without running
    #[command(after_help = "\
Examples:
  ledgermatch validate daily.recon.toml
  ledgermatch validate request.json")]
    Validate {
        /// Path to a .toml or .json request file
        config: PathBuf,
    },
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// Ledger A (CSV with header row)
    pub a: PathBuf,

    /// Ledger B (CSV with header row)
    pub b: PathBuf,

    /// Request file (.toml or .json). Flags override its values.
    #[arg(long, env = "LEDGERMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Matching mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[command(flatten)]
    pub columns: ColumnArgs,

    /// Fill unmapped columns from header/value detection
    #[arg(long)]
    pub detect: bool,

    #[command(flatten)]
    pub rules: RuleArgs,

    /// Output JSON to stdout
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Write records as CSV to file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Only export records with this status (MATCHED, MISMATCH, MISSING_IN_A, MISSING_IN_B)
    #[arg(long, requires = "export", value_parser = parse_status)]
    pub status: Option<Status>,

    /// Suppress the summary on stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args, Default)]
pub struct ColumnArgs {
    /// ID column in A
    #[arg(long)]
    pub id_a: Option<String>,
    /// ID column in B
    #[arg(long)]
    pub id_b: Option<String>,
    /// Amount column in A
    #[arg(long)]
    pub amount_a: Option<String>,
    /// Amount column in B
    #[arg(long)]
    pub amount_b: Option<String>,
    /// Date column in A
    #[arg(long)]
    pub date_a: Option<String>,
    /// Date column in B
    #[arg(long)]
    pub date_b: Option<String>,
    /// Description column in A
    #[arg(long)]
    pub description_a: Option<String>,
    /// Description column in B
    #[arg(long)]
    pub description_b: Option<String>,
}

#[derive(Args, Default)]
pub struct RuleArgs {
    /// Allowed absolute amount difference (custom mode)
    #[arg(long, allow_negative_numbers = true)]
    pub amount_tolerance: Option<f64>,

    /// Allowed absolute date difference in days (custom mode)
    #[arg(long, allow_negative_numbers = true)]
    pub date_tolerance_days: Option<f64>,

    /// Composite key columns in A, comma-separated (custom mode)
    #[arg(long, value_delimiter = ',')]
    pub keys_a: Vec<String>,

    /// Composite key columns in B, comma-separated (custom mode)
    #[arg(long, value_delimiter = ',')]
    pub keys_b: Vec<String>,

    /// Key normalization for a column: COL=number|date|string (repeatable)
    #[arg(long = "field-type", value_parser = parse_field_type)]
    pub field_types: Vec<(String, FieldType)>,
}

impl RuleArgs {
    pub fn is_empty(&self) -> bool {
        self.amount_tolerance.is_none()
            && self.date_tolerance_days.is_none()
            && self.keys_a.is_empty()
            && self.keys_b.is_empty()
            && self.field_types.is_empty()
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Join on the id column
    Auto,
    /// Join on composite keys with tolerances
    Custom,
}

impl From<ModeArg> for ModeName {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ModeName::Auto,
            ModeArg::Custom => ModeName::Custom,
        }
    }
}

fn parse_status(s: &str) -> Result<Status, String> {
    s.parse::<Status>().map_err(|e| e.to_string())
}

fn parse_field_type(s: &str) -> Result<(String, FieldType), String> {
    let (column, kind) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COL=TYPE, got '{s}'"))?;
    if column.trim().is_empty() {
        return Err(format!("missing column name in '{s}'"));
    }
    Ok((column.to_string(), kind.parse()?))
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("LEDGERMATCH_GIT_HASH"), ")",
        "\nengine:  ledgermatch-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::InvalidRequest(_) => {
                Some("custom mode needs --keys-a and --keys-b with the same number of columns".to_string())
            }
            ReconError::EmptyInput(_) => Some("the first line must be a header row".to_string()),
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

// ============================================================================
// Entry point
// ============================================================================

fn main() -> ExitCode {
    // Logs go to stderr; stdout is reserved for --json. Set RUST_LOG=debug for detail.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Reconcile(args) => recon::cmd_reconcile(args),
        Commands::Profile { file, json } => recon::cmd_profile(file, json),
        Commands::Validate { config } => recon::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn field_type_flag() {
        assert_eq!(parse_field_type("Date=date").unwrap(), ("Date".to_string(), FieldType::Date));
        assert_eq!(parse_field_type("Amt=NUMBER").unwrap().1, FieldType::Number);
        assert!(parse_field_type("Date").is_err());
        assert!(parse_field_type("=date").is_err());
        assert!(parse_field_type("Date=money").is_err());
    }

    #[test]
    fn status_flag_is_case_sensitive() {
        assert_eq!(parse_status("MISSING_IN_A").unwrap(), Status::MissingInA);
        assert!(parse_status("matched").is_err());
    }

    #[test]
    fn keys_split_on_commas() {
        let cli = Cli::try_parse_from([
            "ledgermatch", "reconcile", "a.csv", "b.csv", "--mode", "custom",
            "--keys-a", "Date,Memo", "--keys-b", "posted", "--keys-b", "narrative",
        ])
        .unwrap();
        let Commands::Reconcile(args) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.rules.keys_a, vec!["Date", "Memo"]);
        assert_eq!(args.rules.keys_b, vec!["posted", "narrative"]);
    }

    #[test]
    fn status_requires_export() {
        let err = Cli::try_parse_from(["ledgermatch", "reconcile", "a.csv", "b.csv", "--status", "MISMATCH"]);
        assert!(err.is_err());
    }
}

// GridSheets CLI - push grid data into Google Sheets from the shell

mod exit_codes;
mod menu;
mod sheets;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use gridsheets_protocol::ExportFormat;

/// CLI error carrying its exit code and an optional hint line.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(message: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_USAGE, message: message.into(), hint: None }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_ERROR, message: message.into(), hint: None }
    }
}

#[derive(Parser)]
#[command(name = "gsx")]
#[command(about = "Export grid data to Google Sheets (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store provider credentials (verified with a token exchange first)
    Login {
        /// Path to an OAuth client credentials JSON file
        #[arg(long)]
        credentials: PathBuf,
    },

    /// Delete stored credentials
    Logout,

    /// Export a delimited file to Google Sheets and print the URL
    #[command(after_help = "\
Examples:
  gsx export report.csv --email me@example.com
  gsx export report.csv --format raw --session nightly --session-token 20260807
  gsx export data.tsv --delimiter tab --title 'Q3 Numbers'
  gsx export report.csv --json | jq -r .url")]
    Export {
        /// Input file (delimiter sniffed unless --delimiter is given)
        file: PathBuf,

        /// Export rendition recorded in the sheet tab name
        #[arg(long, value_enum, default_value_t = FormatArg::Formatted)]
        format: FormatArg,

        /// Share the spreadsheet with this email (writer role)
        #[arg(long)]
        email: Option<String>,

        /// Session id — exports in one session reuse one spreadsheet
        #[arg(long, default_value = "default")]
        session: String,

        /// Session invalidation token; change it to force a new spreadsheet
        #[arg(long, default_value_t = 0)]
        session_token: i64,

        /// Title for a newly created spreadsheet (default: dated)
        #[arg(long)]
        title: Option<String>,

        /// Field delimiter: ',', ';', '|', or 'tab'
        #[arg(long)]
        delimiter: Option<String>,

        /// Emit the result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Print the integrated context menu as JSON (host integration aid)
    Menu {
        /// Base menu JSON file (defaults to the host's builtin actions)
        #[arg(long)]
        base: Option<PathBuf>,

        /// Render the menu with the Google Sheets actions suppressed
        #[arg(long)]
        disabled: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Raw,
    Formatted,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Raw => ExportFormat::Raw,
            FormatArg::Formatted => ExportFormat::Formatted,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { credentials } => sheets::cmd_login(credentials),
        Commands::Logout => sheets::cmd_logout(),
        Commands::Export {
            file,
            format,
            email,
            session,
            session_token,
            title,
            delimiter,
            json,
        } => sheets::cmd_export(
            file,
            format.into(),
            email,
            session,
            session_token,
            title,
            delimiter,
            json,
        ),
        Commands::Menu { base, disabled } => menu::cmd_menu(base, disabled),
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            if let Some(hint) = e.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(e.code)
        }
    }
}

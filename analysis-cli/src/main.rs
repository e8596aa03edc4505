//! dog-health: analyze a dog's health profile with Google Gemini.
//!
//! The provider key is kept in a local credential store (`key set`), or the
//! analysis is sent to an operator relay that holds its own key
//! (`analyze --relay-url`).

mod analyze;
mod key;
mod report;

use analysis_core::providers::gemini::GEMINI_API_BASE;
use analysis_core::CredentialStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dog-health",
    about = "AI-assisted dog health risk assessment and supplement plan",
    version
)]
struct Cli {
    /// Directory holding the stored API key [default: ~/.dog-health]
    #[arg(long, env = "DOG_HEALTH_HOME", global = true)]
    home: Option<PathBuf>,

    /// Gemini API base URL.
    #[arg(long, env = "GEMINI_API_BASE", default_value = GEMINI_API_BASE, global = true)]
    api_base: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the stored Google AI API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Analyze a health profile (JSON file, or `-` for stdin).
    Analyze {
        profile: PathBuf,
        /// Send the profile to an operator relay instead of calling Gemini directly.
        #[arg(long, env = "DOG_HEALTH_RELAY_URL")]
        relay_url: Option<String>,
        /// Bearer token for the relay.
        #[arg(long, env = "DOG_HEALTH_RELAY_TOKEN", hide_env_values = true)]
        relay_token: Option<String>,
        /// Print the assessment as JSON instead of a report.
        #[arg(long)]
        json: bool,
    },
    /// List common breeds.
    Breeds,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Validate and store a key. Prompts when KEY is omitted.
    Set {
        key: Option<String>,
        /// Only check the key's format, skip the call to Google.
        #[arg(long)]
        no_verify: bool,
    },
    /// Show whether a key is stored.
    Status,
    /// Remove the stored key.
    Clear,
}

fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dog-health")
}

#[tokio::main]
async fn main() -> ExitCode {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let store = CredentialStore::new(cli.home.unwrap_or_else(default_home));

    let result = match cli.command {
        Command::Key { action } => match action {
            KeyAction::Set { key, no_verify } => {
                key::set(&store, &cli.api_base, key, no_verify).await
            }
            KeyAction::Status => key::status(&store),
            KeyAction::Clear => key::clear(&store),
        },
        Command::Analyze {
            profile,
            relay_url,
            relay_token,
            json,
        } => {
            let target = analyze::Target::new(relay_url, relay_token, &cli.api_base);
            analyze::run(store, &profile, target, json).await
        }
        Command::Breeds => {
            for breed in analysis_core::models::COMMON_BREEDS {
                println!("{}", breed);
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

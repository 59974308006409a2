// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, resolve the
//   store and hand off to the matching flow in `ui`.

use anyhow::Context;
use chayan::ui::{self, DialoguerPrompter};
use chayan::{ApiClient, ConfigStore};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Save, list and replay HTTP API calls.
#[derive(Parser, Debug)]
#[command(name = "chayan")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Saved APIs file (defaults to ~/.chayan/apis.json)
    #[arg(long, global = true, env = "CHAYAN_STORE")]
    store: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save API configuration for future use
    Saveapi,
    /// List all saved APIs
    Listapis,
    /// Test APIs interactively or from saved configs
    Apitest {
        /// Test a saved API by name
        #[arg(short = 't', long = "test")]
        test: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let store = match cli.store {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::new(
            ConfigStore::default_path().context("Failed to resolve saved APIs location")?,
        ),
    };
    tracing::debug!(path = %store.path().display(), "using store");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut prompter = DialoguerPrompter;

    match cli.command {
        Command::Saveapi => ui::save_api(&mut prompter, &store, &mut out)?,
        Command::Listapis => ui::list_apis(&store, &mut out)?,
        Command::Apitest { test } => {
            let client = ApiClient::new()?;
            ui::api_test(&mut prompter, &store, &client, test.as_deref(), &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

// Logs go to stderr so stdout carries only command output.
fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

//! HistoryBlock CLI
//!
//! Inspect keys and manage a blacklist kept in a JSON file, using the same
//! controller the extension runs.

mod browser;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use hb_background::{Browser, Controller, ControllerConfig, Notifier, VisitInfo};
use hb_core::{hash_for, matcher_for, EncryptionMode, HashStrategy, Matcher, MatchingMode};

use crate::browser::LoggingBrowser;
use crate::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "hb-cli")]
#[command(about = "HistoryBlock blacklist tools")]
struct Cli {
    /// JSON file holding the extension storage
    #[arg(long, global = true, default_value = "historyblock.json")]
    store: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Recently-closed polls after a close event
    #[arg(long, global = true, default_value_t = 4)]
    poll_attempts: u32,

    /// Initial delay between recently-closed polls, in milliseconds
    #[arg(long, global = true, default_value_t = 25)]
    poll_backoff_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical key of a URL
    Match {
        url: String,

        #[arg(short, long, default_value = "domain")]
        matching: MatchingMode,
    },

    /// Print the stored entry for a key
    Digest {
        input: String,

        #[arg(short, long, default_value = "sha1")]
        encryption: EncryptionMode,
    },

    /// Blacklist the site of a URL
    Block { url: String },

    /// Remove the site of a URL from the blacklist
    Unblock { url: String },

    /// Simulate a history visit
    Visit { url: String },

    /// List blacklist entries
    List,

    /// Import entries from a file (comma or newline separated)
    Import { input: PathBuf },

    /// Export entries as one comma-separated line
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove every entry
    Clear,

    /// Switch matching mode (clears the blacklist)
    SetMatching { mode: MatchingMode },

    /// Switch encryption mode (clears the blacklist)
    SetEncryption { mode: EncryptionMode },

    /// Turn cookie removal for blacklisted sites on or off
    Cookies { state: Toggle },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let env = env_logger::Env::default().filter_or("RUST_LOG", if cli.verbose { "debug" } else { "warn" });
    env_logger::init_from_env(env);

    let config = ControllerConfig {
        session_poll_attempts: cli.poll_attempts,
        session_poll_backoff: Duration::from_millis(cli.poll_backoff_ms),
    };

    let result = match cli.command {
        Commands::Match { url, matching } => cmd_match(&url, matching),
        Commands::Digest { input, encryption } => {
            println!("{}", hash_for(encryption).digest(&input));
            Ok(())
        }
        command => run_controller(&cli.store, config, command).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_match(url: &str, matching: MatchingMode) -> Result<(), String> {
    let key = matcher_for(matching)
        .match_url(url)
        .ok_or_else(|| format!("No {} key for '{}'", matching, url))?;
    println!("{}", key);
    Ok(())
}

async fn run_controller(store_path: &Path, config: ControllerConfig, command: Commands) -> Result<(), String> {
    let store = Arc::new(JsonFileStore::new(store_path));
    log::debug!("using store {}", store.path().display());

    let browser = Browser::from_shared(Arc::new(LoggingBrowser));
    let controller = Controller::start(store, browser, Notifier::new(), config)
        .await
        .map_err(|e| e.to_string())?;

    run_command(&controller, command).await.map_err(|e| e.to_string())
}

async fn run_command(controller: &Controller, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Block { url } => {
            if controller.block(&url).await? {
                println!("Blocked '{}'", url);
            } else {
                println!("Nothing to block for '{}'", url);
            }
        }
        Commands::Unblock { url } => {
            if controller.unblock(&url).await? {
                println!("Unblocked '{}'", url);
            } else {
                println!("'{}' was not blocked", url);
            }
        }
        Commands::Visit { url } => {
            if controller.on_page_visited(&VisitInfo::new(url.as_str())).await {
                println!("History for '{}' deleted", url);
            } else {
                println!("'{}' is not blacklisted", url);
            }
        }
        Commands::List => {
            println!(
                "Blacklist ({} matching, {} encryption):",
                controller.matching_mode(),
                controller.encryption_mode()
            );
            for entry in controller.list_blacklist().await? {
                println!("  {}", entry);
            }
        }
        Commands::Import { input } => {
            let text = tokio::fs::read_to_string(&input)
                .await
                .map_err(|e| format!("Failed to read '{}': {}", input.display(), e))?;
            let added = controller.import_blacklist(&text.replace('\n', ",")).await?;
            println!("Imported {} entries from '{}'", added, input.display());
        }
        Commands::Export { output } => {
            let line = controller.list_blacklist().await?.join(",");
            match output {
                Some(path) => {
                    tokio::fs::write(&path, format!("{}\n", line))
                        .await
                        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
                    println!("Exported to '{}'", path.display());
                }
                None => println!("{}", line),
            }
        }
        Commands::Clear => {
            controller.clear_blacklist().await?;
            println!("Blacklist cleared");
        }
        Commands::SetMatching { mode } => {
            controller.change_blacklist_matching(mode).await?;
            println!("Matching mode set to {} (blacklist cleared)", mode);
        }
        Commands::SetEncryption { mode } => {
            controller.change_blacklist_encryption(mode).await?;
            println!("Encryption mode set to {} (blacklist cleared)", mode);
        }
        Commands::Cookies { state } => match state {
            Toggle::On => {
                controller.enable_blacklist_cookies().await?;
                println!("Cookie removal enabled");
            }
            Toggle::Off => {
                controller.disable_blacklist_cookies().await?;
                println!("Cookie removal disabled");
            }
        },
        Commands::Match { .. } | Commands::Digest { .. } => {}
    }
    Ok(())
}

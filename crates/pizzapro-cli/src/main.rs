//! Pizza Pro partner CLI.
//!
//! Shows and edits the profile of the store managed by the partner.
//! Profile edits are applied optimistically: the new values are shown
//! right away and reverted if the API rejects them.

use std::io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pizzapro_core::cache::CacheEventKind;
use pizzapro_core::models::ManagedStore;
use pizzapro_core::{ApiClient, CacheManager, Config, QueryKey, StoreProfileService};

#[derive(Parser)]
#[command(name = "pizzapro", version, about = "Pizza Pro partner dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or edit the managed store's profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Print the managed store's profile
    Show,

    /// Update the store name and description
    Update(UpdateArgs),
}

#[derive(Args)]
struct UpdateArgs {
    /// New store name (defaults to the current one)
    #[arg(long)]
    name: Option<String>,

    /// New store description (defaults to the current one)
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,

    /// Send a null description
    #[arg(long)]
    clear_description: bool,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Persist the partner API base URL
    SetBaseUrl { url: String },

    /// Print the config file location and contents
    Show,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Profile(command) => run_profile(command).await,
        Command::Config(command) => run_config(command),
    }
}

fn build_service() -> Result<StoreProfileService<ApiClient>> {
    let config = Config::load().context("Failed to load config")?;
    let base_url = config.api_base_url()?;
    info!(base_url = %base_url, "Using partner API");

    let api = ApiClient::new(base_url, config.request_timeout())?;
    Ok(StoreProfileService::new(api, CacheManager::new()))
}

async fn run_profile(command: ProfileCommand) -> Result<()> {
    let service = build_service()?;
    let store = service
        .managed_store()
        .await
        .context("Failed to load the managed store")?;

    match command {
        ProfileCommand::Show => {
            print_store(&store);
            if let Some(age) = service.cache().age_display(&QueryKey::managed_store()) {
                println!("  (loaded {})", age);
            }
        }
        ProfileCommand::Update(args) => {
            let mut form = service.form();
            if let Some(name) = args.name {
                form = form.with_name(name);
            }
            if args.clear_description {
                form = form.with_description(None);
            } else if let Some(description) = args.description {
                form = form.with_description(Some(description));
            }

            // Echo the speculative value as soon as it lands in the cache
            let mut events = service.cache().subscribe();
            let mut submit = Box::pin(service.submit(form));
            let outcome = loop {
                tokio::select! {
                    biased;
                    outcome = &mut submit => break outcome,
                    Ok(event) = events.recv() => {
                        if event.kind == CacheEventKind::Set {
                            if let Some(store) = service.cache().get(&event.key) {
                                println!("Saving...");
                                print_store(&store);
                            }
                        }
                    }
                }
            };

            println!("{}", outcome.notification);
            if let Some(store) = service.cached_store() {
                print_store(&store);
            }
        }
    }

    Ok(())
}

fn run_config(command: ConfigCommand) -> Result<()> {
    let mut config = Config::load().context("Failed to load config")?;
    match command {
        ConfigCommand::SetBaseUrl { url } => {
            config.api_base_url = Some(url);
            // Validate before persisting
            config.api_base_url()?;
            config.save()?;
            println!("Saved to {}", Config::config_path()?.display());
        }
        ConfigCommand::Show => {
            println!("{}", Config::config_path()?.display());
            println!("{}", config_summary(&config));
        }
    }
    Ok(())
}

fn config_summary(config: &Config) -> String {
    format!(
        "api_base_url: {}\nrequest_timeout: {}s",
        config.api_base_url.as_deref().unwrap_or("(not set)"),
        config.request_timeout().as_secs()
    )
}

fn print_store(store: &ManagedStore) {
    println!("{}", store.name);
    println!("  {}", store.description_display());
}

mod commands;
mod gateway;
mod i18n;
mod lifecycle;
mod service;

#[cfg(test)]
mod testing;

use clap::{Parser, Subcommand};
use i18n::Catalog;
use lifecycle::CommandLifecycle;
use polyglot_core::{config, traits::Platform};
use polyglot_discord::DiscordPlatform;
use polyglot_settings::GuildSettingsStore;
use service::{Kernel, Services};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "polyglot",
    version,
    about = "Polyglot — per-guild languages and slash commands for Discord"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve commands until interrupted.
    Start,
    /// Check configuration, catalogs, and stored guild settings.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.bot.log_level)),
        )
        .init();

    match cfg.source {
        Some(ref path) => info!("config loaded from {}", path.display()),
        None => info!("Config file not found at {}, using defaults", cli.config),
    }

    match cli.command {
        Commands::Start => {
            if cfg.discord.token.is_empty() {
                anyhow::bail!(
                    "Discord token is empty. Set it in {} or the {} env var.",
                    cli.config,
                    config::TOKEN_ENV
                );
            }

            // Broken catalogs or settings abort startup rather than serve wrong content.
            let catalog = Catalog::load(&cfg.bot.locale_path(), &cfg.bot.default_lang)
                .map_err(|e| anyhow::anyhow!("failed to load catalogs: {e}"))?;
            info!("languages: {}", catalog.languages().join(", "));
            let store = GuildSettingsStore::load(cfg.bot.settings_path())
                .await
                .map_err(|e| anyhow::anyhow!("failed to load guild settings: {e}"))?;

            let platform: Arc<dyn Platform> = Arc::new(DiscordPlatform::new(cfg.discord.clone()));
            let services: Arc<dyn Services> = Arc::new(Kernel::new(
                Arc::new(catalog),
                Arc::new(store),
                platform.clone(),
            ));
            let lifecycle = Arc::new(CommandLifecycle::new(commands::builtin(services.as_ref())));

            println!("{} — Starting...", cfg.bot.name);
            let gw = Arc::new(gateway::Gateway::new(
                platform,
                services,
                lifecycle,
                cfg.bot.shutdown_timeout(),
            ));
            gw.run(shutdown_signal()).await?;
        }
        Commands::Status => {
            println!("{} — Status Check\n", cfg.bot.name);
            println!("Config: {}", cli.config);
            println!("Default language: {}", cfg.bot.default_lang);
            println!(
                "Discord token: {}",
                if cfg.discord.token.is_empty() {
                    "missing"
                } else {
                    "configured"
                }
            );
            println!();

            let locale_path = cfg.bot.locale_path();
            match Catalog::load(&locale_path, &cfg.bot.default_lang) {
                Ok(catalog) => println!(
                    "  catalogs ({}): {}",
                    locale_path.display(),
                    catalog.languages().join(", ")
                ),
                Err(e) => println!("  catalogs ({}): ERROR {e}", locale_path.display()),
            }

            let settings_path = cfg.bot.settings_path();
            match GuildSettingsStore::load(&settings_path).await {
                Ok(store) => println!(
                    "  settings ({}): {} guild overrides",
                    store.path().display(),
                    store.len().await
                ),
                Err(e) => println!("  settings ({}): ERROR {e}", settings_path.display()),
            }
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

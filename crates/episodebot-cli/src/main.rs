//! episodebot CLI: run the bot, set up configuration, try messages offline.
//!
//! Usage:
//!   episodebot bot             Start the Telegram bot (default)
//!   episodebot onboard         Create a default configuration
//!   episodebot status          Show configuration status
//!   episodebot lookup <text>   Run one message through the pipeline
//!   episodebot press <token>   Run one button payload through the pipeline

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use episodebot_core::bus::events::{InboundMessage, Reply};
use episodebot_core::bus::{MessageBus, MessageBusReceivers};
use episodebot_core::catalog;
use episodebot_core::config::{CatalogBackend, Config};
use episodebot_core::gateway::EpisodeBridge;
#[cfg(feature = "telegram")]
use episodebot_core::gateway::channels::telegram::TelegramTransport;
use episodebot_core::pipeline::EpisodePipeline;

#[derive(Parser)]
#[command(
    name = "episodebot",
    version,
    about = "A chat bot that finds download links for TV show episodes"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (Telegram long polling)
    Bot,

    /// Create or reset the default configuration
    Onboard,

    /// Show configuration status
    Status,

    /// Run a text message through the pipeline and print the replies
    Lookup {
        /// Message text, e.g. "Breaking Bad: 2: 5"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Run a button payload through the pipeline and print the replies
    Press {
        /// Payload, e.g. "Next:1234:2:6"
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Bot) | None => cmd_bot().await?,
        Some(Commands::Onboard) => cmd_onboard()?,
        Some(Commands::Status) => cmd_status()?,
        Some(Commands::Lookup { text }) => {
            cmd_run(InboundMessage::cli(&text.join(" "))).await?
        }
        Some(Commands::Press { token }) => cmd_run(InboundMessage::cli_callback(&token)).await?,
    }

    Ok(())
}

// ── Shared Setup ────────────────────────────────────────────────────

fn validate_config(config: &Config) -> Result<()> {
    if let Err(errors) = config.validate() {
        eprintln!("\n  \x1b[31m❌ Configuration errors:\x1b[0m");
        for e in &errors {
            eprintln!("     • {}", e);
        }
        eprintln!();
        anyhow::bail!("Fix the above {} error(s) in config.json", errors.len());
    }
    Ok(())
}

/// Load and validate config, then build the pipeline on the configured catalog.
fn setup_pipeline() -> Result<(Config, EpisodePipeline)> {
    let config = Config::load()?;
    validate_config(&config)?;

    let client = config.http.build_client()?;
    let catalog = catalog::build(&config.catalog, client);
    let pipeline = EpisodePipeline::new(catalog)?;

    Ok((config, pipeline))
}

// ── Bot Command ─────────────────────────────────────────────────────

async fn cmd_bot() -> Result<()> {
    let (config, pipeline) = setup_pipeline()?;

    let (bus, receivers) = MessageBus::new(100);
    let bus = Arc::new(bus);
    let MessageBusReceivers {
        inbound_rx,
        outbound_rx,
    } = receivers;
    let mut tasks = Vec::new();

    // 1. Transports first, so their outbound subscribers exist before
    //    the dispatch loop starts.
    #[cfg(feature = "telegram")]
    {
        if let Some(ref tel_config) = config.channels.telegram {
            if tel_config.enabled && !tel_config.token.is_empty() {
                let transport = TelegramTransport::new(
                    tel_config.token.clone(),
                    Arc::clone(&bus),
                    tel_config.allow_from.clone(),
                );
                tasks.push(tokio::spawn(async move {
                    if let Err(e) = transport.run().await {
                        tracing::error!("Telegram transport failed: {}", e);
                    }
                }));
            }
        }
    }

    if tasks.is_empty() {
        println!("  ⚠️ No bot channels enabled. Please check your config.");
        return Ok(());
    }

    // 2. Outbound dispatcher
    let subs = bus.subscribers();
    tasks.push(tokio::spawn(async move {
        episodebot_core::bus::dispatch_outbound(subs, outbound_rx).await;
    }));

    // 3. Bridge, cancelled on Ctrl+C
    let cancel = CancellationToken::new();
    let bridge = EpisodeBridge::new(Arc::clone(&bus), Arc::new(pipeline), cancel.clone());
    tasks.push(tokio::spawn(async move {
        if let Err(e) = bridge.run(inbound_rx).await {
            tracing::error!("Episode bridge failed: {}", e);
        }
    }));

    println!("  📺 episodebot starting...");
    println!("  Catalog:   {}", backend_label(&config));
    println!("  Press Ctrl+C for graceful shutdown.");
    println!("  ─────────────────────────────────────");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("\n  ⏳ Shutting down gracefully...");
            cancel.cancel();
        }
        _ = futures::future::join_all(tasks) => {}
    }

    println!("  ✅ Shutdown complete.");
    Ok(())
}

// ── Lookup / Press Commands ─────────────────────────────────────────

async fn cmd_run(msg: InboundMessage) -> Result<()> {
    let (_config, pipeline) = setup_pipeline()?;

    let replies = pipeline.handle(&msg).await;
    if replies.is_empty() {
        println!("  (no reply)");
        return Ok(());
    }

    for reply in &replies {
        print_reply(reply);
    }
    Ok(())
}

fn print_reply(reply: &Reply) {
    println!();
    for line in reply.content.lines() {
        println!("  {}", line);
    }
    for button in &reply.buttons {
        println!("  [{}] → {}", button.text, button.data);
    }
    println!();
}

// ── Onboard Command ─────────────────────────────────────────────────

fn cmd_onboard() -> Result<()> {
    let path = Config::write_default_template()?;
    println!();
    println!("  ✅ Configuration created at:");
    println!("     {}", path.display());
    println!();
    println!("  Next steps:");
    println!("  1. Add your Telegram bot token and catalog credentials");
    println!("  2. Try `episodebot lookup \"Breaking Bad: 2: 5\"`");
    println!("  3. Run `episodebot bot`");
    println!();
    Ok(())
}

// ── Status Command ──────────────────────────────────────────────────

fn backend_label(config: &Config) -> String {
    if config.catalog.myshows.enabled {
        format!("{} + myshows lookup", config.catalog.backend.as_str())
    } else {
        config.catalog.backend.as_str().to_string()
    }
}

fn presence(value: &str) -> &'static str {
    if value.trim().is_empty() {
        "❌ missing"
    } else {
        "✅ set"
    }
}

fn cmd_status() -> Result<()> {
    let config_path = Config::default_path();
    let config = Config::load()?;

    println!();
    println!("  📺 episodebot status");
    println!("  ─────────────────────────────────────");

    if config_path.exists() {
        println!("  Config:    {}", config_path.display());
    } else {
        println!("  Config:    ⚠️  Not found (run `episodebot onboard`), using defaults");
    }

    println!("  Catalog:   {}", backend_label(&config));
    match config.catalog.backend {
        CatalogBackend::Seasonvar => {
            println!("  API key:   {}", presence(&config.catalog.seasonvar.api_key));
        }
        CatalogBackend::Soap4me => {
            println!("  Token:     {}", presence(&config.catalog.soap4me.token));
            println!("  Session:   {}", presence(&config.catalog.soap4me.session));
        }
    }

    match config.channels.telegram {
        Some(ref t) if t.enabled => println!(
            "  Telegram:  enabled, token {}, {} allowed user(s)",
            presence(&t.token),
            if t.allow_from.is_empty() {
                "all".to_string()
            } else {
                t.allow_from.len().to_string()
            }
        ),
        _ => println!("  Telegram:  disabled"),
    }

    println!("  Timeout:   {}s", config.http.timeout_seconds);

    if let Err(errors) = config.validate() {
        println!("  Problems:  {}", errors.len());
        for e in &errors {
            println!("     • {}", e);
        }
    }

    println!();
    Ok(())
}

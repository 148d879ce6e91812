mod commands;
mod gateway;

use clap::{Parser, Subcommand};
use himas_channels::telegram::TelegramChannel;
use himas_core::{
    config::{self, shellexpand, Config},
    traits::{Channel, Provider},
};
use himas_home::{aliases::AliasTable, HomeInterpreter};
use himas_providers::ollama::OllamaProvider;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "himas",
    version,
    about = "Himas: chat gateway with a natural-language Home Assistant interpreter"
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
    /// Start the bot.
    Start,
    /// Check Home Assistant, Ollama and channel configuration.
    Status,
    /// Run one natural-language home command and print the reply.
    Ask {
        /// The command, e.g. "kitchen light off, bedroom lamp red 40%".
        #[arg(trailing_var_arg = true)]
        words: Vec<String>,
    },
    /// List Home Assistant entities, optionally filtered by id.
    Entities {
        /// Substring matched against entity ids.
        search: Option<String>,
    },
    /// Map a friendly name to an entity id.
    Explain {
        name: String,
        entity_id: String,
    },
    /// Show the custom name mappings.
    Aliases,
    /// Remove a custom name mapping.
    Unalias { name: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_tracing(&cfg);

    match cli.command {
        Commands::Start => {
            let provider: Arc<dyn Provider> =
                Arc::new(OllamaProvider::from_config(&cfg.provider.ollama));
            if !provider.is_available().await {
                tracing::warn!(
                    "Ollama is not reachable at {}; chat and LLM parsing will fail until it is",
                    cfg.provider.ollama.base_url
                );
            }

            let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
            if let Some(ref tg) = cfg.channel.telegram {
                if tg.enabled {
                    if tg.bot_token.is_empty() {
                        anyhow::bail!(
                            "Telegram is enabled but bot_token is empty. \
                             Set it in config.toml or TELEGRAM_BOT_TOKEN env var."
                        );
                    }
                    channels.insert(
                        "telegram".to_string(),
                        Arc::new(TelegramChannel::new(tg.clone())),
                    );
                }
            }
            if channels.is_empty() {
                anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
            }

            let home = if cfg.home_assistant.enabled {
                Some(Arc::new(build_interpreter(&cfg, provider.clone())))
            } else {
                tracing::info!("Home Assistant disabled; /himas commands will be refused");
                None
            };

            println!("{}: starting...", cfg.himas.name);
            let gw = Arc::new(gateway::Gateway::new(
                provider,
                channels,
                home,
                cfg.auth.clone(),
                cfg.himas.clone(),
                cfg.provider.ollama.clone(),
            ));
            gw.run().await?;
        }
        Commands::Status => {
            println!("{}: status check\n", cfg.himas.name);
            println!("Config: {}", cli.config);
            println!();

            let provider = OllamaProvider::from_config(&cfg.provider.ollama);
            println!(
                "  ollama ({}): {}",
                cfg.provider.ollama.base_url,
                if provider.is_available().await {
                    "available"
                } else {
                    "unreachable"
                }
            );

            if cfg.home_assistant.enabled {
                let home = build_interpreter(&cfg, Arc::new(provider));
                match home.api().api_status().await {
                    Ok(message) => println!(
                        "  home assistant ({}): {message}",
                        cfg.home_assistant.base_url
                    ),
                    Err(e) => println!(
                        "  home assistant ({}): {e}",
                        cfg.home_assistant.base_url
                    ),
                }
            } else {
                println!("  home assistant: disabled");
            }

            match cfg.channel.telegram {
                Some(ref tg) => println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                ),
                None => println!("  telegram: not configured"),
            }
        }
        Commands::Ask { words } => {
            if words.is_empty() {
                anyhow::bail!("no command provided. Usage: himas ask <command>");
            }
            let home = require_home(&cfg)?;
            let reply = home
                .process_natural_command(&words.join(" "), "cli")
                .await;
            if reply.is_empty() {
                anyhow::bail!("empty command");
            }
            println!("{reply}");
        }
        Commands::Entities { search } => {
            let home = require_home(&cfg)?;
            let snapshot = home.directory().entities(true).await;
            if snapshot.is_empty() {
                anyhow::bail!("no entities (is Home Assistant reachable?)");
            }
            let needle = search.unwrap_or_default().to_lowercase();
            for entity in snapshot
                .iter()
                .filter(|e| e.entity_id.to_lowercase().contains(&needle))
            {
                println!(
                    "{:<45} {:<30} {}",
                    entity.entity_id,
                    entity.display_name(),
                    entity.state
                );
            }
        }
        Commands::Explain { name, entity_id } => {
            if !entity_id.contains('.') {
                anyhow::bail!("'{entity_id}' is not an entity id (expected domain.object)");
            }
            let mut aliases = AliasTable::load(alias_path(&cfg))?;
            aliases.insert(&name, &entity_id);
            aliases.save()?;
            println!("Mapped \"{}\" to {entity_id}", name.trim().to_lowercase());
        }
        Commands::Aliases => {
            let aliases = AliasTable::load(alias_path(&cfg))?;
            if aliases.is_empty() {
                println!("No entity mappings.");
            }
            for (name, entity_id) in aliases.iter() {
                println!("{name} → {entity_id}");
            }
        }
        Commands::Unalias { name } => {
            let mut aliases = AliasTable::load(alias_path(&cfg))?;
            match aliases.remove(&name) {
                Some(entity_id) => {
                    aliases.save()?;
                    println!("Removed \"{name}\" ({entity_id})");
                }
                None => anyhow::bail!("no mapping named \"{name}\""),
            }
        }
    }

    Ok(())
}

/// Stderr output filtered by `RUST_LOG` (else the configured level), plus a
/// daily log file under `<data_dir>/logs`. The guard flushes the file writer
/// on drop and must outlive `main`'s work.
fn init_tracing(cfg: &Config) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&cfg.himas.log_level))
    };
    let stderr = fmt::layer().with_writer(std::io::stderr);

    let log_dir = PathBuf::from(shellexpand(&cfg.himas.data_dir)).join("logs");
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr)
            .init();
        tracing::warn!("file logging disabled, cannot create {}: {e}", log_dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::daily(&log_dir, "himas.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter())
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Some(guard)
}

fn alias_path(cfg: &Config) -> String {
    shellexpand(&cfg.home_assistant.alias_file)
}

fn build_interpreter(cfg: &Config, provider: Arc<dyn Provider>) -> HomeInterpreter {
    HomeInterpreter::from_config(&cfg.home_assistant, &cfg.provider.ollama, provider)
}

/// Interpreter for the one-shot CLI commands.
fn require_home(cfg: &Config) -> anyhow::Result<HomeInterpreter> {
    if !cfg.home_assistant.enabled {
        anyhow::bail!("Home Assistant is disabled. Set [home_assistant] enabled = true.");
    }
    if cfg.home_assistant.access_token.is_empty() {
        anyhow::bail!(
            "Home Assistant access_token is empty. Set it in config.toml or HA_ACCESS_TOKEN env var."
        );
    }
    Ok(build_interpreter(
        cfg,
        Arc::new(OllamaProvider::from_config(&cfg.provider.ollama)),
    ))
}

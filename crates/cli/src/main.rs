mod bootstrap;
mod repl;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    herald_cache::{CacheStore, MemoryCache},
    herald_commands::{Command, Dispatcher},
    herald_config::{HeraldConfig, Severity, discover_and_load, has_errors, load_config, validate},
    herald_modules::{EventsCommand, RollCommand},
    herald_store::{DocumentStore, MemoryStore},
    herald_transport::{ChatTransport, LoopbackTransport},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald — chat command bot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Path to herald.toml (overrides the standard search locations).
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the in-memory demo transport (default).
    Run,
    /// Validate the configuration and exit.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    info!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };

    let diagnostics = validate(&config);
    for diagnostic in &diagnostics {
        match diagnostic.severity {
            Severity::Error => error!(path = %diagnostic.path, "{}", diagnostic.message),
            Severity::Warning => warn!(path = %diagnostic.path, "{}", diagnostic.message),
        }
    }
    if matches!(cli.command, Some(Commands::Check)) {
        if has_errors(&diagnostics) {
            std::process::exit(1);
        }
        println!("configuration ok");
        return Ok(());
    }
    if has_errors(&diagnostics) {
        error!("configuration has errors, refusing to start");
        std::process::exit(1);
    }

    run_bot(config).await
}

async fn run_bot(config: HeraldConfig) -> anyhow::Result<()> {
    let startup = config.startup.clone();

    let transport = match bootstrap::with_retry(&startup, "transport", || async {
        let (transport, _events) = LoopbackTransport::channel("herald");
        Ok::<_, anyhow::Error>(transport)
    })
    .await
    {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            error!(error = %e, "transport unavailable");
            std::process::exit(bootstrap::exit::TRANSPORT);
        },
    };

    let cache: Arc<dyn CacheStore> =
        match bootstrap::with_retry(&startup, "cache", || async {
            Ok::<_, anyhow::Error>(MemoryCache::new())
        })
        .await
        {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                error!(error = %e, "cache unavailable");
                std::process::exit(bootstrap::exit::CACHE);
            },
        };

    let store: Arc<dyn DocumentStore> =
        match bootstrap::with_retry(&startup, "store", || async {
            Ok::<_, anyhow::Error>(MemoryStore::new())
        })
        .await
        {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!(error = %e, "document store unavailable");
                std::process::exit(bootstrap::exit::STORE);
            },
        };

    let mut dispatcher = Dispatcher::new(
        config,
        Arc::clone(&transport) as Arc<dyn ChatTransport>,
        cache,
    );
    match build_commands(store) {
        Ok(commands) => {
            for command in commands {
                dispatcher.register(command);
            }
        },
        Err(e) => {
            error!(error = %e, "module initialisation failed");
            std::process::exit(bootstrap::exit::MODULE_INIT);
        },
    }

    tokio::select! {
        result = repl::run(dispatcher, transport) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down");
            Ok(())
        },
    }
}

fn build_commands(store: Arc<dyn DocumentStore>) -> anyhow::Result<Vec<Arc<dyn Command>>> {
    Ok(vec![
        Arc::new(RollCommand::new()),
        Arc::new(EventsCommand::new(store)),
    ])
}

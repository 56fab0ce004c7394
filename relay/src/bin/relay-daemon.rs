use anyhow::Context;
use clap::Parser;
use neelakshi_core::config::{get_default_config_file, ProviderKind, RelayConfig};
use neelakshi_relay::http_server;
use neelakshi_relay::Resolver;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "relay-daemon", about = "Neelakshi chat relay", version)]
struct Args {
    /// Path to config file (defaults to ~/.config/neelakshi/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the chat widget
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Language model provider (gemini or openai)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Model name override
    #[arg(short, long)]
    model: Option<String>,

    /// Never call web search, even with a SerpAPI key
    #[arg(long)]
    no_search: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<RelayConfig> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file("neelakshi")
            .context("Failed to resolve default config path")?,
    };

    let mut config = RelayConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    if path.exists() {
        info!("Loaded configuration from {}", path.display());
    } else {
        info!("No config file at {}, using defaults", path.display());
    }

    config
        .apply_process_env()
        .context("Invalid environment configuration")?;

    // Command line wins over file and environment
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = &args.public_dir {
        config.server.public_dir = Some(dir.clone());
    }
    if let Some(provider) = args.provider {
        config.override_provider(provider, |key| std::env::var(key).ok());
    }
    if let Some(model) = &args.model {
        config.model.model_name = Some(model.clone());
    }
    if args.no_search {
        config.search.enabled = false;
    }

    config.validate().context("Configuration error")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Starting Neelakshi relay daemon");
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to configure relay");
            return Err(e);
        }
    };

    if !config.search.is_active() {
        warn!("SERPAPI_API_KEY not set or search disabled; answers will not be search-augmented");
    }

    let resolver = Resolver::from_config(&config).context("Failed to initialize collaborators")?;
    let (provider, model) = resolver.model_info();
    info!(provider, model = %model, "Language model ready");

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid host address: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);

    http_server::run_server(resolver, addr, config.server.public_dir.as_deref()).await?;

    info!("Relay daemon shutting down");
    Ok(())
}

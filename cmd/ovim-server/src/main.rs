use clap::Parser;
use pkg_api::DynStore;
use pkg_api::server::{ServerConfig, start_server};
use pkg_constants::network::DEFAULT_API_PORT;
use pkg_constants::paths::{DEFAULT_SERVER_CONFIG, DEFAULT_SERVER_DATA_DIR};
use pkg_state::{MemoryStore, SlateStore};
use pkg_types::config::{LogFormat, ServerConfigFile, StorageBackend, load_config_file};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(name = "ovim-server", about = "Multi-tenant zone quota and placement governance server")]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_SERVER_CONFIG)]
    config: String,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Storage backend: memory or slatedb
    #[arg(long)]
    storage: Option<StorageBackend>,

    /// Directory for SlateDB state storage
    #[arg(long)]
    data_dir: Option<String>,

    /// Bearer token required on /api/v1
    #[arg(long)]
    token: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().compact().with_line_number(true))
            .init(),
    }
}

async fn open_store(backend: StorageBackend, data_dir: &str) -> anyhow::Result<Arc<DynStore>> {
    let store: Arc<DynStore> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Slatedb => Arc::new(SlateStore::open(data_dir).await?),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: ServerConfigFile = load_config_file(&cli.config)?;

    // Merge: CLI args > config file > defaults
    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        file_cfg.log_format.unwrap_or_default()
    };
    init_tracing(log_format);
    info!("Config file: {}", cli.config);

    let port = cli.port.or(file_cfg.port).unwrap_or(DEFAULT_API_PORT);
    let storage = cli.storage.or(file_cfg.storage).unwrap_or_default();
    let data_dir = cli
        .data_dir
        .or(file_cfg.data_dir)
        .unwrap_or_else(|| DEFAULT_SERVER_DATA_DIR.to_string());
    let token = cli.token.or(file_cfg.token).unwrap_or_default();

    info!("Starting ovim-server");
    info!("  Port:      {}", port);
    info!("  Storage:   {:?}", storage);
    if storage == StorageBackend::Slatedb {
        info!("  Data dir:  {}", data_dir);
    }
    if token.is_empty() {
        warn!("No API token configured; /api/v1 is unauthenticated");
    } else {
        let prefix: String = token.chars().take(4).collect();
        info!("  Token:     {}***", prefix);
    }

    let store = open_store(storage, &data_dir).await?;
    let config = ServerConfig {
        addr: SocketAddr::from(([0, 0, 0, 0], port)),
        token,
    };

    start_server(config, store).await?;

    Ok(())
}

//! FormFlow Server
//!
//! Serves multi-step form wizards over HTTP. Each step submission is
//! validated against the form catalog and merged into the caller's session
//! record; the session token travels in a signed cookie.
//!
//! Usage:
//! ```bash
//! # With config file
//! formflow-server --config config/server.yaml
//!
//! # Environment variables override the config file
//! FORMFLOW_SESSION_STORE=memory formflow-server --config config/server.yaml
//!
//! # Validate a form catalog without starting the server
//! formflow-server check-forms --forms config/forms.yaml
//!
//! # Remove expired session records
//! formflow-server --config config/server.yaml cleanup
//! ```

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use formflow_config_file::FileFormConfigStore;
use formflow_core::{FormConfigStore, FormSessionManager, TokenCodec, form::FormCatalog};
use formflow_observability::metrics::Metrics;
use formflow_server::config::{LoggingConfig, ServerConfig};
use formflow_server::cookie::CookieSettings;
use formflow_server::{AppState, reload, router, session_factory};

/// FormFlow Server - multi-step form wizard backend
#[derive(Parser)]
#[command(name = "formflow-server")]
#[command(about = "HTTP backend for multi-step form wizards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "FORMFLOW_CONFIG",
        global = true
    )]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default if no command specified)
    Serve {
        /// Port to listen on, overriding config and environment
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Load and validate a form catalog, then print a summary
    CheckForms {
        /// Catalog file; defaults to `forms.path` from the configuration
        #[arg(long, value_name = "FILE")]
        forms: Option<PathBuf>,
    },
    /// Delete expired session records from the configured store
    Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(config_path) => ServerConfig::from_file(config_path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {}", config_path, e))?,
        None => ServerConfig::default(),
    };
    config.merge_env();

    init_tracing(&config.logging)?;

    match cli.command {
        Some(Commands::CheckForms { forms }) => {
            let path = forms.unwrap_or_else(|| PathBuf::from(&config.forms.path));
            check_forms(path).await
        }
        Some(Commands::Cleanup) => cleanup(&config).await,
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        None => serve(config).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::new(format!("{}", log_level));

    // sqlx logs every query at INFO; keep it quiet unless asked
    if !logging.log_sql_queries {
        match "sqlx=warn".parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => tracing::warn!("Failed to set sqlx log filter: {}", e),
        }
    }

    if logging.json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

async fn load_catalog(store: &dyn FormConfigStore) -> anyhow::Result<FormCatalog> {
    let catalog = store.load_catalog().await?;
    store.validate_catalog(&catalog).await?;
    Ok(catalog)
}

async fn check_forms(path: PathBuf) -> anyhow::Result<()> {
    let store = FileFormConfigStore::new(&path)
        .await
        .with_context(|| format!("form catalog {}", path.display()))?;
    let catalog = load_catalog(&store).await?;

    println!("{}: {} form(s)", store.path().display(), catalog.len());
    for form_id in catalog.form_ids() {
        let Some(form) = catalog.get(form_id) else {
            continue;
        };
        let mut flags = Vec::new();
        if form.hidden {
            flags.push("hidden");
        }
        if form.disabled {
            flags.push("disabled");
        }
        if form.debug {
            flags.push("debug");
        }
        let slugs: Vec<&str> = form.steps.iter().map(|step| step.slug.as_str()).collect();
        println!(
            "  {} [{}] steps: {}",
            form_id,
            flags.join(", "),
            slugs.join(" -> ")
        );
    }

    Ok(())
}

async fn cleanup(config: &ServerConfig) -> anyhow::Result<()> {
    let store = session_factory::create_session_store(&config.session).await?;
    let stats = store.cleanup_expired(Utc::now()).await?;
    info!("Removed {} expired session record(s)", stats.sessions_deleted);
    Ok(())
}

fn token_codec(secret: Option<&str>) -> anyhow::Result<TokenCodec> {
    match secret.filter(|secret| !secret.is_empty()) {
        Some(secret) => Ok(TokenCodec::signed(secret)?),
        None => {
            warn!("No session.secret configured; using a random key, sessions will not survive restarts");
            Ok(TokenCodec::signed(rand::random::<[u8; 32]>())?)
        }
    }
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!("Initializing FormFlow server");

    let form_store = Arc::new(
        FileFormConfigStore::new(&config.forms.path)
            .await
            .with_context(|| format!("form catalog {}", config.forms.path))?,
    );
    let catalog = load_catalog(&*form_store).await?;
    if catalog.is_empty() {
        bail!("form catalog {} defines no forms", config.forms.path);
    }
    info!("Loaded {} form(s) from {}", catalog.len(), form_store.path().display());

    let session_store = session_factory::create_session_store(&config.session).await?;
    let ttl = config.session.ttl()?;
    let manager = FormSessionManager::new(session_store).with_ttl(ttl);

    let metrics = Arc::new(
        Metrics::new().map_err(|e| anyhow::anyhow!("failed to create metrics: {}", e))?,
    );
    let state = AppState::new(
        manager,
        token_codec(config.session.secret.as_deref())?,
        catalog,
        metrics,
        CookieSettings::from(&config.session.cookie),
    );

    if config.forms.watch {
        info!("Watching {} for changes", form_store.path().display());
        reload::spawn_catalog_watcher(state.clone(), form_store);
    }

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("FormFlow listening on http://{}", addr);
    info!("   Forms:                http://{}/", addr);
    info!("   Health check:         http://{}/healthz", addr);
    info!("   Readiness check:      http://{}/readyz", addr);
    info!("   Prometheus metrics:   http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

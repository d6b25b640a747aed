use crate::app_config::ConfigResolver;
use crate::cli::ServeOpts;
use crate::config::{validate_settings_object, Settings};
use crate::web::routes;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;

/// Shared state for the web server.
#[derive(Clone)]
pub struct WebState {
    pub settings: Arc<Settings>,
    pub resolver: Arc<ConfigResolver>,
    pub start_time: std::time::Instant,
    pub version: String,
}

impl WebState {
    pub fn new(settings: Settings) -> Result<Self> {
        let resolver = ConfigResolver::new(&settings.app_config)
            .context("Failed to build app config client")?;

        Ok(Self {
            settings: Arc::new(settings),
            resolver: Arc::new(resolver),
            start_time: std::time::Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// The web server.
pub struct WebServer {
    state: WebState,
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl WebServer {
    /// Prepare the server with the given settings and CLI overrides.
    pub fn new(mut settings: Settings, opts: &ServeOpts) -> Result<Self> {
        if let Some(port) = opts.port {
            settings.server.port = port;
        }
        if let Some(bind) = &opts.bind {
            settings.server.bind = bind.clone();
        }

        validate_settings_object(&settings)?;

        let addr = resolve_bind_address(&settings.server.bind, settings.server.port)?;
        let state = WebState::new(settings)?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            state,
            addr,
            shutdown_tx,
        })
    }

    /// Run the server until a shutdown signal is received.
    pub async fn run_until_shutdown(self) -> Result<()> {
        let app = routes::build_routes(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!(
            "battle-web v{} listening on {}",
            self.state.version, self.addr
        );
        print_startup_banner(&self.state, &self.addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(self.shutdown_tx.clone()))
            .await?;

        info!("Web server shut down gracefully");
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Wait for Ctrl+C, SIGTERM, or an explicit shutdown.
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let mut shutdown_rx = shutdown_tx.subscribe();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown requested");
        }
    }
}

fn resolve_bind_address(bind: &str, port: u16) -> Result<SocketAddr> {
    format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address '{bind}:{port}'"))
}

fn print_startup_banner(state: &WebState, addr: &SocketAddr) {
    let config_source = match state.resolver.endpoint() {
        Some(url) => url.to_string(),
        None => "built-in defaults".to_string(),
    };

    info!("-------------------------------------------");
    info!("  battle-web v{}", state.version);
    info!("  Listening on: http://{}", addr);
    info!("  App config: {}", config_source);
    info!("  Dev mode: {}", state.settings.dev_mode);
    info!("  Health: http://{}/api/health", addr);
    info!("-------------------------------------------");
}

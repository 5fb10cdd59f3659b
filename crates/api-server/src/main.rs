use std::sync::Arc;

use api_server::config::{LogFormat, ServerConfig};
use api_server::http::{self, AppState, CorsPolicy};
use shared::config::SettingsProvider;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    let config = ServerConfig::from_env();
    init_tracing(&config);
    if dotenv_loaded {
        info!("loaded environment overrides from .env");
    }

    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    info!("starting gift suggestion api");
    let settings = Arc::new(SettingsProvider::from_env());
    let cors_policy = CorsPolicy::resolve(&settings).await;
    let app = http::build_router(AppState::from_settings(settings), &cors_policy);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "gift suggestion api listening on {}",
        listener.local_addr().unwrap_or(addr)
    );
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {err}");
        std::process::exit(1);
    }

    info!("gift suggestion api shut down");
}

fn init_tracing(config: &ServerConfig) {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_filter));
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}

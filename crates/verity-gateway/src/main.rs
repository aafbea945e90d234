//! Verity gateway binary.
//!
//! Loads `verity.yaml` (or the path in `VERITY_CONFIG`), deploys the
//! configured reference modules, seeds registrations and serves the HTTP
//! surface until Ctrl-C, flipping `/readyz` to draining on the way out.

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use verity_core::error::{Result, VerityError};
use verity_gateway::{app_state::AppState, config, router};

const DEFAULT_CONFIG: &str = "verity.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "verity-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::var("VERITY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| VerityError::BadRequest(format!("gateway.listen: {e}")))?;

    let state = AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(
        %listen,
        config = %path,
        authority = %state.router().authority(),
        general = state.router().general_count(),
        jurisdiction = state.router().jurisdiction_count(),
        "verity-gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| VerityError::Internal(format!("bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(state))
        .await
        .map_err(|e| VerityError::Internal(format!("server failed: {e}")))
}

async fn shutdown(state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    state.set_draining();
    tracing::info!("shutdown requested, draining");
}

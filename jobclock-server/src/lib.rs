use axum::{serve, Router};
use database::Database;
use eyre::{Context, Result};
use router::AppState;
use settings::Settings;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;

pub mod authentication;
pub mod database;
pub mod erp;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod settings;

#[cfg(target_family = "unix")]
async fn shutdown_signal() {
    let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
        .expect("failed to register signal handler");
    let mut interrupt = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .expect("failed to register signal handler");

    tokio::select! {
        _ = term.recv() => {},
        _ = interrupt.recv() => {},
    };
    eprintln!("Shutting down gracefully...");
}

#[cfg(target_family = "windows")]
async fn shutdown_signal() {
    signal::windows::ctrl_c()
        .expect("failed to register signal handler")
        .recv()
        .await;
    eprintln!("Shutting down gracefully...");
}

pub async fn make_router(settings: Settings) -> Result<Router> {
    let database = Database::new(&settings.db_path).await?;
    match database.prune_sessions().await {
        Ok(n) if n > 0 => tracing::debug!("pruned {n} expired session(s)"),
        Ok(_) => {}
        Err(err) => tracing::warn!("session prune failed: {err}"),
    }
    let state = AppState::new(settings, database)?;
    Ok(router::router(state))
}

pub async fn launch(settings: Settings, address: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .context("Failed to connect to tcp listener")?;
    let r = make_router(settings).await?;

    tracing::info!("Server started at {}", address);
    serve(listener, r.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

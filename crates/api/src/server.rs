//! Listener binding and graceful shutdown.

use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::signal;

use crate::config::DEFAULT_PORT;

/// `0.0.0.0:8001`.
pub fn bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}

/// Bind `addr` and serve `app` until Ctrl+C or SIGTERM.
pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down gracefully"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down gracefully"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_all_interfaces_on_8001() {
        assert_eq!(bind_addr().to_string(), "0.0.0.0:8001");
    }

    #[test]
    fn dockerfile_exposes_the_bound_port() {
        let dockerfile = include_str!("../../../Dockerfile");
        let exposed: Vec<u16> = dockerfile
            .lines()
            .filter_map(|line| line.trim().strip_prefix("EXPOSE "))
            .flat_map(|ports| ports.split_whitespace())
            .filter_map(|port| port.split('/').next()?.parse().ok())
            .collect();
        assert_eq!(exposed, vec![bind_addr().port()]);
    }
}

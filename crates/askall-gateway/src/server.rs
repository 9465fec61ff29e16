//! Server lifecycle: bind, serve, graceful shutdown

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use askall_core::{Dispatcher, ServerConfig};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::info;

use crate::routes::{AppState, router};

/// Handle returned by [`GatewayServer::start`]: bound port and shutdown trigger.
pub struct ServeHandle {
    /// The port the server is listening on.
    pub port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<tokio::task::JoinHandle<Result<(), std::io::Error>>>,
}

impl ServeHandle {
    /// Trigger graceful shutdown and wait for the server to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            join.await??;
        }
        Ok(())
    }
}

/// The HTTP server: `/ask-all` plus the static public directory
pub struct GatewayServer {
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl GatewayServer {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        Self { config, dispatcher }
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            dispatcher: Arc::clone(&self.dispatcher),
        };
        router(state, &self.config.public_dir)
    }

    async fn bind(&self) -> Result<(TcpListener, u16)> {
        let listener = TcpListener::bind(&self.config.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind))?;
        let port = listener.local_addr()?.port();
        info!(
            "askall listening on {} (port {port}), serving static files from {}",
            self.config.bind,
            self.config.public_dir.display()
        );
        Ok((listener, port))
    }

    /// Bind and serve in a spawned task. Call [`ServeHandle::shutdown`] to stop.
    pub async fn start(&self) -> Result<ServeHandle> {
        let (listener, port) = self.bind().await?;
        let app = self.router();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    info!("received shutdown signal");
                })
                .await
        });

        Ok(ServeHandle {
            port,
            shutdown_tx: Some(shutdown_tx),
            join: Some(join),
        })
    }

    /// Bind and serve on the current task until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (listener, _) = self.bind().await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")?;
        info!("askall shut down");
        Ok(())
    }
}

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionContext};

/// Binds the listening socket and serves connections until the process exits.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = bind(&cfg.server.listen_addr).await?;
    serve(listener, cfg).await
}

pub async fn bind(listen_addr: &str) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", listen_addr))?;
    info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept loop.
///
/// Each connection is handled on its own task. At most
/// `server.max_connections` tasks exist at once; when all slots are taken the
/// loop stops accepting until one frees up. A failed accept is logged and
/// does not stop the loop.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    let ctx = Arc::new(ConnectionContext::from_config(cfg).await?);
    let slots = Arc::new(Semaphore::new(cfg.server.max_connections));

    loop {
        let permit = Arc::clone(&slots).acquire_owned().await?;

        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                continue;
            }
        };
        info!("Accepted connection from {}", peer);

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let _permit = permit;
            let mut conn = Connection::new(socket, peer, ctx);
            if let Err(e) = conn.run().await {
                warn!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
}

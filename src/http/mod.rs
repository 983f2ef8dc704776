//! HTTP protocol implementation.
//!
//! This module implements a minimal HTTP/1.x static file server: one GET
//! request per connection, answered with a file or a fixed error page.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The per-connection handler implementing the request-response state machine
//! - **`parser`**: Locates the requested path in the request line
//! - **`decode`**: Percent-decoding of the requested path
//! - **`request`**: The decoded request and its file extension
//! - **`response`**: Bounded response buffer and file/error response building
//! - **`writer`**: Writes a finished response to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for the request line
//!        └──────┬──────┘
//!               │ GET line received          (no match / nothing read → Closed)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Resolve the file, build the response
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!            Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use statik::http::connection::{Connection, ConnectionContext};
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let ctx = Arc::new(ConnectionContext::from_config(&Default::default()).await?);
//!
//!     loop {
//!         let (socket, addr) = listener.accept().await?;
//!         let ctx = Arc::clone(&ctx);
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, addr, ctx);
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

use std::future::Future;
use std::io;
use std::time::Duration;

use anyhow::Context;

pub mod request;
pub mod response;
pub mod parser;
pub mod decode;
pub mod connection;
pub mod writer;
pub mod mime;

/// Awaits an I/O future, failing once `limit` elapses. `None` waits forever.
pub(crate) async fn io_timeout<F, T>(limit: Option<Duration>, fut: F) -> anyhow::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    let res = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .with_context(|| format!("I/O timed out after {:?}", limit))?,
        None => fut.await,
    };
    Ok(res?)
}

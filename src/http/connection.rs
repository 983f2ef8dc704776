use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::io_timeout;
use crate::http::mime::mime_type;
use crate::http::parser::request_line_end;
use crate::http::request::Request;
use crate::http::response::{
    ResponseBuffer, StatusCode, build_file_response, write_internal_error, write_not_found,
};
use crate::http::writer::ResponseWriter;
use crate::root::DocumentRoot;

const READ_CHUNK_SIZE: usize = 1024;

/// Settings shared by every connection of a server.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub root: DocumentRoot,
    pub max_request_bytes: usize,
    pub max_response_bytes: usize,
    pub io_timeout: Option<Duration>,
}

impl ConnectionContext {
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let root = DocumentRoot::new(&cfg.static_files.root, cfg.static_files.confine_to_root).await?;

        Ok(Self {
            root,
            max_request_bytes: cfg.limits.max_request_bytes,
            max_response_bytes: cfg.limits.max_response_bytes,
            io_timeout: cfg.server.io_timeout(),
        })
    }
}

/// One client connection, serving a single request.
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    ctx: Arc<ConnectionContext>,
    buffer: BytesMut,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, StatusCode),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: SocketAddr, ctx: Arc<ConnectionContext>) -> Self {
        Self {
            stream,
            peer,
            ctx,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
            state: ConnectionState::Reading,
        }
    }

    /// Drives the connection until it is closed.
    ///
    /// The stream is closed when the connection is dropped, whichever way
    /// this returns.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    let next = match self.read_request().await {
                        Ok(Some(req)) => ConnectionState::Processing(req),
                        Ok(None) => ConnectionState::Closed,
                        Err(e) => {
                            self.state = ConnectionState::Closed;
                            return Err(e);
                        }
                    };
                    self.state = next;
                }

                ConnectionState::Processing(req) => {
                    let (writer, status) = Self::handle_request(&self.ctx, self.peer, req).await?;
                    self.state = ConnectionState::Writing(writer, status);
                }

                ConnectionState::Writing(writer, status) => {
                    let status = *status;
                    let result = writer.write_to_stream(&mut self.stream, self.ctx.io_timeout).await;
                    let sent = writer.len();
                    self.state = ConnectionState::Closed;
                    result?;

                    if status.is_success() {
                        info!(peer = %self.peer, status = status.as_u16(), bytes = sent, "Request served");
                    } else {
                        warn!(peer = %self.peer, status = status.as_u16(), bytes = sent, "Request failed");
                    }

                    if let Err(e) = self.stream.shutdown().await {
                        debug!(peer = %self.peer, error = %e, "Shutdown after response failed");
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads until the request line is complete, then parses it.
    ///
    /// Returns `None` when nothing was received, the line exceeds the
    /// request limit, or it is not a GET request line. No response is sent
    /// in any of those cases.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        let limit = self.ctx.max_request_bytes;

        while request_line_end(&self.buffer).is_none() {
            if self.buffer.len() >= limit {
                warn!(peer = %self.peer, limit, "Request line too long, dropping connection");
                return Ok(None);
            }

            let mut temp = [0u8; READ_CHUNK_SIZE];
            let want = temp.len().min(limit - self.buffer.len());
            let n = io_timeout(self.ctx.io_timeout, self.stream.read(&mut temp[..want])).await?;

            if n == 0 {
                if self.buffer.is_empty() {
                    debug!(peer = %self.peer, "Connection closed before sending a request");
                    return Ok(None);
                }
                // Peer finished sending; parse what arrived.
                break;
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }

        match Request::parse(&self.buffer) {
            Ok(req) => Ok(Some(req)),
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "Not a GET request line, dropping connection");
                Ok(None)
            }
        }
    }

    async fn handle_request(
        ctx: &ConnectionContext,
        peer: SocketAddr,
        req: &Request,
    ) -> anyhow::Result<(ResponseWriter, StatusCode)> {
        let path = req.display_path();
        info!(%peer, path = %path, "Request pending");

        let mut out = ResponseBuffer::with_capacity(ctx.max_response_bytes);
        let mime = mime_type(&req.extension());

        let built = match ctx.root.resolve(&req.fs_path()).await {
            Some(file) => build_file_response(&file, mime, &mut out).await,
            None => write_not_found(&mut out),
        };

        let status = match built {
            Ok(status) => status,
            Err(e) => {
                warn!(%peer, path = %path, error = %e, "Cannot serve file");
                write_internal_error(&mut out)?
            }
        };

        Ok((ResponseWriter::new(out), status))
    }
}

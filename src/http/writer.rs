use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::ResponseBuffer;
use crate::http::io_timeout;

pub struct ResponseWriter {
    buffer: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: ResponseBuffer) -> Self {
        Self {
            buffer: response.freeze(),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes the remaining bytes, retrying short writes until done.
    pub async fn write_to_stream<W>(
        &mut self,
        stream: &mut W,
        timeout: Option<Duration>,
    ) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = io_timeout(timeout, stream.write(&self.buffer[self.written..])).await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        io_timeout(timeout, stream.flush()).await?;
        Ok(())
    }
}

use std::io;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const HTTP_VERSION: &str = "HTTP/1.1";
const READ_CHUNK_SIZE: usize = 8192;

/// Body sent with every 404 response.
pub const NOT_FOUND_BODY: &str = "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<title>404 Not Found</title>\n\
<style>\n\
.container {height: 100vh; font-family: 'Montserrat', sans-serif; font-weight: bolder; display: flex; justify-content: center; align-items: center; flex-direction: column;}\n\
</style>\n\
</head>\n\
<body>\n\
<div class='container'>\n\
<h1>An error has occurred.</h1>\n\
<h2>404 Not Found</h2>\n\
</div>\n\
</body>\n\
</html>\n";

/// Body sent when a file cannot be served in full.
pub const INTERNAL_ERROR_BODY: &str = "<!DOCTYPE html>\n\
<html>\n\
<head><title>500 Internal Server Error</title></head>\n\
<body><h1>500 Internal Server Error</h1></body>\n\
</html>\n";

/// HTTP status codes the server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use statik::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == StatusCode::Ok
    }
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response buffer overflow: {needed} bytes needed, capacity {capacity}")]
    Overflow { needed: usize, capacity: usize },
    #[error("file of {size} bytes does not fit a {capacity} byte response")]
    FileTooLarge { size: u64, capacity: usize },
    #[error("failed to read file: {0}")]
    Read(#[source] io::Error),
}

/// Byte buffer holding a serialized response, with a hard capacity.
///
/// Memory is allocated as data arrives; the capacity only bounds growth.
/// Every append is checked, so the length can never exceed the capacity.
#[derive(Debug)]
pub struct ResponseBuffer {
    bytes: BytesMut,
    capacity: usize,
}

impl ResponseBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    /// Appends `data`, or fails without writing anything if it does not fit.
    pub fn extend(&mut self, data: &[u8]) -> Result<(), ResponseError> {
        if data.len() > self.remaining() {
            return Err(ResponseError::Overflow {
                needed: self.bytes.len() + data.len(),
                capacity: self.capacity,
            });
        }
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn freeze(self) -> Bytes {
        self.bytes.freeze()
    }

    fn reserve(&mut self, additional: usize) {
        self.bytes.reserve(additional.min(self.remaining()));
    }
}

/// Builder for a status line and its header block.
///
/// Headers are written in the order they were added and nothing is added
/// implicitly.
///
/// # Example
///
/// ```
/// # use statik::http::response::{ResponseBuilder, StatusCode};
/// let head = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/plain")
///     .head();
/// assert_eq!(head, b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n");
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Serializes the status line and headers, including the blank line.
    pub fn head(&self) -> Vec<u8> {
        let mut buf = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            self.status.as_u16(),
            self.status.reason_phrase()
        )
        .into_bytes();

        for (k, v) in &self.headers {
            buf.extend_from_slice(k.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(v.as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Writes the head followed by a fixed body into `out`.
    pub fn write_with_body(&self, body: &[u8], out: &mut ResponseBuffer) -> Result<(), ResponseError> {
        out.extend(&self.head())?;
        out.extend(body)
    }
}

/// Writes the fixed 404 response into `out`, replacing its contents.
pub fn write_not_found(out: &mut ResponseBuffer) -> Result<StatusCode, ResponseError> {
    write_fixed_page(StatusCode::NotFound, NOT_FOUND_BODY, out)
}

/// Writes the fixed 500 response into `out`, replacing its contents.
pub fn write_internal_error(out: &mut ResponseBuffer) -> Result<StatusCode, ResponseError> {
    write_fixed_page(StatusCode::InternalServerError, INTERNAL_ERROR_BODY, out)
}

fn write_fixed_page(status: StatusCode, body: &str, out: &mut ResponseBuffer) -> Result<StatusCode, ResponseError> {
    out.clear();
    ResponseBuilder::new(status)
        .header("Content-Type", "text/html")
        .write_with_body(body.as_bytes(), out)?;
    Ok(status)
}

/// Serves the file at `path` into `out`.
///
/// If the file cannot be opened, or is not a regular file, the fixed 404
/// response is written instead. Otherwise a 200 head with `mime` as the
/// content type is written, followed by the file's bytes.
///
/// Files that do not fit in `out` are rejected with
/// [`ResponseError::FileTooLarge`] before any of their bytes are read; the
/// buffer is never filled past its capacity even if the file grows while it
/// is being read.
pub async fn build_file_response(
    path: &Path,
    mime: &str,
    out: &mut ResponseBuffer,
) -> Result<StatusCode, ResponseError> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(_) => return write_not_found(out),
    };

    let size = match file.metadata().await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return write_not_found(out),
    };

    out.clear();
    let head = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", mime)
        .head();

    let fits = usize::try_from(size)
        .ok()
        .and_then(|size| size.checked_add(head.len()))
        .is_some_and(|total| total <= out.capacity());
    if !fits {
        return Err(ResponseError::FileTooLarge {
            size,
            capacity: out.capacity(),
        });
    }

    out.reserve(head.len() + size as usize);
    out.extend(&head)?;

    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = file.read(&mut chunk).await.map_err(ResponseError::Read)?;
        if n == 0 {
            break;
        }
        out.extend(&chunk[..n])?;
    }

    Ok(StatusCode::Ok)
}

use std::ops::Range;

use thiserror::Error;

const GET_PREFIX: &[u8] = b"GET /";
const VERSION_PREFIX: &[u8] = b" HTTP/1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("request line does not start with `GET /`")]
    NotGet,
    #[error("request path is empty")]
    EmptyPath,
    #[error("request path is not followed by ` HTTP/1`")]
    InvalidVersion,
}

/// Locates the requested path in the first line of `buf`.
///
/// The line must read `GET /<path> HTTP/1...` where `<path>` is one or more
/// non-space bytes. The returned range indexes into `buf` and excludes the
/// leading slash; the bytes are still percent-encoded. Anything after the
/// first line is ignored.
pub fn parse_request_path(buf: &[u8]) -> Result<Range<usize>, ParseError> {
    let line = &buf[..request_line_end(buf).unwrap_or(buf.len())];

    let rest = line.strip_prefix(GET_PREFIX).ok_or(ParseError::NotGet)?;

    let path_len = rest
        .iter()
        .position(|&b| b == b' ')
        .unwrap_or(rest.len());

    if path_len == 0 {
        return Err(ParseError::EmptyPath);
    }

    if !rest[path_len..].starts_with(VERSION_PREFIX) {
        return Err(ParseError::InvalidVersion);
    }

    let start = GET_PREFIX.len();
    Ok(start..start + path_len)
}

/// Returns the index of the `\n` terminating the request line, if received.
pub fn request_line_end(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

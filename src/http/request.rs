use std::borrow::Cow;
use std::path::PathBuf;

use crate::http::decode::percent_decode;
use crate::http::parser::{ParseError, parse_request_path};

/// A GET request for a single file.
///
/// Holds the requested path after percent-decoding, relative to the document
/// root (the leading slash of the request line is not included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Decoded path bytes, e.g. `a b.txt` for `GET /a%20b.txt HTTP/1.1`
    pub path: Vec<u8>,
}

impl Request {
    /// Parses the request line in `buf` and decodes its path.
    ///
    /// # Example
    ///
    /// ```
    /// # use statik::http::request::Request;
    /// let req = Request::parse(b"GET /a%20b.txt HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(req.path, b"a b.txt");
    /// ```
    pub fn parse(buf: &[u8]) -> Result<Self, ParseError> {
        let range = parse_request_path(buf)?;
        Ok(Self::from_encoded(&buf[range]))
    }

    /// Builds a request from a still percent-encoded path.
    pub fn from_encoded(encoded: &[u8]) -> Self {
        Self {
            path: percent_decode(encoded),
        }
    }

    /// The decoded path for log output. Invalid UTF-8 is replaced.
    pub fn display_path(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.path)
    }

    /// The decoded path as a filesystem path, relative to the document root.
    pub fn fs_path(&self) -> PathBuf {
        bytes_to_path(&self.path)
    }

    /// Text after the last `.` of the final path component.
    ///
    /// Returns `""` when there is no dot, or when the dot starts the
    /// component (dotfiles such as `.bashrc` have no extension).
    pub fn extension(&self) -> Cow<'_, str> {
        let name_start = self
            .path
            .iter()
            .rposition(|&b| b == b'/')
            .map_or(0, |slash| slash + 1);
        let name = &self.path[name_start..];

        match name.iter().rposition(|&b| b == b'.') {
            Some(dot) if dot > 0 => String::from_utf8_lossy(&name[dot + 1..]),
            _ => Cow::Borrowed(""),
        }
    }
}

#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

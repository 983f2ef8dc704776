//! MIME type detection based on file extensions.

/// Content type used when the extension is unknown or missing.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Maps a file extension (without the dot) to a `Content-Type` value.
///
/// Matching is case-insensitive. Unknown and empty extensions fall back to
/// [`DEFAULT_MIME_TYPE`].
///
/// # Example
///
/// ```
/// # use statik::http::mime::mime_type;
/// assert_eq!(mime_type("HTML"), "text/html");
/// assert_eq!(mime_type(""), "application/octet-stream");
/// ```
pub fn mime_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" => "text/plain",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => DEFAULT_MIME_TYPE,
    }
}

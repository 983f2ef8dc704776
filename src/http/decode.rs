//! Percent-decoding of request paths.

/// Decodes `%XX` escapes in `input` into raw bytes.
///
/// A `%` is only treated as an escape when two more bytes follow it and both
/// are hex digits. Anything else, including a trailing `%` or `%4`, is copied
/// through literally, so malformed input never reads out of bounds.
///
/// # Example
///
/// ```
/// # use statik::http::decode::percent_decode;
/// assert_eq!(percent_decode(b"a%20b.txt"), b"a b.txt");
/// assert_eq!(percent_decode(b"100%"), b"100%");
/// ```
pub fn percent_decode(input: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] == b'%' && i + 2 < input.len() {
            if let Some(byte) = hex_pair(input[i + 1], input[i + 2]) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }

        decoded.push(input[i]);
        i += 1;
    }

    decoded
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    Some((hex_digit(hi)? << 4) | hex_digit(lo)?)
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

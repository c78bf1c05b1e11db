//! `file://` URI handling for documents exchanged with the viewer.
//!
//! The viewer canonicalizes URIs before comparing them, so a path must be
//! encoded with exactly the same safe set the viewer uses or the lookup misses.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

pub const FILE_SCHEME: &str = "file://";

/// Characters left verbatim in a path: RFC 2396 unreserved marks (sec 2.3),
/// path-component delimiters (sec 3.3) and the segment separator.
pub const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    // unreserved marks
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    // path component
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b',')
    .remove(b'/');

/// Percent-encode a filesystem path.
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH_SAFE).to_string()
}

/// Undo [`encode_path`]. Invalid UTF-8 sequences become U+FFFD.
pub fn decode_path(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}

/// Build the URI the viewer uses to identify a document.
pub fn document_uri(path: &str) -> String {
    format!("{}{}", FILE_SCHEME, encode_path(path))
}

/// Decoded local path of a `file://` URI, `None` for any other scheme.
pub fn local_path(uri: &str) -> Option<String> {
    uri.strip_prefix(FILE_SCHEME).map(decode_path)
}

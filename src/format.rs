//! Line format of dump files.
//!
//! ```text
//!     key<delimiter>value\n
//! ```
//!
//! One entry per line, in ascending key order. Nothing is escaped: a key
//! containing the delimiter, or a key or value containing a newline, does
//! not survive a dump/load round trip.

use std::fmt::Display;

use bytes::{BufMut, BytesMut};

pub const DEFAULT_DELIMITER: &str = ":";

pub fn encode_entry<K, V>(key: &K, value: &V, delimiter: &str, buf: &mut BytesMut)
where
    K: Display,
    V: Display,
{
    buf.put_slice(key.to_string().as_bytes());
    buf.put_slice(delimiter.as_bytes());
    buf.put_slice(value.to_string().as_bytes());
    buf.put_u8(b'\n');
}

/// Splits a line at the first delimiter. Returns `None` for lines without
/// the delimiter or with an empty key or value.
pub fn decode_line<'a>(line: &'a str, delimiter: &str) -> Option<(&'a str, &'a str)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let (key, value) = line.split_once(delimiter)?;
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

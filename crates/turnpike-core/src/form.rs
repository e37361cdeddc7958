//! Query-string and form-urlencoded codec.
//!
//! Decodes `key=value&key=value` text into a multi-valued [`FormMap`].
//! A decoded key ending in `[]` accumulates an ordered list under the key
//! minus the brackets; any other key overwrites, last write wins. All values
//! stay text; no type coercion happens here.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;

/// One value slot in a [`FormMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A plain `key=value` assignment.
    Single(String),
    /// Values accumulated through the `key[]` convention, in arrival order.
    Many(Vec<String>),
}

impl FormValue {
    /// The first value, regardless of variant.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(v) => Some(v),
            Self::Many(vs) => vs.first().map(String::as_str),
        }
    }

    /// All values as a slice; a `Single` is a slice of one.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(v) => std::slice::from_ref(v),
            Self::Many(vs) => vs,
        }
    }
}

/// Decoded form or query data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormMap {
    entries: HashMap<String, FormValue>,
}

impl FormMap {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The first value under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(FormValue::first)
    }

    /// Every value under `key`; empty when the key is absent.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries.get(key).map_or(&[], FormValue::as_slice)
    }

    /// The raw slot under `key`, keeping the single/list distinction.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&FormValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, slot)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Plain assignment: replaces whatever was stored before.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), FormValue::Single(value.into()));
    }

    /// `key[]` accumulation: appends to the list under `key`, starting a new
    /// list when the slot is absent or held a plain assignment.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let slot = self
            .entries
            .entry(key.into())
            .or_insert_with(|| FormValue::Many(Vec::new()));
        match slot {
            FormValue::Many(vs) => vs.push(value.into()),
            FormValue::Single(_) => *slot = FormValue::Many(vec![value.into()]),
        }
    }
}

/// Decode a query string or form-urlencoded body.
///
/// Splits on `&`, splits each segment on the first `=` (a segment without
/// `=` maps to an empty value), percent/plus-decodes both sides, then applies
/// the `[]` accumulation convention.
///
/// # Example
///
/// ```
/// use turnpike_core::form::parse_query;
///
/// let map = parse_query("x=1&y[]=2&y[]=3");
/// assert_eq!(map.get("x"), Some("1"));
/// assert_eq!(map.get_all("y"), ["2", "3"]);
/// ```
#[must_use]
pub fn parse_query(input: &str) -> FormMap {
    let mut map = FormMap::new();
    for segment in input.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        let key = percent_decode(key);
        let value = percent_decode(value);
        if let Some(base) = key.strip_suffix("[]") {
            map.push(base, value.into_owned());
        } else {
            map.set(key.into_owned(), value.into_owned());
        }
    }
    map
}

/// Percent/plus-decode one query-string token.
///
/// `+` becomes a space and `%XX` becomes the named byte. Malformed escapes
/// pass through unchanged, and the decoded bytes are read as UTF-8 lossily.
/// Borrows the input when nothing needs decoding.
#[must_use]
pub fn percent_decode(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| b == b'%' || b == b'+') {
        return Cow::Borrowed(s);
    }

    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        decoded.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        // Malformed escape: keep the literal percent sign.
                        decoded.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }

    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}

/// Percent/plus-encode one token for a query string or cookie pair.
///
/// ASCII alphanumerics and `-_.~` pass through, a space becomes `+`, and
/// every other byte becomes `%XX` with uppercase hex.
#[must_use]
pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b));
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== percent decoding ====================

    #[test]
    fn test_decode_passthrough_borrows() {
        let decoded = percent_decode("plain-text");
        assert!(matches!(decoded, Cow::Borrowed("plain-text")));
    }

    #[test]
    fn test_decode_plus_as_space() {
        assert_eq!(percent_decode("a+b+c"), "a b c");
    }

    #[test]
    fn test_decode_hex_pairs() {
        assert_eq!(percent_decode("%41%42"), "AB");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
    }

    #[test]
    fn test_decode_malformed_escape_kept() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%4"), "%4");
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let decoded = percent_decode("%FF%FE");
        assert!(decoded.contains('\u{FFFD}'));
    }

    // ==================== percent encoding ====================

    #[test]
    fn test_encode_unreserved_passthrough() {
        assert_eq!(percent_encode("Az09-_.~"), "Az09-_.~");
    }

    #[test]
    fn test_encode_space_and_specials() {
        assert_eq!(percent_encode("a b"), "a+b");
        assert_eq!(percent_encode("a=b;c"), "a%3Db%3Bc");
        assert_eq!(percent_encode("café"), "caf%C3%A9");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        for text in ["hello world", "a=b&c=d", "caffè+latte", "100%"] {
            assert_eq!(percent_decode(&percent_encode(text)), text);
        }
    }

    // ==================== query parsing ====================

    #[test]
    fn test_parse_simple_pairs() {
        let map = parse_query("x=1&y=2");
        assert_eq!(map.get("x"), Some("1"));
        assert_eq!(map.get("y"), Some("2"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn test_parse_segment_without_equals() {
        let map = parse_query("flag&x=1");
        assert_eq!(map.get("flag"), Some(""));
        assert_eq!(map.get("x"), Some("1"));
    }

    #[test]
    fn test_parse_value_with_embedded_equals() {
        let map = parse_query("expr=a=b");
        assert_eq!(map.get("expr"), Some("a=b"));
    }

    #[test]
    fn test_parse_plain_key_overwrites() {
        let map = parse_query("x=1&x=2");
        assert_eq!(map.get("x"), Some("2"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_parse_bracket_key_accumulates() {
        let map = parse_query("x=1&y[]=2&y[]=3");
        assert_eq!(map.get("x"), Some("1"));
        assert_eq!(map.get_all("y"), ["2", "3"]);
        assert_eq!(
            map.value("y"),
            Some(&FormValue::Many(vec!["2".to_string(), "3".to_string()]))
        );
    }

    #[test]
    fn test_parse_encoded_brackets_accumulate() {
        let map = parse_query("y%5B%5D=a&y[]=b");
        assert_eq!(map.get_all("y"), ["a", "b"]);
    }

    #[test]
    fn test_parse_decodes_both_sides() {
        let map = parse_query("na+me=v%20l");
        assert_eq!(map.get("na me"), Some("v l"));
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        let map = parse_query("a=1&&b=2");
        assert_eq!(map.len(), 2);
    }

    // ==================== map semantics ====================

    #[test]
    fn test_push_after_set_replaces_with_list() {
        let mut map = FormMap::new();
        map.set("k", "solo");
        map.push("k", "first");
        assert_eq!(map.get_all("k"), ["first"]);
    }

    #[test]
    fn test_set_after_push_replaces_list() {
        let mut map = FormMap::new();
        map.push("k", "a");
        map.push("k", "b");
        map.set("k", "solo");
        assert_eq!(map.get("k"), Some("solo"));
        assert_eq!(map.get_all("k"), ["solo"]);
    }

    #[test]
    fn test_get_all_missing_key_is_empty() {
        let map = FormMap::new();
        assert!(map.get_all("nope").is_empty());
        assert_eq!(map.get("nope"), None);
    }
}

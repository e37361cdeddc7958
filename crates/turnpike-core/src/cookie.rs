//! Cookie header parsing and `Set-Cookie` serialization.

use std::collections::HashMap;
use std::fmt;

use crate::form::{percent_decode, percent_encode};
use crate::httpdate::HttpDate;

/// Parse a `Cookie:` request header into a name → value map.
///
/// Splits on `;`, trims whitespace, splits each piece on the first `=`
/// (absent `=` means an empty value), and percent/plus-decodes both sides.
/// Later duplicate names overwrite earlier ones.
#[must_use]
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for piece in header.split(';') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let (name, value) = piece.split_once('=').unwrap_or((piece, ""));
        map.insert(
            percent_decode(name).into_owned(),
            percent_decode(value).into_owned(),
        );
    }
    map
}

/// An outbound cookie, serialized as one `Set-Cookie` header value.
///
/// Attributes are emitted in a fixed order: `Domain`, `Path`, `Expires`,
/// `Max-Age`, `HttpOnly`, `Secure`.
///
/// # Example
///
/// ```
/// use turnpike_core::cookie::Cookie;
///
/// let cookie = Cookie::new("session", "abc 123").path("/").http_only();
/// assert_eq!(cookie.to_string(), "session=abc+123; Path=/; HttpOnly");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    expires: Option<HttpDate>,
    max_age: Option<u64>,
    http_only: bool,
    secure: bool,
}

impl Cookie {
    /// A cookie with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
            max_age: None,
            http_only: false,
            secure: false,
        }
    }

    /// An expiring cookie: empty value, `Expires` pinned to the epoch.
    ///
    /// Serving this drops the named cookie from the client.
    #[must_use]
    pub fn expired(name: impl Into<String>) -> Self {
        Self::new(name, "").expires(HttpDate::EPOCH)
    }

    /// Set the `Domain` attribute.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the `Path` attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the `Expires` attribute.
    #[must_use]
    pub fn expires(mut self, expires: HttpDate) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set the `Max-Age` attribute, in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Set the `HttpOnly` flag.
    #[must_use]
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Set the `Secure` flag.
    #[must_use]
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// The cookie name, as given (unencoded).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cookie value, as given (unencoded).
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}",
            percent_encode(&self.name),
            percent_encode(&self.value)
        )?;
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(expires) = &self.expires {
            write!(f, "; Expires={expires}")?;
        }
        if let Some(max_age) = &self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if self.http_only {
            write!(f, "; HttpOnly")?;
        }
        if self.secure {
            write!(f, "; Secure")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== parsing ====================

    #[test]
    fn test_parse_simple_pairs() {
        let map = parse_cookie_header("x=1; y=2");
        assert_eq!(map.get("x").map(String::as_str), Some("1"));
        assert_eq!(map.get("y").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_decodes_both_sides() {
        let map = parse_cookie_header("na%20me=v+1");
        assert_eq!(map.get("na me").map(String::as_str), Some("v 1"));
    }

    #[test]
    fn test_parse_piece_without_equals() {
        let map = parse_cookie_header("flag; x=1");
        assert_eq!(map.get("flag").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_later_duplicate_wins() {
        let map = parse_cookie_header("x=1; x=2");
        assert_eq!(map.get("x").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_parse_empty_header() {
        assert!(parse_cookie_header("").is_empty());
    }

    // ==================== serialization ====================

    #[test]
    fn test_serialize_bare_pair() {
        assert_eq!(Cookie::new("k", "v").to_string(), "k=v");
    }

    #[test]
    fn test_serialize_encodes_name_and_value() {
        let cookie = Cookie::new("na me", "v;1");
        assert_eq!(cookie.to_string(), "na+me=v%3B1");
    }

    #[test]
    fn test_serialize_attribute_order_is_fixed() {
        let cookie = Cookie::new("sid", "42")
            .secure()
            .http_only()
            .max_age(3600)
            .expires(HttpDate::ymd(2030, 1, 1))
            .path("/app")
            .domain("example.com");
        assert_eq!(
            cookie.to_string(),
            "sid=42; Domain=example.com; Path=/app; \
             Expires=Tue, 01 Jan 2030 00:00:00 GMT; Max-Age=3600; HttpOnly; Secure"
        );
    }

    #[test]
    fn test_expired_cookie_uses_epoch() {
        assert_eq!(
            Cookie::expired("sid").to_string(),
            "sid=; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn test_round_trip_through_parser() {
        let cookie = Cookie::new("name", "a value / 100%");
        let map = parse_cookie_header(&cookie.to_string());
        assert_eq!(
            map.get("name").map(String::as_str),
            Some("a value / 100%")
        );
    }
}

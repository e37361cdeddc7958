//! The mutable response accumulator handlers write into.

use crate::cookie::Cookie;
use crate::status::Status;

/// Content type seeded into every fresh response.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html;charset=utf-8";

/// An in-progress response: status, headers, and pending cookies.
///
/// Headers keep insertion order; setting a name that is already present
/// replaces the earlier value in place. Cookies are kept apart from plain
/// headers so each one can be emitted as its own `Set-Cookie` line.
#[derive(Debug, Clone)]
pub struct Response {
    status: Status,
    headers: Vec<(String, String)>,
    cookies: Vec<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// A fresh 200 response with the default content type.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: Status::OK,
            headers: vec![("Content-Type".to_string(), DEFAULT_CONTENT_TYPE.to_string())],
            cookies: Vec::new(),
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Look up a header by exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing an existing value for the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.headers.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.headers.push((name, value));
        }
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.set_header("Content-Type", content_type);
    }

    /// Queue a cookie for delivery.
    pub fn add_cookie(&mut self, cookie: &Cookie) {
        self.cookies.push(cookie.to_string());
    }

    /// Queue an expired cookie, telling the client to drop `name`.
    pub fn expire_cookie(&mut self, name: impl Into<String>) {
        self.add_cookie(&Cookie::expired(name));
    }

    /// Serialized `Set-Cookie` values queued so far.
    #[must_use]
    pub fn cookies(&self) -> &[String] {
        &self.cookies
    }

    /// The full header list for emission: plain headers in insertion order,
    /// then one `Set-Cookie` entry per queued cookie.
    #[must_use]
    pub fn header_list(&self) -> Vec<(String, String)> {
        let mut list = self.headers.clone();
        for cookie in &self.cookies {
            list.push(("Set-Cookie".to_string(), cookie.clone()));
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::httpdate::HttpDate;

    #[test]
    fn test_new_response_defaults() {
        let resp = Response::new();
        assert_eq!(resp.status(), Status::OK);
        assert_eq!(resp.content_type(), Some(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_set_header_replaces_in_place() {
        let mut resp = Response::new();
        resp.set_header("X-First", "1");
        resp.set_header("X-Second", "2");
        resp.set_header("X-First", "one");

        let list = resp.header_list();
        let names: Vec<&str> = list.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, ["Content-Type", "X-First", "X-Second"]);
        assert_eq!(resp.header("X-First"), Some("one"));
    }

    #[test]
    fn test_set_content_type() {
        let mut resp = Response::new();
        resp.set_content_type("application/json");
        assert_eq!(resp.content_type(), Some("application/json"));
        // Still a single Content-Type entry.
        let count = resp
            .header_list()
            .iter()
            .filter(|(name, _)| name == "Content-Type")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_cookies_emit_as_separate_headers() {
        let mut resp = Response::new();
        resp.add_cookie(&Cookie::new("sid", "abc"));
        resp.add_cookie(&Cookie::new("theme", "dark").path("/"));

        let list = resp.header_list();
        let set_cookie: Vec<&str> = list
            .iter()
            .filter(|(name, _)| name == "Set-Cookie")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(set_cookie, ["sid=abc", "theme=dark; Path=/"]);
    }

    #[test]
    fn test_expire_cookie() {
        let mut resp = Response::new();
        resp.expire_cookie("sid");
        assert_eq!(
            resp.cookies(),
            ["sid=; Expires=Thu, 01 Jan 1970 00:00:00 GMT"]
        );
    }

    #[test]
    fn test_cookie_with_expiry_round_trip() {
        let mut resp = Response::new();
        let expires = HttpDate::ymd(2030, 1, 1).and_hms(0, 0, 0);
        resp.add_cookie(&Cookie::new("sid", "abc").expires(expires));
        assert_eq!(
            resp.cookies(),
            ["sid=abc; Expires=Tue, 01 Jan 2030 00:00:00 GMT"]
        );
    }
}

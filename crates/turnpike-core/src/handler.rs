//! The handler model: payloads, captured path parameters, lifecycle hooks.

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{HttpError, HttpResult};
use crate::request::Request;
use crate::response::Response;

/// What a handler hands back on success.
///
/// The dispatcher serializes `Structured` to JSON (setting the response
/// content type to `application/json`) and emits `Raw` verbatim under
/// whatever content type the response carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Pre-rendered text.
    Raw(String),
    /// A key/value structure, serialized at emission.
    Structured(serde_json::Map<String, serde_json::Value>),
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Raw(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Self::Raw(text.to_string())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Payload {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Self::Structured(map)
    }
}

/// Path parameters captured by the matched pattern, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    /// An empty parameter set (what an exact-match route yields).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one captured parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// The captured text for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parse the captured text for `name` into `T`.
    ///
    /// Returns `None` when the parameter is absent or fails to parse; an
    /// `int`-typed pattern guarantees digits, so parsing into an integer
    /// type cannot fail for such captures.
    #[must_use]
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name)?.parse().ok()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// A route handler.
///
/// Handlers receive the mutable request (for its lazy body views), the
/// mutable response (status, headers, cookies), and the captured path
/// parameters, and return a [`Payload`] or short-circuit with an
/// [`HttpError`].
pub type BoxHandler =
    Arc<dyn Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload> + Send + Sync>;

/// Box a handler closure.
pub fn boxed<F>(handler: F) -> BoxHandler
where
    F: Fn(&mut Request, &mut Response, &PathParams) -> HttpResult<Payload> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Lifecycle hooks wrapped around every handler of one resource.
///
/// `after` always runs — on success, on a `before` failure, and on a handler
/// failure — and observes the failure without being able to suppress it.
pub trait Hooks: Send + Sync {
    /// Runs before the handler. A failure skips the handler; the post-hook
    /// still runs and the failure is re-raised afterwards.
    fn before(&self, req: &mut Request, resp: &mut Response) -> HttpResult<()> {
        let _ = (req, resp);
        Ok(())
    }

    /// Runs after the handler, success or failure.
    fn after(&self, req: &mut Request, resp: &mut Response, failure: Option<&HttpError>) {
        let _ = (req, resp, failure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_text() {
        assert_eq!(
            Payload::from("hi"),
            Payload::Raw("hi".to_string())
        );
        assert_eq!(
            Payload::from(String::from("hi")),
            Payload::Raw("hi".to_string())
        );
    }

    #[test]
    fn test_payload_from_map() {
        let mut map = serde_json::Map::new();
        map.insert("k".to_string(), serde_json::json!(1));
        assert!(matches!(Payload::from(map), Payload::Structured(_)));
    }

    #[test]
    fn test_params_get_and_parse() {
        let mut params = PathParams::new();
        params.push("name", "Alice");
        params.push("id", "42");
        assert_eq!(params.get("name"), Some("Alice"));
        assert_eq!(params.parse::<u32>("id"), Some(42));
        assert_eq!(params.parse::<u32>("name"), None);
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_params_iterate_in_capture_order() {
        let mut params = PathParams::new();
        params.push("a", "1");
        params.push("b", "2");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }
}

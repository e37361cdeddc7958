//! The typed failure signal that short-circuits dispatch.
//!
//! No status is ever selected by raising and catching: every failure travels
//! as an [`HttpError`] inside a `Result` and is collapsed into a response
//! exactly once, at the outermost dispatch boundary.

use std::fmt;

use crate::method::Method;
use crate::status::Status;

/// Result alias used by handlers, hooks, and body views.
pub type HttpResult<T> = Result<T, HttpError>;

/// A failure that renders directly as an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Malformed or oversized request content. Renders as
    /// `400 Bad Request: {reason}`.
    BadRequest(String),
    /// No route matched the request path.
    NotFound,
    /// A route matched the path but not the request method. Carries the
    /// methods the route does accept, for the `Allow` header.
    MethodNotAllowed { allow: Vec<Method> },
    /// Trailing-slash redirect; carries the `Location` target.
    MovedPermanently(String),
    /// Any other status a handler wants to signal, with optional
    /// pre-rendered content and extra headers.
    Status {
        status: Status,
        content: Option<String>,
        headers: Vec<(String, String)>,
    },
}

impl HttpError {
    /// Shorthand for [`HttpError::BadRequest`].
    #[must_use]
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest(reason.into())
    }

    /// A bare status with neither content nor extra headers.
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        Self::Status {
            status,
            content: None,
            headers: Vec::new(),
        }
    }

    /// A status with pre-rendered content.
    #[must_use]
    pub fn with_content(status: Status, content: impl Into<String>) -> Self {
        Self::Status {
            status,
            content: Some(content.into()),
            headers: Vec::new(),
        }
    }

    /// The status this failure renders with.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::BadRequest(_) => Status::BAD_REQUEST,
            Self::NotFound => Status::NOT_FOUND,
            Self::MethodNotAllowed { .. } => Status::METHOD_NOT_ALLOWED,
            Self::MovedPermanently(_) => Status::MOVED_PERMANENTLY,
            Self::Status { status, .. } => *status,
        }
    }

    /// Pre-rendered response content, when this failure carries any.
    ///
    /// Failures without content fall back to a minimal rendering of the
    /// status line at the dispatch boundary.
    #[must_use]
    pub fn content(&self) -> Option<String> {
        match self {
            Self::BadRequest(reason) => Some(format!("{}: {reason}", Status::BAD_REQUEST)),
            Self::MovedPermanently(location) => Some(location.clone()),
            Self::Status { content, .. } => content.clone(),
            Self::NotFound | Self::MethodNotAllowed { .. } => None,
        }
    }

    /// Extra headers merged into (and overriding) the default error headers.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        match self {
            Self::MethodNotAllowed { allow } => {
                let joined = allow
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                vec![("Allow".to_string(), joined)]
            }
            Self::MovedPermanently(location) => {
                vec![("Location".to_string(), location.clone())]
            }
            Self::Status { headers, .. } => headers.clone(),
            Self::BadRequest(_) | Self::NotFound => Vec::new(),
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(reason) => write!(f, "{}: {reason}", Status::BAD_REQUEST),
            Self::MovedPermanently(location) => {
                write!(f, "{} -> {location}", Status::MOVED_PERMANENTLY)
            }
            other => write!(f, "{}", other.status()),
        }
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_variant() {
        assert_eq!(HttpError::bad_request("x").status(), Status::BAD_REQUEST);
        assert_eq!(HttpError::NotFound.status(), Status::NOT_FOUND);
        assert_eq!(
            HttpError::MethodNotAllowed { allow: vec![] }.status(),
            Status::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            HttpError::MovedPermanently("/x".into()).status(),
            Status::MOVED_PERMANENTLY
        );
        assert_eq!(
            HttpError::from_status(Status::FORBIDDEN).status(),
            Status::FORBIDDEN
        );
    }

    #[test]
    fn test_bad_request_content_includes_reason() {
        let err = HttpError::bad_request("content-length required.");
        assert_eq!(
            err.content().as_deref(),
            Some("400 Bad Request: content-length required.")
        );
    }

    #[test]
    fn test_redirect_carries_location_in_content_and_headers() {
        let err = HttpError::MovedPermanently("/a/b?x=1".to_string());
        assert_eq!(err.content().as_deref(), Some("/a/b?x=1"));
        assert_eq!(
            err.headers(),
            vec![("Location".to_string(), "/a/b?x=1".to_string())]
        );
    }

    #[test]
    fn test_method_not_allowed_joins_allow_header() {
        let err = HttpError::MethodNotAllowed {
            allow: vec![Method::Get, Method::Head, Method::Post],
        };
        assert_eq!(
            err.headers(),
            vec![("Allow".to_string(), "GET, HEAD, POST".to_string())]
        );
        assert_eq!(err.content(), None);
    }

    #[test]
    fn test_custom_status_keeps_content_and_headers() {
        let err = HttpError::Status {
            status: Status::CONFLICT,
            content: Some("<p>busy</p>".to_string()),
            headers: vec![("Retry-After".to_string(), "1".to_string())],
        };
        assert_eq!(err.status(), Status::CONFLICT);
        assert_eq!(err.content().as_deref(), Some("<p>busy</p>"));
        assert_eq!(err.headers().len(), 1);
    }
}

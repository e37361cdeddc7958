//! The per-request record and its lazily-parsed body views.
//!
//! A [`Request`] is handed over by the host server with the raw pieces of the
//! wire request. Everything derived — query map, form map, JSON value,
//! multipart form, cookie map — is computed on first access and memoized.
//! The body itself may be read at most once; the read is gated by the
//! declared content length checked against a per-content-type ceiling
//! *before* any bytes move.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::mem;

use crate::cookie;
use crate::error::{HttpError, HttpResult};
use crate::form::{self, FormMap};
use crate::method::Method;
use crate::multipart::{Multipart, MultipartForm};

/// Error types for reading and decoding the request body.
#[derive(Debug)]
pub enum BodyError {
    /// No usable `Content-Length` on a request whose body is wanted.
    LengthRequired,
    /// The declared length is not a number.
    InvalidLength {
        /// The raw header text.
        raw: String,
    },
    /// The declared length exceeds the ceiling for this body view.
    TooLarge,
    /// The content type does not match the requested body view.
    ContentType {
        /// The content type the view needs.
        expected: &'static str,
        /// What the request actually declared.
        actual: String,
    },
    /// The body is not valid UTF-8 where text was required.
    NotText,
    /// The body could not be read from the connection.
    Read(std::io::Error),
    /// The body is not valid JSON.
    Json(serde_json::Error),
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthRequired => f.write_str("content-length required."),
            Self::InvalidLength { raw } => write!(f, "{raw:?}: invalid content length."),
            Self::TooLarge => f.write_str("content-length too large."),
            Self::ContentType { expected, actual } => {
                write!(
                    f,
                    "expected content type is {expected:?}, but actual is {actual:?}."
                )
            }
            Self::NotText => f.write_str("request body is not valid utf-8."),
            Self::Read(err) => write!(f, "failed to read request body: {err}."),
            Self::Json(err) => write!(f, "invalid json body: {err}."),
        }
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BodyError {
    fn from(err: std::io::Error) -> Self {
        Self::Read(err)
    }
}

impl From<BodyError> for HttpError {
    fn from(err: BodyError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Default ceiling for form-urlencoded bodies (1MB).
pub const DEFAULT_MAX_FORM_SIZE: usize = 1024 * 1024;

/// Default ceiling for JSON bodies (1MB).
pub const DEFAULT_MAX_JSON_SIZE: usize = 1024 * 1024;

/// Default ceiling for multipart bodies (10MB).
pub const DEFAULT_MAX_MULTIPART_SIZE: usize = 10 * 1024 * 1024;

/// Per-content-type body size ceilings.
#[derive(Debug, Clone)]
pub struct BodyLimits {
    max_form_size: usize,
    max_json_size: usize,
    max_multipart_size: usize,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_form_size: DEFAULT_MAX_FORM_SIZE,
            max_json_size: DEFAULT_MAX_JSON_SIZE,
            max_multipart_size: DEFAULT_MAX_MULTIPART_SIZE,
        }
    }
}

impl BodyLimits {
    /// Create limits with the default ceilings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the form body ceiling.
    #[must_use]
    pub fn max_form_size(mut self, size: usize) -> Self {
        self.max_form_size = size;
        self
    }

    /// Set the JSON body ceiling.
    #[must_use]
    pub fn max_json_size(mut self, size: usize) -> Self {
        self.max_json_size = size;
        self
    }

    /// Set the multipart body ceiling.
    #[must_use]
    pub fn max_multipart_size(mut self, size: usize) -> Self {
        self.max_multipart_size = size;
        self
    }

    /// Get the form body ceiling.
    #[must_use]
    pub fn get_max_form_size(&self) -> usize {
        self.max_form_size
    }

    /// Get the JSON body ceiling.
    #[must_use]
    pub fn get_max_json_size(&self) -> usize {
        self.max_json_size
    }

    /// Get the multipart body ceiling.
    #[must_use]
    pub fn get_max_multipart_size(&self) -> usize {
        self.max_multipart_size
    }
}

/// The request body source, consumed at most once.
pub enum Body {
    /// No body.
    Empty,
    /// Fully buffered bytes.
    Bytes(Vec<u8>),
    /// Read lazily from the host connection.
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Body::Empty"),
            Self::Bytes(bytes) => write!(f, "Body::Bytes({} bytes)", bytes.len()),
            Self::Reader(_) => f.write_str("Body::Reader(..)"),
        }
    }
}

/// One HTTP request, as normalized by the host server.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    content_length: Option<String>,
    cookie_header: Option<String>,
    body: Body,
    body_consumed: bool,
    limits: BodyLimits,
    query: Option<FormMap>,
    form: Option<FormMap>,
    json: Option<serde_json::Value>,
    multipart: Option<MultipartForm>,
    cookies: Option<HashMap<String, String>>,
}

impl Request {
    /// Start building a request.
    #[must_use]
    pub fn builder(method: Method, path: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path.into())
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, without a leading `?`.
    #[must_use]
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The declared content length, parsed from the raw header text.
    ///
    /// A missing or empty header is `None`; a non-numeric header is a 400.
    pub fn content_length(&self) -> HttpResult<Option<u64>> {
        match self.content_length.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => match raw.trim().parse() {
                Ok(length) => Ok(Some(length)),
                Err(_) => Err(BodyError::InvalidLength {
                    raw: raw.to_string(),
                }
                .into()),
            },
        }
    }

    /// The body ceilings this request reads under.
    #[must_use]
    pub fn limits(&self) -> &BodyLimits {
        &self.limits
    }

    /// Replace the body ceilings (the dispatcher stamps app-level limits in
    /// before the handler runs).
    pub fn set_limits(&mut self, limits: BodyLimits) {
        self.limits = limits;
    }

    /// The decoded query string, parsed once.
    pub fn query(&mut self) -> &FormMap {
        if self.query.is_none() {
            self.query = Some(form::parse_query(&self.query_string));
        }
        self.query.get_or_insert_with(FormMap::new)
    }

    /// The decoded form body, parsed once.
    ///
    /// Requires a `application/x-www-form-urlencoded` content type and a
    /// declared length within the form ceiling.
    pub fn form(&mut self) -> HttpResult<&FormMap> {
        if self.form.is_none() {
            self.expect_content_type("application/x-www-form-urlencoded")?;
            let max_size = self.limits.get_max_form_size();
            let text = self.read_body_text(max_size)?;
            self.form = Some(form::parse_query(&text));
        }
        Ok(self.form.get_or_insert_with(FormMap::new))
    }

    /// The decoded JSON body, parsed once.
    pub fn json(&mut self) -> HttpResult<&serde_json::Value> {
        if self.json.is_none() {
            self.expect_content_type("application/json")?;
            let max_size = self.limits.get_max_json_size();
            let text = self.read_body_text(max_size)?;
            let value = serde_json::from_str(&text).map_err(BodyError::Json)?;
            self.json = Some(value);
        }
        Ok(self.json.get_or_insert_with(|| serde_json::Value::Null))
    }

    /// The parsed multipart body, parsed once.
    pub fn multipart(&mut self) -> HttpResult<&MultipartForm> {
        if self.multipart.is_none() {
            self.expect_content_type("multipart/form-data")?;
            let parser = Multipart::from_content_type(self.content_type.as_deref())?;
            let max_size = self.limits.get_max_multipart_size();
            let body = self.read_body_bytes(max_size)?;
            self.multipart = Some(parser.parse(&body)?);
        }
        Ok(self.multipart.get_or_insert_with(MultipartForm::default))
    }

    /// The parsed cookie header, parsed once.
    pub fn cookies(&mut self) -> &HashMap<String, String> {
        if self.cookies.is_none() {
            let parsed = self
                .cookie_header
                .as_deref()
                .map(cookie::parse_cookie_header)
                .unwrap_or_default();
            self.cookies = Some(parsed);
        }
        self.cookies.get_or_insert_with(HashMap::new)
    }

    /// Read the raw body, at most once.
    ///
    /// The declared content length is validated against `max_size` before
    /// any bytes move. Once the body has been consumed — here or through a
    /// body view — further reads yield an empty buffer.
    pub fn read_body(&mut self, max_size: usize) -> HttpResult<Vec<u8>> {
        self.read_body_bytes(max_size)
    }

    fn expect_content_type(&self, expected: &'static str) -> HttpResult<()> {
        let actual = self.content_type.as_deref().unwrap_or("");
        if actual.starts_with(expected) {
            Ok(())
        } else {
            Err(BodyError::ContentType {
                expected,
                actual: actual.to_string(),
            }
            .into())
        }
    }

    fn read_body_bytes(&mut self, max_size: usize) -> HttpResult<Vec<u8>> {
        if self.body_consumed {
            return Ok(Vec::new());
        }
        let Some(declared) = self.content_length()? else {
            return Err(BodyError::LengthRequired.into());
        };
        let declared = usize::try_from(declared).map_err(|_| BodyError::TooLarge)?;
        if declared > max_size {
            return Err(BodyError::TooLarge.into());
        }

        self.body_consumed = true;
        match mem::replace(&mut self.body, Body::Empty) {
            Body::Empty => Ok(Vec::new()),
            Body::Bytes(mut bytes) => {
                bytes.truncate(declared);
                Ok(bytes)
            }
            Body::Reader(reader) => {
                let mut buf = Vec::with_capacity(declared.min(64 * 1024));
                reader
                    .take(declared as u64)
                    .read_to_end(&mut buf)
                    .map_err(BodyError::from)?;
                Ok(buf)
            }
        }
    }

    fn read_body_text(&mut self, max_size: usize) -> HttpResult<String> {
        let bytes = self.read_body_bytes(max_size)?;
        Ok(String::from_utf8(bytes).map_err(|_| BodyError::NotText)?)
    }
}

/// Builder for [`Request`], the hand-over point for host servers and tests.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    content_length: Option<String>,
    cookie_header: Option<String>,
    body: Body,
    limits: BodyLimits,
}

impl RequestBuilder {
    fn new(method: Method, path: String) -> Self {
        Self {
            method,
            path,
            query_string: String::new(),
            content_type: None,
            content_length: None,
            cookie_header: None,
            body: Body::Empty,
            limits: BodyLimits::default(),
        }
    }

    /// Set the raw query string (no leading `?`).
    #[must_use]
    pub fn query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    /// Set the `Content-Type` header value.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Declare the content length.
    #[must_use]
    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length.to_string());
        self
    }

    /// Declare the content length from raw header text, unvalidated — hosts
    /// pass the wire value through and validation happens on use.
    #[must_use]
    pub fn content_length_text(mut self, raw: impl Into<String>) -> Self {
        self.content_length = Some(raw.into());
        self
    }

    /// Set the raw `Cookie` header value.
    #[must_use]
    pub fn cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }

    /// Attach a buffered body. Declares the content length too, unless one
    /// was set explicitly.
    #[must_use]
    pub fn body(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        if self.content_length.is_none() {
            self.content_length = Some(bytes.len().to_string());
        }
        self.body = Body::Bytes(bytes);
        self
    }

    /// Attach a lazy body source. The content length must be declared
    /// separately, as on the wire.
    #[must_use]
    pub fn body_reader(mut self, reader: impl Read + Send + 'static) -> Self {
        self.body = Body::Reader(Box::new(reader));
        self
    }

    /// Override the body ceilings for this request.
    #[must_use]
    pub fn limits(mut self, limits: BodyLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            content_type: self.content_type,
            content_length: self.content_length,
            cookie_header: self.cookie_header,
            body: self.body,
            body_consumed: false,
            limits: self.limits,
            query: None,
            form: None,
            json: None,
            multipart: None,
            cookies: None,
        }
    }
}

//! Core types and body codecs for turnpike.
//!
//! This crate provides the fundamental building blocks:
//! - [`Request`] and [`Response`] types with lazily-parsed body views
//! - [`Method`] and [`Status`] primitives
//! - [`HttpError`], the error taxonomy dispatch renders from
//! - Query/form, multipart, and cookie codecs
//! - [`Hooks`] and the boxed handler signature routes dispatch to
//!
//! # Design Principles
//!
//! - Parse on first access, memoize, never re-read the body
//! - Size ceilings are enforced before any body bytes move
//! - Decode errors surface as 400s with exact, testable messages
//! - All shared types are `Send + Sync`

#![forbid(unsafe_code)]

pub mod cookie;
pub mod error;
pub mod form;
pub mod handler;
pub mod httpdate;
pub mod method;
pub mod multipart;
pub mod request;
pub mod response;
pub mod status;

pub use cookie::{Cookie, parse_cookie_header};
pub use error::{HttpError, HttpResult};
pub use form::{FormMap, FormValue, parse_query, percent_decode, percent_encode};
pub use handler::{BoxHandler, Hooks, PathParams, Payload, boxed};
pub use httpdate::HttpDate;
pub use method::Method;
pub use multipart::{FileMap, FilePart, FileValue, Multipart, MultipartError, MultipartForm};
pub use request::{Body, BodyError, BodyLimits, Request, RequestBuilder};
pub use response::{DEFAULT_CONTENT_TYPE, Response};
pub use status::Status;

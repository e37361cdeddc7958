//! A minimal HTTP request router and dispatch engine.
//!
//! turnpike resolves a request path against a frozen route table, runs the
//! matching handler inside its resource hooks, and renders every outcome —
//! success or typed failure — into a complete reply:
//!
//! - **Two-tier lookup** — literal routes from a hash map, placeholder
//!   routes scanned in registration order behind a prefix pre-filter
//! - **Typed failures** — handlers return `Result`; a 404, 405, or 400 is a
//!   value, not a thrown exception
//! - **Lazy body views** — query, form, JSON, multipart, and cookies parse
//!   on first access with size ceilings enforced up front
//! - **Trailing-slash care** — a GET miss whose slash-toggled twin exists
//!   becomes a 301 with the query string preserved
//!
//! # Quick Start
//!
//! ```
//! use turnpike::prelude::*;
//!
//! fn main() -> Result<(), turnpike::RouterError> {
//!     let app = App::builder()
//!         .mount(
//!             "/hello/{name}",
//!             Resource::new().get("", |_req, _resp, params| {
//!                 let name = params.get("name").unwrap_or("world");
//!                 Ok(Payload::from(format!("<h1>hello {name}</h1>")))
//!             }),
//!         )
//!         .build()?;
//!
//!     let reply = app.handle(Request::builder(Method::Get, "/hello/rust").build());
//!     assert_eq!(reply.status(), Status::OK);
//!     assert_eq!(reply.text(), "<h1>hello rust</h1>");
//!     Ok(())
//! }
//! ```
//!
//! # Crate Structure
//!
//! - [`turnpike_core`] — request/response types, body codecs, error taxonomy
//! - [`turnpike_router`] — pattern compiler and the two-tier route table

#![forbid(unsafe_code)]

mod app;

// Re-export crates
pub use turnpike_core as core;
pub use turnpike_router as router;

pub use app::{App, AppBuilder, Reply};

// Re-export commonly used types
pub use turnpike_core::{
    Body, BodyError, BodyLimits, BoxHandler, Cookie, DEFAULT_CONTENT_TYPE, FileMap, FilePart,
    FileValue, FormMap, FormValue, Hooks, HttpDate, HttpError, HttpResult, Method, Multipart,
    MultipartError, MultipartForm, PathParams, Payload, Request, RequestBuilder, Response, Status,
    boxed, parse_cookie_header, parse_query, percent_decode, percent_encode,
};
pub use turnpike_router::{Pattern, PatternError, Resource, RouteTable, RouteTree, RouterError};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        App, AppBuilder, BodyLimits, Cookie, Hooks, HttpError, HttpResult, Method, PathParams,
        Payload, Reply, Request, Resource, Response, RouteTree, Status,
    };
    pub use serde::{Deserialize, Serialize};
}

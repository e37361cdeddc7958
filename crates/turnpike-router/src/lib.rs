//! Regex-backed HTTP route table.
//!
//! This crate compiles route templates and resolves request paths for the
//! turnpike dispatcher.
//!
//! # Features
//!
//! - Placeholder extraction (`/items/{id}`, `/items/{id:int}`)
//! - Explicit per-placeholder regexes (`/items/{tag:<[a-z-]+>}`)
//! - Literal routes answered from a hash map, placeholder routes scanned in
//!   registration order behind a literal-prefix pre-filter
//! - Duplicate routes and malformed templates rejected at build time

#![warn(unsafe_code)]

mod pattern;
mod table;

pub use pattern::{Pattern, PatternError};
pub use table::{Resource, RouteTable, RouteTarget, RouteTree, RouterError};

//! Route patterns and path matching for the Amphora framework.
//!
//! Routes are declared with a Next.js-style path grammar and matched
//! against normalized request paths, first match wins:
//!
//! ```text
//! /                -> index
//! /about           -> static segment
//! /product/:id     -> parameter segment
//! /blog/*slug      -> rest segment (consumes the remaining path)
//! ```
//!
//! Matching is pure: a compiled [`RoutePattern`] is immutable and can be
//! shared across requests without synchronization.

pub mod prelude;
mod pattern;

pub use pattern::*;

use std::collections::HashMap;

/// Extracted route parameters (e.g. `:id` from `/product/:id`).
pub type RouteParams = HashMap<String, String>;

/// Query string parameters.
pub type QueryParams = HashMap<String, String>;

/// HTTP headers as lowercase name/value pairs.
pub type Headers = HashMap<String, String>;

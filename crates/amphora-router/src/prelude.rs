//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use amphora_router::prelude::*;
//! ```

pub use crate::{Headers, PatternMatch, QueryParams, RoutePattern, RouteParams, Segment};

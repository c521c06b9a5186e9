//! Outbound HTTP plumbing for the Amphora framework.
//!
//! Preload callbacks fetch data through the per-request preload context,
//! which merges credentials and hands a fully resolved [`OutboundRequest`]
//! to an injected [`Transport`]. This crate defines that seam plus the
//! request/response types and fetch error taxonomy; it deliberately
//! contains no socket code, so the embedding server decides how bytes
//! actually move.
//!
//! # Example
//!
//! ```rust,ignore
//! use amphora_data::{FetchOptions, Credentials};
//!
//! // In a preload callback
//! let resp = ctx
//!     .fetch("/api/posts/hello-world", FetchOptions::new())
//!     .await?;
//! let post: Post = resp.json()?;
//! ```

mod error;
mod request;
mod response;

pub use error::FetchError;
pub use request::{Credentials, FetchOptions, Method, OutboundRequest};
pub use response::FetchResponse;

use async_trait::async_trait;

/// Transport used to perform outbound fetches.
///
/// Implementations own connection handling, pooling and TLS; the core
/// never retries or times out on their behalf. Errors propagate to the
/// calling preload as fetch failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a resolved request and return the response.
    async fn send(&self, request: OutboundRequest) -> Result<FetchResponse, FetchError>;
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Credentials, FetchError, FetchOptions, FetchResponse, Method, OutboundRequest, Transport,
    };
}

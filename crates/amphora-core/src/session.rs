//! Session retrieval.

use crate::http::{PageRequest, ResponseParts};
use async_trait::async_trait;
use thiserror::Error;

/// Opaque per-request session data, passed through to every preload call
/// and to the renderer.
pub type Session = serde_json::Value;

/// The session getter failed; the request answers with a generic
/// internal error and the page is never rendered.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct SessionError(pub String);

/// Injected session retrieval.
///
/// The getter may stage response headers (typically `Set-Cookie`) while
/// resolving the session; any cookies staged here are visible to the
/// fetch proxy's credential forwarding.
#[async_trait]
pub trait SessionGetter: Send + Sync {
    /// Resolve the session for a request.
    async fn session(
        &self,
        req: &PageRequest,
        res: &mut ResponseParts,
    ) -> Result<Session, SessionError>;
}

/// Session getter for apps without sessions; always yields `null`.
pub struct NoSession;

#[async_trait]
impl SessionGetter for NoSession {
    async fn session(
        &self,
        _req: &PageRequest,
        _res: &mut ResponseParts,
    ) -> Result<Session, SessionError> {
        Ok(Session::Null)
    }
}

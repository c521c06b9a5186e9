//! Preload execution: the per-request context and the fan-out/fan-in
//! orchestrator.

use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture};
use futures::FutureExt;
use thiserror::Error;

use amphora_data::{FetchError, FetchOptions, FetchResponse};
use amphora_router::{PatternMatch, QueryParams, RouteParams};

use crate::http::PageRequest;
use crate::manifest::{Component, Page};
use crate::proxy::FetchProxy;
use crate::session::Session;

/// Props produced by one preload callback.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// A preload callback failed.
///
/// Outside error-page rendering this funnels into a 500 error-page
/// render with the failure as message; during error-page rendering it
/// is terminal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PreloadFailure {
    pub message: String,
    /// Raw stack trace of the failing callback, when one exists. Runs
    /// through the injected stack translator before the error render.
    pub stack: Option<String>,
}

impl PreloadFailure {
    /// A failure with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
        }
    }

    /// Attach a raw stack trace.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl From<FetchError> for PreloadFailure {
    fn from(err: FetchError) -> Self {
        PreloadFailure::new(err.to_string())
    }
}

impl From<&str> for PreloadFailure {
    fn from(message: &str) -> Self {
        PreloadFailure::new(message)
    }
}

impl From<String> for PreloadFailure {
    fn from(message: String) -> Self {
        PreloadFailure::new(message)
    }
}

/// The request view handed to every preload callback.
#[derive(Debug, Clone)]
pub struct PreloadRequest {
    pub host: String,
    pub path: String,
    pub query: QueryParams,
    /// Extracted parameters; empty for the root preload.
    pub params: RouteParams,
}

/// A redirect requested during preload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: u16,
    pub location: String,
}

/// An error reported during preload via [`PreloadContext::error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, Default)]
struct Outcome {
    redirect: Option<Redirect>,
    conflict: bool,
    error: Option<ReportedError>,
}

/// Per-request helper shared by all preload invocations of one request.
///
/// The redirect/error slots are written by potentially multiple
/// in-flight preload callbacks and read only after the orchestrator has
/// joined the whole fan-out.
pub struct PreloadContext {
    proxy: FetchProxy,
    outcome: Mutex<Outcome>,
}

impl PreloadContext {
    pub(crate) fn new(proxy: FetchProxy) -> Self {
        Self {
            proxy,
            outcome: Mutex::new(Outcome::default()),
        }
    }

    /// Request a redirect.
    ///
    /// Every call within one request must agree on status and location;
    /// a conflicting second call is a programming error and fails the
    /// whole request.
    pub fn redirect(&self, status: u16, location: &str) {
        let location = location.trim_start_matches('/').to_string();
        let mut outcome = self.outcome.lock().unwrap();
        if let Some(existing) = &outcome.redirect {
            if existing.status != status || existing.location != location {
                outcome.conflict = true;
                return;
            }
        }
        outcome.redirect = Some(Redirect { status, location });
    }

    /// Record an error outcome. Remaining preloads still run; the
    /// recorded error takes precedence over a successful render.
    pub fn error(&self, status: u16, message: impl Into<String>) {
        let mut outcome = self.outcome.lock().unwrap();
        outcome.error = Some(ReportedError {
            status,
            message: message.into(),
        });
    }

    /// Proxied outbound fetch with credential forwarding.
    pub async fn fetch(
        &self,
        url: &str,
        opts: FetchOptions,
    ) -> Result<FetchResponse, FetchError> {
        self.proxy.fetch(url, opts).await
    }

    pub(crate) fn redirect_conflict(&self) -> bool {
        self.outcome.lock().unwrap().conflict
    }

    pub(crate) fn recorded_redirect(&self) -> Option<Redirect> {
        self.outcome.lock().unwrap().redirect.clone()
    }

    pub(crate) fn recorded_error(&self) -> Option<ReportedError> {
        self.outcome.lock().unwrap().error.clone()
    }
}

/// Joined preload results.
pub(crate) struct PreloadRun {
    /// Per-level props, root first, one slot per part.
    pub preloaded: Vec<Props>,
    /// Parameters of the deepest part that had an extractor.
    pub params: RouteParams,
}

/// Run the root preload and every part's preload.
///
/// All callbacks start without waiting on one another and are joined
/// before the outcome slots are inspected; result order is fixed (root,
/// then parts in order) regardless of completion order. The first
/// failure discards the whole set.
pub(crate) async fn run_preloads(
    root: &Arc<dyn Component>,
    page: &Page,
    pattern_match: Option<&PatternMatch>,
    ctx: &PreloadContext,
    req: &PageRequest,
    session: &Session,
) -> Result<PreloadRun, PreloadFailure> {
    let view = |params: RouteParams| PreloadRequest {
        host: req.host.clone(),
        path: req.path.clone(),
        query: req.query.clone(),
        params,
    };

    let mut jobs: Vec<BoxFuture<'_, Result<Props, PreloadFailure>>> = Vec::new();

    let root_view = view(RouteParams::new());
    let root = Arc::clone(root);
    jobs.push(async move { root.preload(ctx, &root_view, session).await }.boxed());

    let mut deepest_params = RouteParams::new();
    for part in &page.parts {
        match part {
            None => jobs.push(future::ready(Ok(Props::new())).boxed()),
            Some(part) => {
                let params = match (&part.params, pattern_match) {
                    (Some(extract), Some(matched)) => extract(matched),
                    _ => RouteParams::new(),
                };
                deepest_params = params.clone();
                let part_view = view(params);
                let component = Arc::clone(&part.component);
                jobs.push(
                    async move { component.preload(ctx, &part_view, session).await }.boxed(),
                );
            }
        }
    }

    let preloaded = future::try_join_all(jobs).await?;

    Ok(PreloadRun {
        preloaded,
        params: deepest_params,
    })
}

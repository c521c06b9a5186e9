//! Amphora Core
//!
//! Server-side page-rendering pipeline: given an incoming request, the
//! [`PageHandler`] resolves the matching route, runs the route
//! hierarchy's preload callbacks concurrently, reconciles redirect and
//! error outcomes, emits a preload-hint `Link` header and renders the
//! final HTML document from a base template.
//!
//! The component-tree renderer, the session store, the outbound fetch
//! transport and sourcemap translation are injected collaborators
//! behind narrow traits; the pipeline never depends on their internals.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use amphora_core::prelude::*;
//!
//! let manifest = Manifest::new(root_component, error_component)
//!     .with_page(
//!         Page::new(RoutePattern::parse("/blog/:slug"))
//!             .with_part(RoutePart::new(blog_post).with_name("blog-post")),
//!     );
//!
//! let handler = PageHandler::builder(manifest, AmphoraConfig::new())
//!     .renderer(renderer)
//!     .transport(transport)
//!     .build()?;
//!
//! let response = handler.handle(&request).await;
//! ```

pub mod prelude;

mod assets;
mod build_info;
mod config;
mod error;
mod handler;
mod http;
mod manifest;
mod preload;
mod proxy;
mod render;
mod session;
mod sourcemaps;
mod template;

pub use assets::preload_link_header;
pub use build_info::{AssetList, BuildInfo, BuildInfoSource, Bundler, CssAssets};
pub use config::AmphoraConfig;
pub use error::AmphoraError;
pub use handler::{PageHandler, PageHandlerBuilder};
pub use http::{PageRequest, ResponseParts};
pub use manifest::{Component, Manifest, Page, ParamsFn, RoutePart};
pub use preload::{
    PreloadContext, PreloadFailure, PreloadRequest, Props, Redirect, ReportedError,
};
pub use proxy::FetchProxy;
pub use render::{
    Level, PageContext, PageError, RenderFailure, RenderOutput, RenderProps, Renderer,
};
pub use session::{NoSession, Session, SessionError, SessionGetter};
pub use sourcemaps::{DiskSources, Sourcemaps};
pub use template::TemplateSource;

// Re-export the routing and fetch types the public API surfaces
pub use amphora_data::{
    Credentials, FetchError, FetchOptions, FetchResponse, Method, OutboundRequest, Transport,
};
pub use amphora_router::{Headers, PatternMatch, QueryParams, RoutePattern, RouteParams, Segment};

//! Render props assembly and the component-tree renderer seam.

use serde::Serialize;
use thiserror::Error;

use amphora_router::{QueryParams, RouteParams};

use crate::http::PageRequest;
use crate::manifest::Page;
use crate::preload::Props;
use crate::session::Session;

/// An error carried into the error-page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageError {
    /// Error class name.
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Raw stack trace, source-mapped before rendering when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl PageError {
    /// Create an error with an explicit name.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// An error originating from a preload callback or a plain message.
    pub fn preload(message: impl Into<String>) -> Self {
        Self::new("PreloadError", message)
    }

    /// The router-miss error.
    pub fn not_found() -> Self {
        Self::preload("Not found")
    }
}

/// The per-request page view model handed to the renderer's page store.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub host: String,
    pub path: String,
    pub query: QueryParams,
    /// Parameters of the deepest matched part.
    pub params: RouteParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

/// One rendering level.
///
/// Level 0 carries only the root's preloaded props; deeper levels add
/// the segment name and the component reference.
#[derive(Debug, Clone, Serialize)]
pub struct Level {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    pub props: Props,
}

/// The full props structure handed to the component-tree renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderProps {
    /// Page store contents.
    pub page: PageContext,
    /// Preloading store; always idle during server rendering.
    pub preloading: Option<bool>,
    /// Session store contents.
    pub session: Session,
    /// Layout segments derived from the request path, one slot per
    /// rendering level below the root.
    pub segments: Vec<Option<String>>,
    /// Response status the page is rendered with.
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
    /// Rendering levels, root first.
    pub levels: Vec<Level>,
}

/// Output of the component-tree renderer.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    /// Rendered body markup.
    pub html: String,
    /// Rendered head markup.
    pub head: String,
    /// Inlined component CSS, used when the build has no main CSS bundle.
    pub css: String,
}

/// The component-tree render failed.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct RenderFailure(pub String);

/// The external component-tree renderer.
///
/// Turns the assembled props into HTML, head markup and CSS. The
/// pipeline never looks inside the component graph.
pub trait Renderer: Send + Sync {
    fn render(&self, props: &RenderProps) -> Result<RenderOutput, RenderFailure>;
}

/// Assemble the render props for a request.
///
/// `preloaded` holds the joined preload results, root first, one slot
/// per part (empty props for parts without results). The layout
/// segments re-derive from the path: one leading slot, then one slot
/// advanced per component-bearing part, so empty layout parts share
/// their segment with the level below.
pub(crate) fn build_render_props(
    req: &PageRequest,
    page: &Page,
    params: RouteParams,
    session: Session,
    preloaded: &[Props],
    status: u16,
    error: Option<PageError>,
) -> RenderProps {
    let segments: Vec<String> = req
        .path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    let mut layout_segments: Vec<Option<String>> = vec![segments.first().cloned()];
    let mut level = 1;
    for (i, part) in page.parts.iter().enumerate() {
        let segment = segments.get(i + 1).cloned();
        if layout_segments.len() <= level {
            layout_segments.push(segment);
        } else {
            layout_segments[level] = segment;
        }
        if part.is_none() {
            continue;
        }
        level += 1;
    }

    let mut levels = vec![Level {
        segment: None,
        component: None,
        props: preloaded.first().cloned().unwrap_or_default(),
    }];

    for (i, part) in page.parts.iter().enumerate() {
        let Some(part) = part else { continue };
        levels.push(Level {
            segment: segments.get(i).cloned(),
            component: Some(part.component.name().to_string()),
            props: preloaded.get(i + 1).cloned().unwrap_or_default(),
        });
    }

    let page_context = PageContext {
        host: req.host.clone(),
        path: req.path.clone(),
        query: req.query.clone(),
        params,
        error: error.clone(),
    };

    RenderProps {
        page: page_context,
        preloading: None,
        session,
        segments: layout_segments,
        status,
        error,
        levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Component, RoutePart};
    use amphora_router::RoutePattern;
    use std::sync::Arc;

    struct Stub(&'static str);

    impl Component for Stub {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn part(name: &'static str) -> RoutePart {
        RoutePart::new(Arc::new(Stub(name))).with_name(name)
    }

    fn props(key: &str, value: &str) -> Props {
        let mut p = Props::new();
        p.insert(key.to_string(), serde_json::Value::String(value.to_string()));
        p
    }

    // === Level Assembly Tests ===

    #[test]
    fn test_levels_root_then_parts() {
        let page = Page::new(RoutePattern::parse("/blog/:slug"))
            .with_part(part("blog-layout"))
            .with_part(part("blog-post"));
        let req = PageRequest::new("example.com", "/blog/hello-world");

        let preloaded = vec![Props::new(), Props::new(), props("title", "Hello")];
        let rendered = build_render_props(
            &req,
            &page,
            RouteParams::new(),
            Session::Null,
            &preloaded,
            200,
            None,
        );

        assert_eq!(rendered.levels.len(), 3);
        assert!(rendered.levels[0].component.is_none());
        assert_eq!(rendered.levels[1].component.as_deref(), Some("blog-layout"));
        assert_eq!(rendered.levels[1].segment.as_deref(), Some("blog"));
        assert_eq!(rendered.levels[2].component.as_deref(), Some("blog-post"));
        assert_eq!(rendered.levels[2].segment.as_deref(), Some("hello-world"));
        assert_eq!(
            rendered.levels[2].props.get("title"),
            Some(&serde_json::Value::String("Hello".to_string()))
        );
    }

    #[test]
    fn test_empty_part_consumes_no_level() {
        let page = Page::new(RoutePattern::parse("/blog/:slug"))
            .with_empty_part()
            .with_part(part("blog-post"));
        let req = PageRequest::new("example.com", "/blog/hello-world");

        let rendered = build_render_props(
            &req,
            &page,
            RouteParams::new(),
            Session::Null,
            &[],
            200,
            None,
        );

        // root level + one component level; the empty part only shifted segments
        assert_eq!(rendered.levels.len(), 2);
        assert_eq!(rendered.levels[1].component.as_deref(), Some("blog-post"));
    }

    #[test]
    fn test_missing_preload_slot_falls_back_to_empty_props() {
        let page = Page::new(RoutePattern::parse("/about")).with_part(part("about"));
        let req = PageRequest::new("example.com", "/about");

        let rendered = build_render_props(
            &req,
            &page,
            RouteParams::new(),
            Session::Null,
            &[],
            200,
            None,
        );

        assert!(rendered.levels[0].props.is_empty());
        assert!(rendered.levels[1].props.is_empty());
    }

    // === Layout Segment Tests ===

    #[test]
    fn test_layout_segments_follow_path() {
        let page = Page::new(RoutePattern::parse("/blog/:slug"))
            .with_part(part("blog-layout"))
            .with_part(part("blog-post"));
        let req = PageRequest::new("example.com", "/blog/hello-world");

        let rendered = build_render_props(
            &req,
            &page,
            RouteParams::new(),
            Session::Null,
            &[],
            200,
            None,
        );

        assert_eq!(
            rendered.segments,
            vec![Some("blog".to_string()), Some("hello-world".to_string())]
        );
    }

    // === Error Context Tests ===

    #[test]
    fn test_error_carried_into_page_context() {
        let page = Page::error_page(Arc::new(Stub("Error")));
        let req = PageRequest::new("example.com", "/secret");
        let error = PageError::preload("Forbidden");

        let rendered = build_render_props(
            &req,
            &page,
            RouteParams::new(),
            Session::Null,
            &[],
            403,
            Some(error.clone()),
        );

        assert_eq!(rendered.status, 403);
        assert_eq!(rendered.page.error, Some(error.clone()));
        assert_eq!(rendered.error, Some(error));
        assert!(rendered.preloading.is_none());
    }
}

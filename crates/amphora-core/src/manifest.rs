//! Route manifest: pages, route parts and components.

use std::fmt;
use std::sync::Arc;

use amphora_router::{PatternMatch, RoutePattern, RouteParams};
use async_trait::async_trait;

use crate::preload::{PreloadContext, PreloadFailure, PreloadRequest, Props};
use crate::session::Session;

/// A server-renderable component.
///
/// The component tree itself is rendered by the injected
/// [`Renderer`](crate::render::Renderer); the pipeline only needs the
/// component's name (the reference handed to the renderer) and its
/// optional preload. The default preload yields empty props.
#[async_trait]
pub trait Component: Send + Sync {
    /// Component reference used by the renderer.
    fn name(&self) -> &str;

    /// Route-scoped data loading, run before rendering.
    async fn preload(
        &self,
        ctx: &PreloadContext,
        req: &PreloadRequest,
        session: &Session,
    ) -> Result<Props, PreloadFailure> {
        let _ = (ctx, req, session);
        Ok(Props::new())
    }
}

/// Extracts named parameters from a pattern match.
pub type ParamsFn = Arc<dyn Fn(&PatternMatch) -> RouteParams + Send + Sync>;

/// One hierarchical segment of a matched route.
#[derive(Clone)]
pub struct RoutePart {
    /// Segment name, used to key per-part asset lists.
    pub name: Option<String>,
    /// Parameter extractor applied to the pattern match.
    pub params: Option<ParamsFn>,
    /// The component rendered at this level.
    pub component: Arc<dyn Component>,
    /// Source file identifier, used to look up asset dependencies.
    pub file: Option<String>,
}

impl RoutePart {
    /// Create a part for a component.
    pub fn new(component: Arc<dyn Component>) -> Self {
        Self {
            name: None,
            params: None,
            component,
            file: None,
        }
    }

    /// Set the segment name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the source file identifier.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the parameter extractor.
    pub fn with_params(
        mut self,
        params: impl Fn(&PatternMatch) -> RouteParams + Send + Sync + 'static,
    ) -> Self {
        self.params = Some(Arc::new(params));
        self
    }
}

impl fmt::Debug for RoutePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePart")
            .field("name", &self.name)
            .field("component", &self.component.name())
            .field("file", &self.file)
            .finish()
    }
}

/// An ordered sequence of route parts plus the pattern that matches it.
///
/// A `None` pattern signals the error page; a `None` part is a layout
/// segment with no component of its own.
#[derive(Debug, Clone)]
pub struct Page {
    pub pattern: Option<RoutePattern>,
    pub parts: Vec<Option<RoutePart>>,
}

impl Page {
    /// Create a page for a route pattern.
    pub fn new(pattern: RoutePattern) -> Self {
        Self {
            pattern: Some(pattern),
            parts: Vec::new(),
        }
    }

    /// The synthetic single-part page used for error rendering.
    pub fn error_page(component: Arc<dyn Component>) -> Self {
        Self {
            pattern: None,
            parts: vec![Some(RoutePart::new(component))],
        }
    }

    /// Append a part.
    pub fn with_part(mut self, part: RoutePart) -> Self {
        self.parts.push(Some(part));
        self
    }

    /// Append a layout segment without its own component.
    pub fn with_empty_part(mut self) -> Self {
        self.parts.push(None);
        self
    }

    /// Whether this is the error page.
    pub fn is_error(&self) -> bool {
        self.pattern.is_none()
    }

    /// The deepest part that has a component.
    pub fn last_part(&self) -> Option<&RoutePart> {
        self.parts.iter().rev().flatten().next()
    }
}

/// The route manifest: ordered pages plus the root and error components.
#[derive(Clone)]
pub struct Manifest {
    pages: Vec<Page>,
    root: Arc<dyn Component>,
    error: Arc<dyn Component>,
}

impl Manifest {
    /// Create a manifest with the given root and error components.
    pub fn new(root: Arc<dyn Component>, error: Arc<dyn Component>) -> Self {
        Self {
            pages: Vec::new(),
            root,
            error,
        }
    }

    /// Append a page. Order matters: the router scans in insertion order.
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// The root component.
    pub fn root(&self) -> &Arc<dyn Component> {
        &self.root
    }

    /// The designated error component.
    pub fn error(&self) -> &Arc<dyn Component> {
        &self.error
    }

    /// All pages in scan order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Find the first page whose pattern matches the path.
    ///
    /// Pure and side-effect-free; safe to call per request without
    /// synchronization.
    pub fn find_page(&self, path: &str) -> Option<&Page> {
        self.pages
            .iter()
            .find(|page| page.pattern.as_ref().is_some_and(|p| p.test(path)))
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("pages", &self.pages)
            .field("root", &self.root.name())
            .field("error", &self.error.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub(&'static str);

    impl Component for Stub {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn stub(name: &'static str) -> Arc<dyn Component> {
        Arc::new(Stub(name))
    }

    fn manifest() -> Manifest {
        Manifest::new(stub("Root"), stub("Error"))
    }

    // === Page Tests ===

    #[test]
    fn test_error_page_shape() {
        let page = Page::error_page(stub("Error"));
        assert!(page.is_error());
        assert_eq!(page.parts.len(), 1);
        assert_eq!(page.last_part().unwrap().component.name(), "Error");
    }

    #[test]
    fn test_last_part_skips_empty() {
        let page = Page::new(RoutePattern::parse("/blog/:slug"))
            .with_part(RoutePart::new(stub("BlogLayout")))
            .with_empty_part();
        assert_eq!(page.last_part().unwrap().component.name(), "BlogLayout");
    }

    // === Router Tests ===

    #[test]
    fn test_find_page_first_match_wins() {
        let m = manifest()
            .with_page(Page::new(RoutePattern::parse("/blog/:slug")).with_part(
                RoutePart::new(stub("BlogPost")),
            ))
            .with_page(
                Page::new(RoutePattern::parse("/blog/archive"))
                    .with_part(RoutePart::new(stub("Archive"))),
            );

        // /blog/archive also matches /blog/:slug, which was registered first
        let page = m.find_page("/blog/archive").unwrap();
        assert_eq!(page.last_part().unwrap().component.name(), "BlogPost");
    }

    #[test]
    fn test_find_page_no_match() {
        let m = manifest().with_page(
            Page::new(RoutePattern::parse("/about")).with_part(RoutePart::new(stub("About"))),
        );
        assert!(m.find_page("/missing").is_none());
    }

    #[test]
    fn test_route_part_params_extractor() {
        let part = RoutePart::new(stub("BlogPost")).with_params(|m| {
            let mut params = RouteParams::new();
            params.insert("slug".to_string(), m.get(0).unwrap_or_default().to_string());
            params
        });

        let pattern = RoutePattern::parse("/blog/:slug");
        let captured = pattern.exec("/blog/hello-world").unwrap();
        let params = (part.params.as_ref().unwrap())(&captured);
        assert_eq!(params.get("slug").map(String::as_str), Some("hello-world"));
    }
}

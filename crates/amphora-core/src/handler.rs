//! The page handler: routing, preload, redirect/error reconciliation
//! and final document assembly for one request.

use std::sync::Arc;

use url::Url;

use amphora_data::{FetchError, FetchResponse, OutboundRequest, Transport};
use amphora_router::RouteParams;
use async_trait::async_trait;

use crate::assets::preload_link_header;
use crate::build_info::{BuildInfo, BuildInfoSource};
use crate::config::AmphoraConfig;
use crate::error::AmphoraError;
use crate::http::{PageRequest, ResponseParts};
use crate::manifest::{Manifest, Page};
use crate::preload::{run_preloads, PreloadContext};
use crate::proxy::FetchProxy;
use crate::render::{build_render_props, PageError, Renderer};
use crate::session::{NoSession, SessionGetter};
use crate::sourcemaps::{DiskSources, Sourcemaps};
use crate::template::{escape_html, render_document, TemplateSource};

/// Where a render attempt leaves the request.
///
/// `Retry` re-enters the pipeline once, on the error page. The error
/// render itself can only finish or bail; it never retries, so error
/// handling cannot recurse.
enum PageFlow {
    Done,
    Retry { status: u16, error: PageError },
    Bail(String),
}

/// The server-side page-rendering pipeline.
///
/// Owns the route manifest and the injected collaborators; one instance
/// serves all requests. Build with [`PageHandler::builder`].
pub struct PageHandler {
    manifest: Manifest,
    config: AmphoraConfig,
    build_info: BuildInfoSource,
    template: TemplateSource,
    session_getter: Arc<dyn SessionGetter>,
    renderer: Arc<dyn Renderer>,
    transport: Arc<dyn Transport>,
    sources: Arc<dyn Sourcemaps>,
}

impl PageHandler {
    /// Start building a handler.
    pub fn builder(manifest: Manifest, config: AmphoraConfig) -> PageHandlerBuilder {
        PageHandlerBuilder {
            manifest,
            config,
            build_info: None,
            template: None,
            session_getter: Arc::new(NoSession),
            renderer: None,
            transport: Arc::new(NoTransport),
            sources: Arc::new(DiskSources),
        }
    }

    /// Handle one request, producing the full response.
    pub async fn handle(&self, req: &PageRequest) -> ResponseParts {
        let mut res = ResponseParts::new();
        for cookie in &req.staged_cookies {
            res.append_header("set-cookie", cookie);
        }

        let flow = match self.manifest.find_page(&req.path) {
            Some(page) => {
                tracing::debug!(path = %req.path, "route matched");
                self.render_page(page, req, &mut res, 200, None).await
            }
            None => {
                tracing::debug!(path = %req.path, "no route matched");
                PageFlow::Retry {
                    status: 404,
                    error: PageError::not_found(),
                }
            }
        };

        match flow {
            PageFlow::Done => {}
            PageFlow::Bail(cause) => self.bail(&mut res, &cause),
            PageFlow::Retry { status, error } => {
                let error_page = Page::error_page(Arc::clone(self.manifest.error()));
                match self
                    .render_page(&error_page, req, &mut res, status, Some(error))
                    .await
                {
                    PageFlow::Done => {}
                    PageFlow::Bail(cause) => self.bail(&mut res, &cause),
                    // the error render never asks for another attempt
                    PageFlow::Retry { error, .. } => self.bail(&mut res, &error.message),
                }
            }
        }

        res
    }

    /// One render attempt. `error` is set when rendering the error page.
    async fn render_page(
        &self,
        page: &Page,
        req: &PageRequest,
        res: &mut ResponseParts,
        status: u16,
        error: Option<PageError>,
    ) -> PageFlow {
        let error_render = error.is_some();

        let build = match self.build_info.load() {
            Ok(build) => build,
            Err(e) => return PageFlow::Bail(e.to_string()),
        };

        let base_path = self.base_path(req);
        res.set_header("content-type", "text/html");
        res.set_header(
            "link",
            preload_link_header(&build, page, base_path, error_render),
        );

        let session = match self.session_getter.session(req, res).await {
            Ok(session) => session,
            Err(e) => return PageFlow::Bail(AmphoraError::Session(e.to_string()).to_string()),
        };

        let staged: Vec<String> = res
            .header_values("set-cookie")
            .into_iter()
            .map(|v| v.to_string())
            .collect();
        let proxy = match FetchProxy::new(
            req,
            base_path,
            self.config.port,
            staged,
            Arc::clone(&self.transport),
        ) {
            Ok(proxy) => proxy,
            Err(e) => return PageFlow::Bail(e.to_string()),
        };
        let ctx = PreloadContext::new(proxy);

        let matched = if error_render {
            None
        } else {
            page.pattern.as_ref().and_then(|p| p.exec(&req.path))
        };

        let mut pending_error = None;
        let (preloaded, params) = match run_preloads(
            self.manifest.root(),
            page,
            matched.as_ref(),
            &ctx,
            req,
            &session,
        )
        .await
        {
            Ok(run) => (run.preloaded, run.params),
            Err(failure) => {
                if error_render {
                    return PageFlow::Bail(failure.message);
                }
                let mut error = PageError::preload(failure.message);
                error.stack = failure.stack;
                pending_error = Some((500, error));
                (Vec::new(), RouteParams::new())
            }
        };

        if ctx.redirect_conflict() {
            return PageFlow::Bail(AmphoraError::ConflictingRedirects.to_string());
        }

        if let Some(redirect) = ctx.recorded_redirect() {
            let location = resolve_location(base_path, &redirect.location);
            tracing::debug!(status = redirect.status, %location, "preload redirect");
            res.status = redirect.status;
            res.set_header("location", location);
            res.body.clear();
            return PageFlow::Done;
        }

        // a preload exception overrides an error() recorded earlier
        let pending = pending_error.or_else(|| {
            ctx.recorded_error()
                .map(|e| (e.status, PageError::preload(e.message)))
        });
        if let Some((status, error)) = pending {
            if error_render {
                return PageFlow::Bail(error.message);
            }
            return PageFlow::Retry { status, error };
        }

        let error = error.map(|mut e| {
            if let Some(stack) = e.stack.take() {
                e.stack = Some(self.sources.translate(&stack));
            }
            e
        });

        let props = build_render_props(req, page, params, session, &preloaded, status, error);

        let output = match self.renderer.render(&props) {
            Ok(output) => output,
            Err(e) => {
                if error_render {
                    return PageFlow::Bail(e.to_string());
                }
                return PageFlow::Retry {
                    status: 500,
                    error: PageError::new("RenderError", e.to_string()),
                };
            }
        };

        let template = match self.template.load() {
            Ok(template) => template,
            Err(e) => {
                if error_render {
                    return PageFlow::Bail(e.to_string());
                }
                return PageFlow::Retry {
                    status: 500,
                    error: PageError::new("TemplateError", e.to_string()),
                };
            }
        };

        let nonce = req.nonce.clone().unwrap_or_default();
        let nonce_attr = if nonce.is_empty() {
            String::new()
        } else {
            format!(" nonce=\"{}\"", nonce)
        };

        // the style tag is emitted even when empty so the document shape
        // is stable across pages
        let styles = self.assemble_styles(&build, page, &output.css);
        let styles_tag = format!("<style{}>{}</style>", nonce_attr, styles);

        let body = render_document(
            &template,
            base_path,
            &output.html,
            &output.head,
            &styles_tag,
            &nonce,
        );

        res.status = status;
        res.body = body.into_bytes();
        PageFlow::Done
    }

    /// Assemble the document styles: the precomputed build artifacts
    /// when the build declares a main CSS bundle, the renderer's
    /// inlined CSS otherwise.
    fn assemble_styles(&self, build: &BuildInfo, page: &Page, inline_css: &str) -> String {
        let Some(main_css) = build.main_css() else {
            return inline_css.to_string();
        };

        let mut styles = String::new();
        if let Some(global) = self.sources.file_contents(&self.config.global_css_path()) {
            styles.push_str(&global);
        }
        if let Some(main) = self
            .sources
            .file_contents(&self.config.client_asset_path(main_css))
        {
            styles.push_str(&main);
        }
        for part in page.parts.iter().flatten() {
            let Some(file) = part.file.as_deref() else {
                continue;
            };
            let Some(deps) = build.dependencies_of(file) else {
                continue;
            };
            for chunk in deps.iter().filter(|d| d.ends_with(".css")) {
                if let Some(contents) = self
                    .sources
                    .file_contents(&self.config.client_asset_path(chunk))
                {
                    styles.push_str(&contents);
                }
            }
        }
        styles
    }

    /// Terminal failure: minimal preformatted body, no error page.
    fn bail(&self, res: &mut ResponseParts, cause: &str) {
        tracing::error!(cause, "request bailed");
        let message = if self.config.dev {
            escape_html(cause)
        } else {
            "Internal server error".to_string()
        };
        res.status = 500;
        res.set_header("content-type", "text/html");
        res.body = format!("<pre>{}</pre>", message).into_bytes();
    }

    fn base_path<'a>(&'a self, req: &'a PageRequest) -> &'a str {
        req.base_path.as_deref().unwrap_or(&self.config.base_path)
    }
}

/// Resolve a recorded redirect location against the mount prefix.
fn resolve_location(base_path: &str, location: &str) -> String {
    if Url::parse(location).is_ok() {
        // already absolute
        location.to_string()
    } else {
        format!("{}/{}", base_path.trim_end_matches('/'), location)
    }
}

/// Placeholder transport for apps whose preloads never fetch.
struct NoTransport;

#[async_trait]
impl Transport for NoTransport {
    async fn send(&self, request: OutboundRequest) -> Result<FetchResponse, FetchError> {
        Err(FetchError::RequestError(format!(
            "no transport configured (fetching {})",
            request.url
        )))
    }
}

/// Builder for [`PageHandler`].
pub struct PageHandlerBuilder {
    manifest: Manifest,
    config: AmphoraConfig,
    build_info: Option<BuildInfoSource>,
    template: Option<TemplateSource>,
    session_getter: Arc<dyn SessionGetter>,
    renderer: Option<Arc<dyn Renderer>>,
    transport: Arc<dyn Transport>,
    sources: Arc<dyn Sourcemaps>,
}

impl PageHandlerBuilder {
    /// Set the component-tree renderer (required).
    pub fn renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Set the outbound fetch transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Set the session getter. Defaults to no sessions.
    pub fn session_getter(mut self, session_getter: Arc<dyn SessionGetter>) -> Self {
        self.session_getter = session_getter;
        self
    }

    /// Set the sourcemap/file access collaborator. Defaults to plain
    /// disk reads without stack translation.
    pub fn sourcemaps(mut self, sources: Arc<dyn Sourcemaps>) -> Self {
        self.sources = sources;
        self
    }

    /// Use fixed build metadata instead of reading `build.json`.
    pub fn build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = Some(BuildInfoSource::Fixed(build_info));
        self
    }

    /// Use a fixed base template instead of reading `template.html`.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(TemplateSource::Fixed(template.into()));
        self
    }

    /// Build the handler, reading build metadata and the template from
    /// the configured directories unless fixed values were supplied.
    pub fn build(self) -> Result<PageHandler, AmphoraError> {
        let renderer = self
            .renderer
            .ok_or_else(|| AmphoraError::Config("no renderer configured".to_string()))?;
        let build_info = match self.build_info {
            Some(source) => source,
            None => BuildInfoSource::from_config(&self.config)?,
        };
        let template = match self.template {
            Some(source) => source,
            None => TemplateSource::from_config(&self.config)?,
        };

        Ok(PageHandler {
            manifest: self.manifest,
            config: self.config,
            build_info,
            template,
            session_getter: self.session_getter,
            renderer,
            transport: self.transport,
            sources: self.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Location Resolution Tests ===

    #[test]
    fn test_resolve_location_relative() {
        assert_eq!(resolve_location("", "login"), "/login");
        assert_eq!(resolve_location("/amp", "login"), "/amp/login");
    }

    #[test]
    fn test_resolve_location_absolute_untouched() {
        assert_eq!(
            resolve_location("/amp", "https://example.com/next"),
            "https://example.com/next"
        );
    }
}

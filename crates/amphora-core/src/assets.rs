//! Preload-hint (`Link` header) assembly.

use std::collections::HashSet;

use crate::build_info::BuildInfo;
use crate::manifest::Page;

/// Compute the `Link` header advertising the client assets to preload.
///
/// Starts from the main JS and CSS entries, then adds route chunks: for
/// module-graph-aware builds the dependencies of the deepest part's
/// source file, otherwise (and only outside error renders) the per-part
/// asset lists keyed by part name. Duplicates keep their first
/// occurrence; sourcemap files never preload.
pub fn preload_link_header(
    build: &BuildInfo,
    page: &Page,
    base_path: &str,
    error_render: bool,
) -> String {
    let mut files: Vec<String> = Vec::new();

    if let Some(main) = build.assets.get("main") {
        files.extend(main.files().iter().map(|f| f.to_string()));
    }
    if let Some(css_main) = build.css.as_ref().and_then(|c| c.main.as_ref()) {
        files.extend(css_main.files().iter().map(|f| f.to_string()));
    }

    let module_graph = build.bundler.tracks_module_graph();
    if module_graph {
        if let Some(file) = page.last_part().and_then(|p| p.file.as_deref()) {
            if let Some(deps) = build.dependencies_of(file) {
                files.extend(deps.iter().cloned());
            }
        }
    } else if !error_render {
        for part in page.parts.iter().flatten() {
            if let Some(assets) = part.name.as_ref().and_then(|n| build.assets.get(n)) {
                files.extend(assets.files().iter().map(|f| f.to_string()));
            }
        }
    }

    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter(|file| !file.is_empty() && !file.ends_with(".map"))
        .filter(|file| seen.insert(file.clone()))
        .map(|file| {
            let as_type = if file.ends_with(".css") {
                "style"
            } else {
                "script"
            };
            let rel = if module_graph && as_type == "script" {
                "modulepreload"
            } else {
                "preload"
            };
            format!(
                "<{}/client/{}>;rel=\"{}\";as=\"{}\"",
                base_path, file, rel, as_type
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

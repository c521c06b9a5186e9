//! Sourcemap translation and raw file access.
//!
//! The mechanism that maps a minified stack trace back to original
//! source locations also owns raw file reads (CSS bundles, the global
//! stylesheet). The pipeline consumes both through this trait and never
//! looks inside.

use std::path::Path;

/// Black-box source access: stack translation plus raw file contents.
pub trait Sourcemaps: Send + Sync {
    /// Translate a raw stack trace into source-mapped form.
    fn translate(&self, stack: &str) -> String;

    /// Read a file's contents, or `None` when unavailable.
    fn file_contents(&self, path: &Path) -> Option<String>;
}

/// Plain disk-backed source access with no sourcemap translation.
pub struct DiskSources;

impl Sourcemaps for DiskSources {
    fn translate(&self, stack: &str) -> String {
        stack.to_string()
    }

    fn file_contents(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

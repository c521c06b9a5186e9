//! Amphora pipeline configuration.

use std::path::{Path, PathBuf};

/// Configuration for the Amphora page-rendering pipeline.
///
/// In dev mode the build metadata and the base template are re-read on
/// every request so edits show up without a restart; in production both
/// are read once when the handler is built.
#[derive(Debug, Clone)]
pub struct AmphoraConfig {
    /// Development mode.
    pub dev: bool,
    /// Port the server listens on, used to compute the server's own
    /// origin for credential forwarding.
    pub port: u16,
    /// Path prefix the handler is mounted under (e.g. `/amp`), empty
    /// when mounted at the root.
    pub base_path: String,
    /// Directory holding build artifacts (`build.json`, `client/`).
    pub build_dir: PathBuf,
    /// Source directory; dev mode reads the template from here.
    pub src_dir: PathBuf,
    /// Static assets directory holding the global stylesheet.
    pub static_dir: PathBuf,
}

impl Default for AmphoraConfig {
    fn default() -> Self {
        Self {
            dev: false,
            port: 3000,
            base_path: String::new(),
            build_dir: PathBuf::from("__amphora__"),
            src_dir: PathBuf::from("src"),
            static_dir: PathBuf::from("static"),
        }
    }
}

impl AmphoraConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable dev mode.
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the mount path prefix. Trailing slashes are stripped so the
    /// prefix can be joined with request paths directly.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let base_path = base_path.into();
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    /// Set the build artifacts directory.
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    /// Set the source directory.
    pub fn with_src_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.src_dir = dir.into();
        self
    }

    /// Set the static assets directory.
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    /// Path to the build metadata file.
    pub fn build_info_path(&self) -> PathBuf {
        self.build_dir.join("build.json")
    }

    /// Path to a client asset inside the build directory.
    pub fn client_asset_path(&self, file: &str) -> PathBuf {
        self.build_dir.join("client").join(file)
    }

    /// Path to the global stylesheet.
    pub fn global_css_path(&self) -> PathBuf {
        self.static_dir.join("global.css")
    }

    /// Path to the base template for the given mode.
    pub fn template_path(&self) -> PathBuf {
        let dir: &Path = if self.dev {
            &self.src_dir
        } else {
            &self.build_dir
        };
        dir.join("template.html")
    }
}

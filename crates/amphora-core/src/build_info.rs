//! Build metadata produced by the client bundler.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::AmphoraConfig;
use crate::error::AmphoraError;

/// One-or-many asset files behind a logical name.
///
/// Bundlers emit either a single file or a list for the same entry, so
/// both shapes deserialize into the same type.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AssetList {
    One(String),
    Many(Vec<String>),
}

impl AssetList {
    /// The files in declaration order.
    pub fn files(&self) -> Vec<&str> {
        match self {
            AssetList::One(file) => vec![file.as_str()],
            AssetList::Many(files) => files.iter().map(|f| f.as_str()).collect(),
        }
    }

    /// The first file, if any.
    pub fn first(&self) -> Option<&str> {
        self.files().first().copied()
    }
}

/// Which bundler produced the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bundler {
    Rollup,
    Webpack,
}

impl Bundler {
    /// Whether the bundler emits a per-file dependency graph. Graph-aware
    /// builds preload route chunks from `dependencies` and use module
    /// preloading for scripts; the others fall back to per-part asset
    /// lists.
    pub fn tracks_module_graph(&self) -> bool {
        matches!(self, Bundler::Rollup)
    }
}

/// Main CSS entries.
#[derive(Debug, Clone, Deserialize)]
pub struct CssAssets {
    #[serde(default)]
    pub main: Option<AssetList>,
}

/// Parsed `build.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    /// Logical asset name to file(s).
    pub assets: HashMap<String, AssetList>,
    /// Main CSS bundle, when the build produced one.
    #[serde(default)]
    pub css: Option<CssAssets>,
    /// Which bundler produced this build.
    pub bundler: Bundler,
    /// Source file to dependent chunk files.
    #[serde(default)]
    pub dependencies: HashMap<String, Vec<String>>,
}

impl BuildInfo {
    /// Parse build metadata from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, AmphoraError> {
        serde_json::from_str(json).map_err(|e| AmphoraError::BuildInfo(e.to_string()))
    }

    /// The main CSS bundle's first file, if declared.
    pub fn main_css(&self) -> Option<&str> {
        self.css.as_ref()?.main.as_ref()?.first()
    }

    /// Dependency chunks of a source file.
    pub fn dependencies_of(&self, file: &str) -> Option<&[String]> {
        self.dependencies.get(file).map(|deps| deps.as_slice())
    }
}

/// Where build metadata comes from.
///
/// Dev mode re-reads `build.json` on every request; production parses it
/// once at handler construction.
#[derive(Debug, Clone)]
pub enum BuildInfoSource {
    Fixed(BuildInfo),
    File(PathBuf),
}

impl BuildInfoSource {
    /// Source following the configured mode.
    pub fn from_config(config: &AmphoraConfig) -> Result<Self, AmphoraError> {
        let path = config.build_info_path();
        if config.dev {
            Ok(BuildInfoSource::File(path))
        } else {
            Ok(BuildInfoSource::Fixed(read_build_info(&path)?))
        }
    }

    /// Load the current build metadata.
    pub fn load(&self) -> Result<BuildInfo, AmphoraError> {
        match self {
            BuildInfoSource::Fixed(info) => Ok(info.clone()),
            BuildInfoSource::File(path) => read_build_info(path),
        }
    }
}

fn read_build_info(path: &std::path::Path) -> Result<BuildInfo, AmphoraError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| AmphoraError::BuildInfo(format!("{}: {}", path.display(), e)))?;
    BuildInfo::from_json(&json)
}

//! Configuration loading from `packlet.toml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "packlet.toml";

/// Raw on-disk configuration. `entry` and `output` stay optional here
/// because either may come from the command line instead.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Entry module, relative to the invocation directory.
    pub entry: Option<PathBuf>,
    /// Output artifact path, relative to the invocation directory.
    pub output: Option<PathBuf>,
    /// One asset per canonical path (true) or one per import edge (false).
    pub dedupe_modules: bool,
    /// Whether the emitted runtime caches executed modules.
    pub cache_modules: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: None,
            output: None,
            dedupe_modules: true,
            cache_modules: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Load `packlet.toml` from `dir` if present; defaults otherwise, so a
    /// fully flag-driven invocation needs no file at all.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge command-line overrides and check that both required paths are
    /// present, yielding the effective configuration for one build.
    pub fn into_bundle_config(
        self,
        entry_override: Option<PathBuf>,
        output_override: Option<PathBuf>,
    ) -> Result<BundleConfig> {
        let Some(entry) = entry_override.or(self.entry) else {
            bail!("configuration is missing 'entry': set it in {CONFIG_FILE_NAME} or pass --entry");
        };
        let Some(output) = output_override.or(self.output) else {
            bail!(
                "configuration is missing 'output': set it in {CONFIG_FILE_NAME} or pass --output"
            );
        };
        Ok(BundleConfig {
            entry,
            output,
            dedupe_modules: self.dedupe_modules,
            cache_modules: self.cache_modules,
        })
    }
}

/// Effective configuration for one build, with required fields resolved.
#[derive(Debug, Clone)]
pub struct BundleConfig {
    pub entry: PathBuf,
    pub output: PathBuf,
    pub dedupe_modules: bool,
    pub cache_modules: bool,
}

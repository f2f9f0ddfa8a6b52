//! Asset model and breadth-first dependency graph construction.
//!
//! Starting from the entry module, every file reachable through static
//! imports is read, parsed, and downleveled into an [`Asset`]. Ids are
//! assigned in strict discovery order, so the entry asset is always id 0
//! and the bundle runtime can hard-code its bootstrap.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, trace};
use oxc_allocator::Allocator;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{code_generator, parser, resolver, transform};

/// Identity of one asset within a single build. Contiguous from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AssetId(u32);

impl AssetId {
    /// The entry module. The bundle runtime starts execution here.
    pub const ENTRY: Self = Self(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One processed source file.
///
/// Immutable after creation except for `mapping`, which is filled in as the
/// asset's import edges are resolved.
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: AssetId,
    /// Absolute, normalized path; the canonical key for this file.
    pub filename: PathBuf,
    /// Literal import specifiers in source order, duplicates as written.
    pub dependencies: Vec<String>,
    /// Downleveled source text. Empty string means an empty module body.
    pub code: String,
    /// Distinct specifier -> id of the asset it resolves to.
    pub mapping: IndexMap<String, AssetId>,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphOptions {
    /// When true (the default), a file reached through several import edges
    /// becomes one asset, found through a path lookup table. When false,
    /// every import edge creates a fresh asset with a fresh id, matching
    /// bundlers that reprocess a path per edge; a specifier repeated within
    /// one file then collapses to the last-created id.
    pub dedupe_modules: bool,
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self {
            dedupe_modules: true,
        }
    }
}

/// Build the dependency graph rooted at `entry`.
///
/// Returns assets in breadth-first discovery order; the entry asset is
/// first and ids are contiguous over the result. Any read, parse, or
/// resolution failure aborts the whole build.
pub fn build_graph(entry: &Path, options: GraphOptions) -> Result<Vec<Asset>> {
    GraphBuilder::new(options).build(entry)
}

struct GraphBuilder {
    options: GraphOptions,
    /// Owned by one build invocation; never shared across builds.
    next_id: u32,
    path_to_id: FxHashMap<PathBuf, AssetId>,
}

impl GraphBuilder {
    fn new(options: GraphOptions) -> Self {
        Self {
            options,
            next_id: 0,
            path_to_id: FxHashMap::default(),
        }
    }

    fn build(&mut self, entry: &Path) -> Result<Vec<Asset>> {
        // The result sequence doubles as the FIFO work queue: `cursor`
        // walks it while newly discovered assets are appended behind.
        let mut assets = vec![self.create_asset(entry)?];
        let mut cursor = 0;

        while cursor < assets.len() {
            let filename = assets[cursor].filename.clone();
            let dirname = filename
                .parent()
                .with_context(|| format!("{} has no containing directory", filename.display()))?
                .to_path_buf();

            let dependencies = assets[cursor].dependencies.clone();
            let mut mapping = IndexMap::new();
            for specifier in dependencies {
                let resolved = resolver::resolve(&specifier, &dirname)
                    .with_context(|| format!("in {}", filename.display()))?;

                let existing = if self.options.dedupe_modules {
                    self.path_to_id.get(&resolved).copied()
                } else {
                    None
                };
                let child_id = match existing {
                    Some(id) => {
                        trace!("{} -> existing asset {id}", resolved.display());
                        id
                    }
                    None => {
                        let child = self.create_asset(&resolved)?;
                        let id = child.id;
                        assets.push(child);
                        id
                    }
                };
                // A repeated specifier overwrites in place, so one entry
                // remains and insertion order is preserved.
                mapping.insert(specifier, child_id);
            }

            assets[cursor].mapping = mapping;
            cursor += 1;
        }

        debug!("dependency graph complete: {} assets", assets.len());
        Ok(assets)
    }

    fn create_asset(&mut self, path: &Path) -> Result<Asset> {
        debug!("processing {}", path.display());
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;

        let allocator = Allocator::default();
        let program = parser::parse(&allocator, &source, path)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let dependencies = transform::collect_dependencies(&program);
        trace!("{} imports {dependencies:?}", path.display());
        let code = transform::downlevel(&source, &program);
        code_generator::ensure_embeddable(path, &code)
            .with_context(|| format!("failed to transform {}", path.display()))?;

        let id = AssetId::new(self.next_id);
        self.next_id += 1;
        if self.options.dedupe_modules {
            self.path_to_id.insert(path.to_path_buf(), id);
        }

        Ok(Asset {
            id,
            filename: path.to_path_buf(),
            dependencies,
            code,
            mapping: IndexMap::new(),
        })
    }
}

//! End-to-end pipeline: configuration -> graph -> bundle -> output file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    code_generator,
    config::BundleConfig,
    graph::{self, GraphOptions},
    resolver,
};

/// Run one bundle build. Returns the absolute path of the written artifact.
///
/// The artifact string is fully constructed before anything touches the
/// filesystem, so a failed build never leaves a partial output file behind.
pub fn run(config: &BundleConfig, invocation_dir: &Path) -> Result<PathBuf> {
    let entry = resolver::absolutize(&config.entry, invocation_dir);
    let output = resolver::absolutize(&config.output, invocation_dir);
    debug!("entry: {}", entry.display());
    debug!("output: {}", output.display());

    let options = GraphOptions {
        dedupe_modules: config.dedupe_modules,
    };
    let assets = graph::build_graph(&entry, options)?;
    info!("bundling {} modules from {}", assets.len(), entry.display());

    let bundle = code_generator::generate_bundle(&assets, config.cache_modules);

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    fs::write(&output, &bundle)
        .with_context(|| format!("failed to write bundle to {}", output.display()))?;
    info!("wrote {} bytes to {}", bundle.len(), output.display());

    Ok(output)
}

//! Batch loading of Touchstone files
//!
//! Every file is parsed on its own; a failing file never affects the others,
//! and outcomes come back in input order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::network::Network;
use crate::touchstone::parser::{port_count_from_path, read_file_with};
use crate::touchstone::{ParserOptions, TouchstoneError};

/// Batch loader configuration
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Below this many files the batch is parsed on the calling thread
    pub min_files_for_parallel: usize,
    /// Options applied to every file
    pub parser: ParserOptions,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            min_files_for_parallel: 2,
            parser: ParserOptions::default(),
        }
    }
}

impl LoaderConfig {
    pub fn with_min_files_for_parallel(mut self, n: usize) -> Self {
        self.min_files_for_parallel = n;
        self
    }

    pub fn with_parser(mut self, parser: ParserOptions) -> Self {
        self.parser = parser;
        self
    }

    /// Always parse on the calling thread
    pub fn sequential(self) -> Self {
        self.with_min_files_for_parallel(usize::MAX)
    }
}

/// Result of loading one file
#[derive(Debug)]
pub struct LoadOutcome {
    pub path: PathBuf,
    pub result: Result<Arc<Network>, TouchstoneError>,
}

impl LoadOutcome {
    fn load(path: &Path, options: &ParserOptions) -> Self {
        let result = read_file_with(path, options).map(Arc::new);
        match &result {
            Ok(network) => debug!(
                path = %path.display(),
                nports = network.nports(),
                nfreq = network.nfreq(),
                "loaded"
            ),
            Err(e) => warn!(path = %path.display(), error = %e, "load failed"),
        }
        Self {
            path: path.to_path_buf(),
            result,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The parsed network, if loading succeeded
    pub fn network(&self) -> Option<&Arc<Network>> {
        self.result.as_ref().ok()
    }
}

/// Load `paths`, in parallel once the batch is large enough
pub fn load_files<P: AsRef<Path> + Sync>(paths: &[P], config: &LoaderConfig) -> Vec<LoadOutcome> {
    let start = Instant::now();
    let parallel = paths.len() >= config.min_files_for_parallel;

    let outcomes: Vec<LoadOutcome> = if parallel {
        paths
            .par_iter()
            .map(|p| LoadOutcome::load(p.as_ref(), &config.parser))
            .collect()
    } else {
        paths
            .iter()
            .map(|p| LoadOutcome::load(p.as_ref(), &config.parser))
            .collect()
    };

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(
        files = outcomes.len(),
        failed,
        parallel,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch load finished"
    );
    outcomes
}

/// Touchstone files directly inside `dir`, sorted by file name
pub fn touchstone_files<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && port_count_from_path(p).is_ok())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every Touchstone file in `dir`
pub fn load_folder<P: AsRef<Path>>(
    dir: P,
    config: &LoaderConfig,
) -> std::io::Result<Vec<LoadOutcome>> {
    let files = touchstone_files(dir)?;
    Ok(load_files(&files, config))
}

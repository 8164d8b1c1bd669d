//! Specification file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::infra::config::Config;

const PLAYLIST_IGNORE: &str = ".playlistignore";

/// A specification file found under the root folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFile {
    pub path: PathBuf,
    pub display_path: String,
}

impl SpecFile {
    /// Directory holding the file.
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }
}

/// Files found under a root folder, sorted by path.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<SpecFile>,
}

/// Configuration inputs for the scanner.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub root: PathBuf,
    pub config: Config,
}

impl ScannerConfig {
    pub fn from_root(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }
}

/// Scanner walking the root folder and collecting files with the configured extension.
#[derive(Debug, Default)]
pub struct Scanner;

impl Scanner {
    pub fn new() -> Self {
        Self
    }

    /// Walk `cfg.root` recursively. The result is sorted by path so repeated scans of an
    /// unchanged tree agree.
    pub fn scan(&self, cfg: &ScannerConfig) -> Result<ScanResult> {
        let scan = &cfg.config.scan;
        let skip = build_ignore_set(cfg)?;
        let root = cfg.root.clone();

        let mut builder = WalkBuilder::new(&cfg.root);
        builder
            .standard_filters(false)
            .hidden(!scan.show_hidden())
            .git_ignore(scan.respect_gitignore())
            .git_exclude(scan.respect_gitignore())
            .parents(scan.respect_gitignore())
            .filter_entry(move |entry| {
                entry.depth() == 0
                    || !skip.is_match(entry.path().strip_prefix(&root).unwrap_or(entry.path()))
            });

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "scanner error");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_some_and(|ty| ty.is_file())
                && has_extension(path, scan.extension())
            {
                files.push(SpecFile {
                    path: path.to_path_buf(),
                    display_path: to_display_path(&cfg.root, path),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(root = %cfg.root.display(), count = files.len(), "scan complete");
        Ok(ScanResult { files })
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

fn to_display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Ignore paths, `.playlistignore` entries and raw globs, relative to the root.
fn build_ignore_set(cfg: &ScannerConfig) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    let ignore_file = load_playlistignore(&cfg.root)?;
    let dirs = cfg
        .config
        .ignore
        .paths()
        .into_iter()
        .chain(ignore_file.iter().map(String::as_str));
    for dir in dirs {
        for pattern in expand_dir_pattern(dir) {
            builder.add(
                Glob::new(&pattern)
                    .with_context(|| format!("invalid ignore path pattern: {dir}"))?,
            );
        }
    }

    for glob in &cfg.config.ignore.globs {
        builder.add(Glob::new(glob).with_context(|| format!("invalid ignore glob: {glob}"))?);
    }

    builder.build().context("failed to build ignore matcher")
}

/// `name/` matches that directory at any depth, along with everything below it.
fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![format!("**/{trimmed}"), format!("**/{trimmed}/**")]
}

fn load_playlistignore(root: &Path) -> Result<Vec<String>> {
    let path = root.join(PLAYLIST_IGNORE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let contents =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

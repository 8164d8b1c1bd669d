//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: &str = include_str!("../../assets/default-config.toml");
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".playlistgen/config.toml";

/// Layered configuration loaded from defaults, user, workspace, explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scan: Scan,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub naming: Naming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Scan {
    #[serde(default)]
    extension: Option<String>,
    #[serde(default)]
    show_hidden: Option<bool>,
    #[serde(default)]
    respect_gitignore: Option<bool>,
    #[serde(default)]
    parallel: Option<bool>,
}

impl Scan {
    /// Extension without the leading dot.
    pub fn extension(&self) -> &str {
        self.extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.'))
            .unwrap_or("feature")
    }

    pub fn set_extension(&mut self, extension: impl Into<String>) {
        self.extension = Some(extension.into());
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden.unwrap_or(true)
    }

    pub fn respect_gitignore(&self) -> bool {
        self.respect_gitignore.unwrap_or(false)
    }

    pub fn parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = Some(parallel);
    }
}

/// Directory names skipped at any depth. A layer that sets `paths` replaces this list; globs
/// accumulate across layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ignore {
    #[serde(default)]
    paths: Option<Vec<String>>,
    #[serde(default)]
    pub globs: Vec<String>,
}

impl Ignore {
    pub fn paths(&self) -> Vec<&str> {
        match &self.paths {
            Some(paths) => paths.iter().map(String::as_str).collect(),
            None => vec![".git/"],
        }
    }

    pub fn set_paths(&mut self, paths: Vec<String>) {
        self.paths = Some(paths);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Selection {
    #[serde(default)]
    include_rules: Option<bool>,
    #[serde(default)]
    include_background: Option<bool>,
}

impl Selection {
    /// Whether scenarios nested under `Rule:` blocks are considered.
    pub fn include_rules(&self) -> bool {
        self.include_rules.unwrap_or(true)
    }

    /// Whether background steps count as part of every scenario.
    pub fn include_background(&self) -> bool {
        self.include_background.unwrap_or(false)
    }

    pub fn set_include_background(&mut self, include: bool) {
        self.include_background = Some(include);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Naming {
    #[serde(default)]
    pub root_namespace: Option<String>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    extension: Option<String>,
    root_namespace: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            extension: env::var("PLAYLISTGEN_EXTENSION").ok(),
            root_namespace: env::var("PLAYLISTGEN_NAMESPACE").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(extension: &str, root_namespace: &str) -> Self {
        Self {
            extension: Some(extension.to_owned()),
            root_namespace: Some(root_namespace.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user config, workspace config, an optional explicit
    /// file, and env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        if let Some(path) = explicit.filter(|path| !path.exists()) {
            anyhow::bail!("config file not found: {}", path.display());
        }
        Self::load_with_layers(
            global,
            workspace,
            explicit.map(Path::to_path_buf),
            env,
        )
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        explicit: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(DEFAULT_CONFIG)?);

        for path in [global, workspace, explicit].into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config layer");
                layers.push(Self::from_file(&path)?);
            }
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            scan: merge_scan(self.scan, other.scan),
            ignore: merge_ignore(self.ignore, other.ignore),
            selection: merge_selection(self.selection, other.selection),
            naming: Naming {
                root_namespace: other.naming.root_namespace.or(self.naming.root_namespace),
            },
        }
    }
}

fn merge_scan(base: Scan, overlay: Scan) -> Scan {
    Scan {
        extension: overlay.extension.or(base.extension),
        show_hidden: overlay.show_hidden.or(base.show_hidden),
        respect_gitignore: overlay.respect_gitignore.or(base.respect_gitignore),
        parallel: overlay.parallel.or(base.parallel),
    }
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);

    Ignore {
        paths: overlay.paths.or(base.paths),
        globs: globs.into_iter().collect(),
    }
}

fn merge_selection(mut base: Selection, overlay: Selection) -> Selection {
    if let Some(value) = overlay.include_rules {
        base.include_rules = Some(value);
    }
    if let Some(value) = overlay.include_background {
        base.include_background = Some(value);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("playlistgen/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(extension) = env.extension.filter(|value| !value.trim().is_empty()) {
        config.scan.set_extension(extension);
    }
    if let Some(namespace) = env.root_namespace {
        config.naming.root_namespace = Some(namespace);
    }
    config
}

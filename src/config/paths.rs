//! Configuration search paths.
//!
//! Two related searches live here:
//!
//! - [`ConfigPaths`] lists the locations of the top-level `satpy.yaml` that
//!   feeds the configuration store, one per tier.
//! - [`PathResolver`] finds component configuration files (readers, writers,
//!   composites) across the package directory and the configured search
//!   directories.
//!
//! Both return lists ordered lowest priority first, so a consumer merging in
//! order ends up with the highest priority values, and a consumer looking for
//! a single file takes the last entry.

use super::env::{CONFIG_PATH_VAR, EnvVars, ROOT_CONFIG_VAR, split_search_path};
use globset::Glob;
use std::collections::{HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Application name used for platform directories.
pub const APP_NAME: &str = "satpy";

/// Name of the top-level configuration file.
pub const CONFIG_FILENAME: &str = "satpy.yaml";

/// Built-in configuration shipped with the crate.
pub const PACKAGE_CONFIG_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/etc");

/// Default system-wide config file when `SATPY_ROOT_CONFIG` is unset.
pub const DEFAULT_ROOT_CONFIG: &str = "/etc/satpy/satpy.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Built-in package configuration (lowest priority)
    Package = 0,
    /// System root config (`/etc/satpy` or `$SATPY_ROOT_CONFIG`)
    System = 1,
    /// Installation prefix (`<prefix>/etc/satpy`)
    Prefix = 2,
    /// User config directory (`~/.config/satpy`)
    User = 3,
    /// Legacy dotfile directory (`~/.satpy`)
    Legacy = 4,
    /// Directories from `$SATPY_CONFIG_PATH` (highest priority)
    Environment = 5,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Package => write!(f, "package"),
            ConfigTier::System => write!(f, "system"),
            ConfigTier::Prefix => write!(f, "prefix"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Legacy => write!(f, "legacy"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Location of one top-level configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub tier: ConfigTier,
    /// A file, or a directory of `.yaml`/`.yml`/`.json` fragments.
    pub path: PathBuf,
}

/// Paths for each configuration tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub package_dir: Option<PathBuf>,
    pub root_config: Option<PathBuf>,
    pub prefix_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    pub legacy_dir: Option<PathBuf>,
    /// `$SATPY_CONFIG_PATH` directories in listed order.
    pub env_dirs: Vec<PathBuf>,
}

impl ConfigPaths {
    /// Discover configuration paths from environment and platform defaults.
    pub fn discover(vars: &EnvVars) -> Self {
        let root_config = vars
            .get(ROOT_CONFIG_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_CONFIG));

        let prefix_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf))
            .map(|prefix| prefix.join("etc").join(APP_NAME));

        let env_dirs = vars
            .get(CONFIG_PATH_VAR)
            .map(|value| split_search_path(value))
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect();

        Self {
            package_dir: Some(PathBuf::from(PACKAGE_CONFIG_DIR)),
            root_config: Some(root_config),
            prefix_dir,
            user_dir: dirs::config_dir().map(|d| d.join(APP_NAME)),
            legacy_dir: dirs::home_dir().map(|h| h.join(format!(".{}", APP_NAME))),
            env_dirs,
        }
    }

    /// Create paths with only explicit environment directories.
    ///
    /// Useful for tests and embedding, where the host's system and user
    /// configuration must not leak in.
    pub fn with_dirs(package_dir: Option<PathBuf>, env_dirs: Vec<PathBuf>) -> Self {
        Self {
            package_dir,
            env_dirs,
            ..Self::default()
        }
    }

    /// All candidate sources, lowest priority first, without duplicates.
    ///
    /// The sources need not exist; the loader skips missing ones.
    pub fn sources(&self) -> Vec<ConfigSource> {
        let mut sources = Vec::new();
        let mut push = |tier, path: PathBuf| sources.push(ConfigSource { tier, path });

        if let Some(dir) = &self.package_dir {
            push(ConfigTier::Package, dir.join(CONFIG_FILENAME));
        }
        if let Some(file) = &self.root_config {
            push(ConfigTier::System, file.clone());
        }
        if let Some(dir) = &self.prefix_dir {
            push(ConfigTier::Prefix, dir.join(CONFIG_FILENAME));
        }
        if let Some(dir) = &self.user_dir {
            push(ConfigTier::User, dir.join(CONFIG_FILENAME));
        }
        if let Some(dir) = &self.legacy_dir {
            push(ConfigTier::Legacy, dir.join(CONFIG_FILENAME));
        }
        for dir in &self.env_dirs {
            push(ConfigTier::Environment, dir.join(CONFIG_FILENAME));
        }

        let mut seen = HashSet::new();
        sources.retain(|source| seen.insert(absolute(&source.path)));
        sources
    }
}

/// Finds component configuration files across search directories.
#[derive(Debug, Clone)]
pub struct PathResolver {
    package_dir: PathBuf,
    /// Extra directories, lowest priority first.
    search_dirs: Vec<PathBuf>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PathResolver {
    /// Create a resolver over the package directory plus `search_dirs`
    /// (lowest priority first, as listed in `config_path`).
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            package_dir: PathBuf::from(PACKAGE_CONFIG_DIR),
            search_dirs,
        }
    }

    /// Replace the built-in package directory.
    pub fn with_package_dir(mut self, package_dir: impl Into<PathBuf>) -> Self {
        self.package_dir = package_dir.into();
        self
    }

    /// Resolver using the `config_path` setting of the global store.
    pub fn from_global() -> Self {
        Self::new(super::global().config_path())
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Candidate locations for `filename`, builtin first.
    ///
    /// Candidates by descending priority: `filename` itself, its base name,
    /// each search directory (last listed first), then the package directory.
    /// All are made absolute, filtered to existing files when
    /// `check_exists` is set, deduplicated keeping the first occurrence, and
    /// finally reversed.
    pub fn search_paths(&self, filename: impl AsRef<Path>, check_exists: bool) -> Vec<PathBuf> {
        let filename = filename.as_ref();
        let basename = filename
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| filename.to_path_buf());

        let mut paths = vec![filename.to_path_buf(), basename];
        paths.extend(self.search_dirs.iter().rev().map(|dir| dir.join(filename)));
        paths.push(self.package_dir.join(filename));

        let mut paths: Vec<PathBuf> = paths.iter().map(|p| absolute(p)).collect();
        if check_exists {
            paths.retain(|p| p.is_file());
        }

        let mut seen = HashSet::new();
        paths.retain(|p| seen.insert(p.clone()));
        paths.reverse();
        paths
    }

    /// Glob `pattern` in every candidate location, lazily.
    ///
    /// Only the final path component is matched, inside each candidate's
    /// parent directory. Wildcards in directory components are not expanded
    /// and there is no recursive walk; this keeps discovery of all configs
    /// for a component cheap.
    pub fn glob_config(&self, pattern: impl AsRef<Path>) -> GlobConfig {
        GlobConfig {
            candidates: self.search_paths(pattern, false).into(),
            current: Vec::new().into_iter(),
        }
    }

    /// The single highest-priority existing path for `filename`.
    pub fn get_config_path(&self, filename: impl AsRef<Path>) -> Option<PathBuf> {
        self.search_paths(filename, true)
            .into_iter()
            .rev()
            .find(|path| path.exists())
    }
}

/// Lazy iterator over glob matches, see [`PathResolver::glob_config`].
#[derive(Debug)]
pub struct GlobConfig {
    candidates: VecDeque<PathBuf>,
    current: std::vec::IntoIter<PathBuf>,
}

impl Iterator for GlobConfig {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            if let Some(path) = self.current.next() {
                return Some(path);
            }
            let candidate = self.candidates.pop_front()?;
            self.current = glob_final_component(&candidate).into_iter();
        }
    }
}

/// Match the last component of `pattern` against its parent's entries.
fn glob_final_component(pattern: &Path) -> Vec<PathBuf> {
    let (Some(parent), Some(name)) = (pattern.parent(), pattern.file_name()) else {
        return Vec::new();
    };
    let name = name.to_string_lossy();
    let matcher = match Glob::new(&name) {
        Ok(glob) => glob.compile_matcher(),
        Err(err) => {
            debug!(pattern = %pattern.display(), error = %err, "Invalid config glob");
            return Vec::new();
        }
    };
    let Ok(entries) = std::fs::read_dir(parent) else {
        return Vec::new();
    };

    let include_hidden = name.starts_with('.');
    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter(|entry| {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            (include_hidden || !file_name.starts_with('.')) && matcher.is_match(&*file_name)
        })
        .map(|entry| entry.path())
        .collect();
    matches.sort();
    matches
}

/// Make `path` absolute against the current directory and normalize it.
///
/// Purely lexical: symlinks are not resolved and the path need not exist.
pub fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };
    normalize_path_components(&joined)
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_path_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            other => components.push(other),
        }
    }

    components.iter().collect()
}

/// Candidate paths for `filename` using the global store's search directories.
pub fn config_search_paths(filename: impl AsRef<Path>, check_exists: bool) -> Vec<PathBuf> {
    PathResolver::from_global().search_paths(filename, check_exists)
}

/// Glob results for all configuration locations, see [`PathResolver::glob_config`].
pub fn glob_config(pattern: impl AsRef<Path>) -> GlobConfig {
    PathResolver::from_global().glob_config(pattern)
}

/// Highest-priority existing path for `filename`, see [`PathResolver::get_config_path`].
pub fn get_config_path(filename: impl AsRef<Path>) -> Option<PathBuf> {
    PathResolver::from_global().get_config_path(filename)
}

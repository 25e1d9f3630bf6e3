//! Installation self test.
//!
//! Checks every discovered reader and writer configuration and probes the
//! optional shared libraries, producing a printable [`Report`]. Nothing in
//! here returns an error: every failure becomes a per-item status string.

use crate::composites::COMPOSITOR_NAMES;
use crate::config::env::split_search_path;
use crate::config::{ConfigStore, PathResolver, global};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shared libraries probed when the caller names none.
pub const DEFAULT_EXTRAS: &[&str] = &["gdal", "proj"];

/// Status of a component whose configuration parsed cleanly.
pub const STATUS_OK: &str = "ok";

/// Status of a component whose configuration only parsed in plain mode.
pub const STATUS_ERROR: &str = "error";

/// Component families with configuration directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Reader,
    Writer,
}

impl ComponentKind {
    /// Top-level section holding the component `name`.
    pub fn section(self) -> &'static str {
        match self {
            ComponentKind::Reader => "reader",
            ComponentKind::Writer => "writer",
        }
    }

    /// Configuration directory relative to each search base.
    pub fn config_dir(self) -> &'static str {
        match self {
            ComponentKind::Reader => "readers",
            ComponentKind::Writer => "writers",
        }
    }
}

/// Discover component configurations.
///
/// Returns one group per component file name, each holding that file from
/// every search base, lowest priority first. With a `filter`, only
/// components whose file stem is listed are returned.
pub fn configs_for_component(
    resolver: &PathResolver,
    kind: ComponentKind,
    filter: Option<&[String]>,
) -> Vec<Vec<PathBuf>> {
    let pattern = format!("{}/*.yaml", kind.config_dir());
    let mut groups: BTreeMap<OsString, Vec<PathBuf>> = BTreeMap::new();

    for path in resolver.glob_config(&pattern) {
        let Some(file_name) = path.file_name().map(|name| name.to_os_string()) else {
            continue;
        };
        if let Some(filter) = filter {
            let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("");
            if !filter.iter().any(|wanted| wanted == stem) {
                continue;
            }
        }
        groups.entry(file_name).or_default().push(path);
    }

    debug!(kind = kind.section(), count = groups.len(), "Discovered component configs");
    groups.into_values().collect()
}

/// Why a strict parse failed.
#[derive(Debug)]
enum StrictFailure {
    /// A custom tag has no known constructor.
    Construction(String),
    /// Anything else: syntax, several documents, ...
    Other,
}

/// Parse a single document, requiring every custom tag to be known.
fn parse_strict(content: &str, known_tags: &[String]) -> Result<Value, StrictFailure> {
    let value: Value = serde_yaml::from_str(content).map_err(|_| StrictFailure::Other)?;
    check_tags(&value, known_tags)?;
    Ok(strip_tags(value))
}

/// Parse the first document, dropping all tags.
fn parse_plain(content: &str) -> Option<Value> {
    let document = serde_yaml::Deserializer::from_str(content).next()?;
    Value::deserialize(document).ok().map(strip_tags)
}

fn check_tags(value: &Value, known_tags: &[String]) -> Result<(), StrictFailure> {
    match value {
        Value::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let name = tag.trim_start_matches('!');
            if !known_tags.iter().any(|known| known.trim_start_matches('!') == name) {
                return Err(StrictFailure::Construction(format!(
                    "could not determine a constructor for the tag '{}'",
                    tag
                )));
            }
            check_tags(&tagged.value, known_tags)
        }
        Value::Sequence(items) => items.iter().try_for_each(|item| check_tags(item, known_tags)),
        Value::Mapping(mapping) => mapping
            .iter()
            .try_for_each(|(key, value)| {
                check_tags(key, known_tags)?;
                check_tags(value, known_tags)
            }),
        _ => Ok(()),
    }
}

fn strip_tags(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => strip_tags(tagged.value),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(strip_tags).collect()),
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .into_iter()
                .map(|(key, value)| (strip_tags(key), strip_tags(value)))
                .collect::<Mapping>(),
        ),
        other => other,
    }
}

/// Name and status of one configuration file, if it has a name.
pub fn check_yaml_config(path: &Path, section: &str, known_tags: &[String]) -> Option<(String, String)> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            debug!(path = %path.display(), "Cannot read component config: {}", err);
            return None;
        }
    };

    let (value, status) = match parse_strict(&content, known_tags) {
        Ok(value) => (value, STATUS_OK.to_string()),
        Err(failure) => {
            let value = parse_plain(&content)?;
            let status = match failure {
                StrictFailure::Construction(problem) => problem,
                StrictFailure::Other => STATUS_ERROR.to_string(),
            };
            (value, status)
        }
    };

    let name = value.get(section)?.get("name")?.as_str()?;
    Some((name.to_string(), status))
}

/// Status of every named configuration in `groups`.
///
/// Files later in a group replace the status of the same name.
pub fn check_yaml_configs(
    groups: &[Vec<PathBuf>],
    section: &str,
    known_tags: &[String],
) -> BTreeMap<String, String> {
    groups
        .iter()
        .flatten()
        .filter_map(|path| check_yaml_config(path, section, known_tags))
        .collect()
}

/// Whether an optional dependency can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable(String),
}

impl Capability {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available)
    }

    /// Report status: `ok` or the reason it is missing.
    pub fn status(&self) -> String {
        match self {
            Capability::Available => STATUS_OK.to_string(),
            Capability::Unavailable(reason) => reason.clone(),
        }
    }
}

/// Answers whether a named optional dependency is present.
pub trait CapabilityProbe: Send + Sync {
    fn probe(&self, name: &str) -> Capability;
}

/// Looks for a shared library file in the loader search directories.
///
/// The default directory list is the loader environment variables followed
/// by common Linux and Homebrew locations. It is a best guess for the host:
/// libraries registered only through `ld.so.cache` or installed elsewhere
/// are not found unless their directory is listed in the `library_path`
/// setting or passed to [`SharedLibraryProbe::new`].
#[derive(Debug, Clone)]
pub struct SharedLibraryProbe {
    search_dirs: Vec<PathBuf>,
}

/// Library directories searched after the environment ones.
const SYSTEM_LIBRARY_DIRS: &[&str] = &[
    "/lib",
    "/lib64",
    "/usr/lib",
    "/usr/lib64",
    "/usr/local/lib",
    "/usr/lib/x86_64-linux-gnu",
    "/usr/lib/aarch64-linux-gnu",
    "/opt/homebrew/lib",
];

/// Environment variables listing extra library directories.
const LIBRARY_PATH_VARS: &[&str] = &["LD_LIBRARY_PATH", "DYLD_LIBRARY_PATH", "PATH"];

impl Default for SharedLibraryProbe {
    fn default() -> Self {
        let mut search_dirs: Vec<PathBuf> = LIBRARY_PATH_VARS
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .flat_map(|value| std::env::split_paths(&value).collect::<Vec<_>>())
            .filter(|dir| !dir.as_os_str().is_empty())
            .collect();
        search_dirs.extend(SYSTEM_LIBRARY_DIRS.iter().map(PathBuf::from));
        Self { search_dirs }
    }
}

impl SharedLibraryProbe {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Search `dirs` before the current directories.
    pub fn with_extra_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut search_dirs: Vec<PathBuf> = dirs.into_iter().collect();
        search_dirs.append(&mut self.search_dirs);
        self.search_dirs = search_dirs;
        self
    }

    /// Default directories plus the store's `library_path` setting.
    ///
    /// `library_path` may be a list or a colon-separated string.
    pub fn from_config(store: &ConfigStore) -> Self {
        let extra: Vec<PathBuf> = match store.get("library_path") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(PathBuf::from)
                .collect(),
            Some(serde_json::Value::String(joined)) => split_search_path(&joined)
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            _ => Vec::new(),
        };
        Self::default().with_extra_dirs(extra)
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Platform file name for library `name`, e.g. `libgdal.so`.
    pub fn library_file_name(name: &str) -> String {
        format!(
            "{}{}{}",
            std::env::consts::DLL_PREFIX,
            name,
            std::env::consts::DLL_SUFFIX
        )
    }

    fn find_in(dir: &Path, file_name: &str) -> Option<PathBuf> {
        let exact = dir.join(file_name);
        if exact.is_file() {
            return Some(exact);
        }
        // Versioned variants such as libproj.so.25
        let versioned = format!("{}.", file_name);
        std::fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .find(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| name.starts_with(&versioned))
            })
    }
}

impl CapabilityProbe for SharedLibraryProbe {
    fn probe(&self, name: &str) -> Capability {
        let file_name = Self::library_file_name(name);
        match self
            .search_dirs
            .iter()
            .find_map(|dir| Self::find_in(dir, &file_name))
        {
            Some(path) => {
                debug!(library = name, path = %path.display(), "Found shared library");
                Capability::Available
            }
            None => Capability::Unavailable(format!("No shared library named {} found", file_name)),
        }
    }
}

/// Probe each of `names` and map it to its status string.
pub fn check_extras(probe: &dyn CapabilityProbe, names: &[String]) -> BTreeMap<String, String> {
    names
        .iter()
        .map(|name| (name.clone(), probe.probe(name).status()))
        .collect()
}

/// Result of a self test, printed section by section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub readers: BTreeMap<String, String>,
    pub writers: BTreeMap<String, String>,
    pub extras: BTreeMap<String, String>,
}

impl Report {
    fn write_section(
        f: &mut fmt::Formatter<'_>,
        title: &str,
        items: &BTreeMap<String, String>,
    ) -> fmt::Result {
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        for (name, status) in items {
            writeln!(f, "{}:  {}", name, status)?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_section(f, "Readers", &self.readers)?;
        Self::write_section(f, "Writers", &self.writers)?;
        Self::write_section(f, "Extras", &self.extras)
    }
}

/// Runs the self test against a resolver and a capability probe.
pub struct DiagnosticChecker {
    resolver: PathResolver,
    probe: Box<dyn CapabilityProbe>,
    known_tags: Vec<String>,
}

impl DiagnosticChecker {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            probe: Box::new(SharedLibraryProbe::default()),
            known_tags: COMPOSITOR_NAMES.iter().map(|name| format!("!{}", name)).collect(),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn CapabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Add tags that strict parsing accepts.
    pub fn with_known_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn check(
        &self,
        readers: Option<&[String]>,
        writers: Option<&[String]>,
        extras: Option<&[String]>,
    ) -> Report {
        let reader_configs = configs_for_component(&self.resolver, ComponentKind::Reader, readers);
        let writer_configs = configs_for_component(&self.resolver, ComponentKind::Writer, writers);
        let extras: Vec<String> = match extras {
            Some(names) => names.to_vec(),
            None => DEFAULT_EXTRAS.iter().map(|name| name.to_string()).collect(),
        };

        Report {
            readers: check_yaml_configs(
                &reader_configs,
                ComponentKind::Reader.section(),
                &self.known_tags,
            ),
            writers: check_yaml_configs(
                &writer_configs,
                ComponentKind::Writer.section(),
                &self.known_tags,
            ),
            extras: check_extras(self.probe.as_ref(), &extras),
        }
    }
}

/// Self test over the globally configured search path.
pub fn check_all(
    readers: Option<&[String]>,
    writers: Option<&[String]>,
    extras: Option<&[String]>,
) -> Report {
    DiagnosticChecker::new(PathResolver::from_global())
        .with_probe(Box::new(SharedLibraryProbe::from_config(global())))
        .check(readers, writers, extras)
}

/// Run [`check_all`] and print the report to stdout.
pub fn check_satpy(readers: Option<&[String]>, writers: Option<&[String]>, extras: Option<&[String]>) {
    print!("{}", check_all(readers, writers, extras));
}

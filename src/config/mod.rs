//! Unified configuration system.
//!
//! Consolidates configuration from several tiers with field-by-field YAML merging:
//! 1. **Package** - `etc/satpy.yaml` shipped with the crate
//! 2. **System** - `$SATPY_ROOT_CONFIG` (default `/etc/satpy/satpy.yaml`)
//! 3. **Prefix** - `<install prefix>/etc/satpy/satpy.yaml`
//! 4. **User** - `~/.config/satpy/satpy.yaml`, then `~/.satpy/satpy.yaml`
//! 5. **Environment** - `$SATPY_CONFIG_PATH` directories, last listed wins,
//!    then `SATPY_*` variables
//!
//! Any of these locations may be a directory of `.yaml`/`.yml`/`.json`
//! fragments instead of a single file.
//!
//! ## Environment Variables
//! - `SATPY_ROOT_CONFIG` - System-wide config file
//! - `SATPY_CONFIG_PATH` - Colon-separated extra config directories
//!   (legacy: `PPP_CONFIG_DIR`)
//! - `SATPY_DATA_DIR` - Data directory (legacy: `SATPY_ANCPATH`)
//! - `SATPY_<KEY>` - Any other key; `__` separates nested keys

pub mod env;
mod loader;
mod merge;
pub mod paths;
mod store;

pub use loader::{ConfigLoader, FRAGMENT_EXTENSIONS, read_config_file, source_files};
pub use merge::{deep_merge, deep_merge_all, deep_override, get_path, remove_path, set_path};
pub use paths::{
    ConfigPaths, ConfigSource, ConfigTier, GlobConfig, PathResolver, config_search_paths,
    get_config_path, glob_config,
};
pub use store::{ConfigStore, OverrideGuard, default_values, global};

//! Ambient configuration for the build pipeline: a handful of installation-
//! wide settings the original Python system reads off `current_app.config`,
//! collected here into one `Config` loadable from a TOML file or the process
//! environment. Unknown keys are logged rather than rejected, and defaults
//! are chosen so a `Config::default()` build works against a plain directory
//! checkout with no graph database configured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Installation-wide settings consulted by the builder and loader.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory under which build artifacts (dashgraphs, annotation
    /// pages, manifests) are written when using a filesystem write backend.
    #[serde(default = "default_build_root")]
    pub build_root: PathBuf,

    /// Whether the builder should write indexed content directly against a
    /// graph database rather than the in-memory reference backend. Most
    /// demo and test environments leave this `false`.
    #[serde(default)]
    pub build_in_gdb: bool,

    /// The tag used in version strings to mean "work in progress", i.e. the
    /// unversioned, always-mutable state of a repo. Overriding this is only
    /// meaningful for installations migrating a differently-tagged dataset;
    /// ordinary configs should leave it at [`pfsc_core::WIP_TAG`].
    #[serde(default = "default_wip_tag")]
    pub wip_tag: String,

    /// The tag used to mean "infinite major version", i.e. "valid forever,
    /// as of the newest release". See [`wip_tag`](Config::wip_tag) for why
    /// overriding this is rare.
    #[serde(default = "default_inf_tag")]
    pub inf_tag: String,

    /// Skip the module cache when loading a repo's own root module during a
    /// build, even under a caching policy that would otherwise serve a
    /// stale entry. Useful for an editor-integrated build loop where the
    /// root module's dependencies/change_log assignments are being actively
    /// edited.
    #[serde(default)]
    pub bypass_cache_for_repo_model_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            build_root: default_build_root(),
            build_in_gdb: false,
            wip_tag: default_wip_tag(),
            inf_tag: default_inf_tag(),
            bypass_cache_for_repo_model_load: false,
        }
    }
}

fn default_build_root() -> PathBuf {
    PathBuf::from("build")
}

fn default_wip_tag() -> String {
    pfsc_core::WIP_TAG.to_string()
}

fn default_inf_tag() -> String {
    pfsc_core::INF_TAG.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse toml config: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Config {
    /// Load from a TOML file, logging (but not failing on) unrecognized
    /// keys at `tracing::warn!`, matching the original's tolerant handling
    /// of config drift across installation versions.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let de = toml::Deserializer::new(text);
        let mut unknown_keys = Vec::new();
        let config: Config = serde_ignored::deserialize(de, |path| {
            unknown_keys.push(path.to_string());
        })?;
        for key in &unknown_keys {
            tracing::warn!(target = "pfsc.config", key, "ignoring unrecognized config key");
        }
        Ok(config)
    }

    /// Applies `PFSC_*` environment variable overrides on top of an already
    /// loaded config, for the handful of settings worth overriding per
    /// process without editing a file (mirrors the original's practice of
    /// layering `os.environ` over `current_app.config`).
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("PFSC_BUILD_ROOT") {
            self.build_root = PathBuf::from(v);
        }
        if let Some(v) = parse_env_bool("PFSC_BUILD_IN_GDB") {
            self.build_in_gdb = v;
        }
        if let Some(v) = parse_env_bool("PFSC_BYPASS_CACHE_FOR_REPO_MODEL_LOAD") {
            self.bypass_cache_for_repo_model_load = v;
        }
        self
    }
}

fn parse_env_bool(var: &str) -> Option<bool> {
    std::env::var(var).ok().and_then(|v| bool::from_str(&v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pfsc_core_tags() {
        let config = Config::default();
        assert_eq!(config.wip_tag, pfsc_core::WIP_TAG);
        assert_eq!(config.inf_tag, pfsc_core::INF_TAG);
        assert!(!config.build_in_gdb);
    }

    #[test]
    fn loads_partial_toml_and_fills_in_defaults() {
        let config = Config::load_from_str("build_root = \"/srv/pfsc/build\"\n").unwrap();
        assert_eq!(config.build_root, PathBuf::from("/srv/pfsc/build"));
        assert_eq!(config.wip_tag, pfsc_core::WIP_TAG);
    }

    #[test]
    fn unknown_keys_are_ignored_not_fatal() {
        let config = Config::load_from_str("build_in_gdb = true\ntypo_field = 123\n").unwrap();
        assert!(config.build_in_gdb);
    }

    #[test]
    fn env_overrides_apply_on_top_of_file_config() {
        std::env::set_var("PFSC_BUILD_IN_GDB", "true");
        let config = Config::default().apply_env_overrides();
        std::env::remove_var("PFSC_BUILD_IN_GDB");
        assert!(config.build_in_gdb);
    }
}

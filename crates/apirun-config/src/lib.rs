//! Project configuration for the apirun HTTP test runner: the working
//! directory, the names of the API/suite definition folders, and the
//! project's `.env` file path. A minimal, defaulted,
//! `serde`-deserializable struct — no mandatory schema.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

fn default_api_dir() -> String {
    "api".to_string()
}

fn default_suite_dir() -> String {
    "suite".to_string()
}

fn default_testcase_dir() -> String {
    "testcases".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

/// Where a project keeps its definitions, relative to `working_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ProjectConfig {
    /// Root directory the loader walks; all other paths are relative to it.
    /// Defaults to the current directory.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Folder (under `working_dir`) holding reusable `api:` definitions.
    #[serde(default = "default_api_dir")]
    pub api_dir: String,

    /// Folder (under `working_dir`) holding reusable `suite:` definitions.
    #[serde(default = "default_suite_dir")]
    pub suite_dir: String,

    /// Folder (under `working_dir`) holding standalone test-case documents.
    #[serde(default = "default_testcase_dir")]
    pub testcase_dir: String,

    /// Path (relative to `working_dir`) to the project's `.env` file.
    #[serde(default = "default_env_file")]
    pub env_file: String,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            api_dir: default_api_dir(),
            suite_dir: default_suite_dir(),
            testcase_dir: default_testcase_dir(),
            env_file: default_env_file(),
        }
    }
}

impl ProjectConfig {
    /// Load a config from a YAML file. Any field missing from the document
    /// falls back to its default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn api_path(&self) -> PathBuf {
        self.working_dir.join(&self.api_dir)
    }

    pub fn suite_path(&self) -> PathBuf {
        self.working_dir.join(&self.suite_dir)
    }

    pub fn testcase_path(&self) -> PathBuf {
        self.working_dir.join(&self.testcase_dir)
    }

    pub fn env_file_path(&self) -> PathBuf {
        self.working_dir.join(&self.env_file)
    }
}

/// Errors that can occur while loading a [`ProjectConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conventional_layout() {
        let config = ProjectConfig::default();
        assert_eq!(config.api_dir, "api");
        assert_eq!(config.suite_dir, "suite");
        assert_eq!(config.testcase_dir, "testcases");
        assert_eq!(config.env_file, ".env");
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apirun.yml");
        std::fs::write(&path, "working_dir: ./myproject\napi_dir: definitions\n").unwrap();

        let config = ProjectConfig::load(&path).unwrap();
        assert_eq!(config.working_dir, PathBuf::from("./myproject"));
        assert_eq!(config.api_dir, "definitions");
        assert_eq!(config.suite_dir, "suite");
    }

    #[test]
    fn derived_paths_join_working_dir() {
        let config = ProjectConfig {
            working_dir: PathBuf::from("/proj"),
            ..ProjectConfig::default()
        };
        assert_eq!(config.api_path(), PathBuf::from("/proj/api"));
        assert_eq!(config.env_file_path(), PathBuf::from("/proj/.env"));
    }
}

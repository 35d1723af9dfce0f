//! Configuration of the agent stream client.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables, then explicit `KEY=VALUE` assignments.

mod api;
mod error;
mod status;
mod stream;
mod upgrade;

use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use url::Url;

pub use crate::{
    api::ApiConfig,
    error::{Error, Result},
    status::StatusConfig,
    stream::StreamConfig,
    upgrade::UpgradeConfig,
};

/// Prefix of the environment variables read by [`Config::apply_env`].
pub const ENV_PREFIX: &str = "AW_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
    pub stream: StreamConfig,
    pub status: StatusConfig,
    pub upgrade: UpgradeConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;

        Ok(config)
    }

    /// Load the configuration from the given file, if any, and apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file.");
                let contents = fs::read_to_string(path).map_err(|source| Error::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };

        config.apply_env(ENV_PREFIX)?;
        Ok(config)
    }

    /// Apply overrides from environment variables starting with `prefix`.
    ///
    /// See [`Config::apply_vars`] for the recognized variables.
    pub fn apply_env(&mut self, prefix: &str) -> Result<()> {
        self.apply_vars(prefix, env::vars())
    }

    /// Apply overrides from `(name, value)` pairs.
    ///
    /// Recognized names, after `prefix`, are `BASE_URL`, `API_TOKEN`,
    /// `RUN_PATH` and `UPLOAD_PATH`. Other names are ignored.
    pub fn apply_vars(
        &mut self,
        prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<()> {
        for (name, value) in vars {
            let Some(name) = name.strip_prefix(prefix) else {
                continue;
            };

            let key = match name {
                "BASE_URL" => "api.base_url",
                "API_TOKEN" => "api.token",
                "RUN_PATH" => "api.run_path",
                "UPLOAD_PATH" => "api.upload_path",
                _ => continue,
            };

            trace!(key, "Applying environment override.");
            self.assign(key, &value)?;
        }

        Ok(())
    }

    /// Assign a single value by its dotted key, e.g. `api.base_url`.
    ///
    /// The configuration is left untouched if the key is unknown or the
    /// resulting configuration is invalid.
    pub fn assign(&mut self, key: &str, value: &str) -> Result<()> {
        let mut config = self.clone();
        config.assign_unchecked(key, value)?;
        config.validate()?;

        *self = config;
        Ok(())
    }

    fn assign_unchecked(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "api.base_url" => self.api.base_url = value.to_owned(),
            "api.run_path" => self.api.run_path = value.to_owned(),
            "api.upload_path" => self.api.upload_path = value.to_owned(),
            "api.token" => self.api.token = (!value.is_empty()).then(|| value.to_owned()),
            "stream.start_marker" => self.stream.start_marker = value.to_owned(),
            "stream.end_marker" => self.stream.end_marker = value.to_owned(),
            "stream.max_frame_bytes" => {
                self.stream.max_frame_bytes = if value.is_empty() {
                    None
                } else {
                    Some(value.parse::<usize>().map_err(|error| Error::Invalid {
                        key: "stream.max_frame_bytes",
                        reason: error.to_string(),
                    })?)
                };
            }
            "status.default" => self.status.default_phrase = value.to_owned(),
            "upgrade.messages" => self.upgrade.messages.push(value.to_owned()),
            _ => match key.strip_prefix("status.tools.") {
                Some(tool) if !tool.is_empty() => {
                    self.status.tools.insert(tool.to_owned(), value.to_owned());
                }
                _ => return Err(Error::UnknownKey(key.to_owned())),
            },
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.base_url)?;

        for (key, path) in [
            ("api.run_path", &self.api.run_path),
            ("api.upload_path", &self.api.upload_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::Invalid {
                    key,
                    reason: format!("`{path}` must start with `/`"),
                });
            }
        }

        for (key, marker) in [
            ("stream.start_marker", &self.stream.start_marker),
            ("stream.end_marker", &self.stream.end_marker),
        ] {
            if marker.is_empty() {
                return Err(Error::Invalid {
                    key,
                    reason: "marker must not be empty".to_owned(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile};
use crate::core::error::{AppError, Result};
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// Handles loading from a TOML file, applying CLI/env overrides on top, and
/// validating the final result.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    pub fn db_path(mut self, path: impl Into<String>) -> Self {
        self.overrides.store.db_path = Some(path.into());
        self
    }
    pub fn webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.browser.webdriver_url = Some(url.into());
        self
    }
    pub fn browser_profile_dir(mut self, dir: Option<impl Into<String>>) -> Self {
        self.overrides.browser.profile_dir = dir.map(|d| d.into());
        self
    }
    pub fn headless(mut self, enable: bool) -> Self {
        self.overrides.browser.headless = Some(enable);
        self
    }
    pub fn messaging_base_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.automation.base_url = Some(url.into());
        self
    }
    pub fn login_check_timeout(mut self, duration: Duration) -> Self {
        self.overrides.automation.login_check_timeout = Some(duration.as_secs());
        self
    }
    pub fn login_interactive_timeout(mut self, duration: Duration) -> Self {
        self.overrides.automation.login_interactive_timeout = Some(duration.as_secs());
        self
    }
    pub fn element_timeout(mut self, duration: Duration) -> Self {
        self.overrides.automation.element_timeout = Some(duration.as_secs());
        self
    }
    pub fn send_pause(mut self, min: f32, max: f32) -> Self {
        self.overrides.automation.min_send_pause = Some(min);
        self.overrides.automation.max_send_pause = Some(max);
        self
    }

    /// Builds the final `Config`, applying defaults, file settings, overrides,
    /// and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {}",
                        path, e
                    )));
                }
            }
        } else {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./phone-reach.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    tracing::debug!("Found potential default config file: {}", path_str);
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;

        validate_config(&mut self.config)?;
        Ok(self.config)
    }
}

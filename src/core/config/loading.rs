//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content.
/// Internal to the builder logic.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    tracing::debug!("Attempting to parse TOML from: {}", file_path);
    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config` instance.
/// Internal helper for the builder. This merges settings.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // Store
    if let Some(ref path) = file_config.store.db_path {
        if !path.trim().is_empty() {
            config.db_path = PathBuf::from(path.trim());
        }
    }

    // Browser
    if let Some(ref url) = file_config.browser.webdriver_url {
        if !url.trim().is_empty() {
            config.webdriver_url = url.trim().to_string();
        }
    }
    if let Some(ref dir) = file_config.browser.profile_dir {
        if !dir.trim().is_empty() {
            config.browser_profile_dir = Some(PathBuf::from(dir.trim()));
        } else {
            config.browser_profile_dir = None;
        }
    }
    if let Some(headless) = file_config.browser.headless {
        config.headless = headless;
    }

    // Automation
    if let Some(ref url) = file_config.automation.base_url {
        if !url.trim().is_empty() {
            config.messaging_base_url = url.trim().trim_end_matches('/').to_string();
        }
    }
    if let Some(secs) = file_config.automation.login_check_timeout {
        config.login_check_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file_config.automation.login_interactive_timeout {
        config.login_interactive_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file_config.automation.element_timeout {
        config.element_timeout = Duration::from_secs(secs);
    }
    if let Some(min) = file_config.automation.min_send_pause {
        config.send_pause.0 = min;
    }
    if let Some(max) = file_config.automation.max_send_pause {
        config.send_pause.1 = max;
    }
}

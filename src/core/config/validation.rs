//! Contains validation logic for the final Config struct.

use super::Config;
use crate::core::error::{AppError, Result};
use url::Url;

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values where a warning is preferable to a failure.
/// Internal helper for the builder's `build` method.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    if config.db_path.as_os_str().is_empty() {
        return Err(AppError::Config("Database path cannot be empty.".to_string()));
    }

    if Url::parse(&config.webdriver_url).is_err() {
        return Err(AppError::Config(format!(
            "Invalid WebDriver URL: {}",
            config.webdriver_url
        )));
    }
    if Url::parse(&config.messaging_base_url).is_err() {
        return Err(AppError::Config(format!(
            "Invalid messaging base URL: {}",
            config.messaging_base_url
        )));
    }

    if config.login_check_timeout.is_zero() || config.element_timeout.is_zero() {
        return Err(AppError::Config(
            "Login check and element timeouts must be greater than zero.".to_string(),
        ));
    }
    if config.login_interactive_timeout < config.login_check_timeout {
        tracing::warn!(
            "Interactive login timeout ({:?}) < quick check timeout ({:?}). Setting interactive = quick.",
            config.login_interactive_timeout,
            config.login_check_timeout
        );
        config.login_interactive_timeout = config.login_check_timeout;
    }

    if config.send_pause.0 < 0.0 || config.send_pause.1 < 0.0 {
        return Err(AppError::Config(
            "Send pause durations cannot be negative.".to_string(),
        ));
    }
    if config.send_pause.0 > config.send_pause.1 {
        tracing::warn!(
            "Min send pause ({:.2}s) > max send pause ({:.2}s). Setting max = min.",
            config.send_pause.0,
            config.send_pause.1
        );
        config.send_pause.1 = config.send_pause.0;
    }

    if let Some(ref dir) = config.browser_profile_dir {
        if dir.as_os_str().is_empty() {
            tracing::warn!("Provided browser profile directory is empty. It will be ignored.");
            config.browser_profile_dir = None;
        }
    }

    Ok(())
}

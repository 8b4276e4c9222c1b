//! Runtime configuration: the effective `Config`, the TOML file schema, and the
//! fluent `ConfigBuilder`.

mod builder;
mod loading;
mod validation;

pub use builder::ConfigBuilder;

use rand::Rng;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Effective, validated configuration used by intake and automation.
///
/// Build via [`ConfigBuilder`]; direct construction is reserved for defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database holding the valid/invalid collections.
    pub db_path: PathBuf,

    /// URL of the running WebDriver instance (chromedriver / geckodriver).
    pub webdriver_url: String,
    /// Browser user-data directory, so an authenticated messaging session
    /// persists across runs. `None` lets the browser pick its default.
    pub browser_profile_dir: Option<PathBuf>,
    /// Run the browser headless. Interactive login (QR scan) needs a visible
    /// window, so this defaults to off.
    pub headless: bool,

    /// Base URL of the messaging web client.
    pub messaging_base_url: String,
    /// Quick check for the logged-in marker before falling back to the
    /// interactive wait.
    pub login_check_timeout: Duration,
    /// Long wait that allows scanning a login code interactively.
    pub login_interactive_timeout: Duration,
    /// Per-number wait for the conversation marker / send control.
    pub element_timeout: Duration,
    /// Random pause range (seconds) between consecutive send attempts.
    pub send_pause: (f32, f32),

    /// Which config file the settings were loaded from, if any.
    pub loaded_config_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./phone-reach.db"),
            webdriver_url: "http://localhost:4444".to_string(),
            browser_profile_dir: None,
            headless: false,
            messaging_base_url: "https://web.whatsapp.com".to_string(),
            login_check_timeout: Duration::from_secs(5),
            login_interactive_timeout: Duration::from_secs(120),
            element_timeout: Duration::from_secs(10),
            send_pause: (0.5, 2.0),
            loaded_config_path: None,
        }
    }
}

/// Returns a random duration within the configured send-pause range.
pub fn get_random_send_pause(config: &Config) -> Duration {
    let (min, max) = config.send_pause;
    if max <= min {
        return Duration::from_secs_f32(min.max(0.0));
    }
    let secs = rand::thread_rng().gen_range(min..max);
    Duration::from_secs_f32(secs)
}

/// Raw, optional settings as parsed from a TOML configuration file.
/// Every field is optional; unset fields keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub automation: AutomationSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSettings {
    pub db_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrowserSettings {
    pub webdriver_url: Option<String>,
    pub profile_dir: Option<String>,
    pub headless: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationSettings {
    pub base_url: Option<String>,
    /// Seconds.
    pub login_check_timeout: Option<u64>,
    /// Seconds.
    pub login_interactive_timeout: Option<u64>,
    /// Seconds.
    pub element_timeout: Option<u64>,
    pub min_send_pause: Option<f32>,
    pub max_send_pause: Option<f32>,
}

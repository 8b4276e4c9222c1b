//! Application-wide error type and `Result` alias.

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, AppError>;

/// All failure modes surfaced by the library.
///
/// Intake errors (`MalformedInput`, `Persistence`) are returned synchronously to the
/// caller. Automation errors are reported through logging and persisted state, since
/// the triggering call has usually already returned its acknowledgment.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration values or an unreadable configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The uploaded file could not be parsed, or no phone column was found.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A bulk insert (or other store operation) failed for a reason other than a
    /// duplicate key. Duplicate keys are recovered inside the store layer and never
    /// surface as this variant.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Could not establish a WebDriver session with the browser.
    #[error("WebDriver session error: {0}")]
    WebDriverSession(#[from] fantoccini::error::NewSessionError),

    /// The browser session failed mid-run (navigation, protocol error, ...).
    /// Element-wait timeouts are *not* reported here; they are per-number outcomes.
    #[error("WebDriver command error: {0}")]
    WebDriverCmd(#[from] fantoccini::error::CmdError),

    /// The logged-in marker never appeared; the automaton run is terminated.
    #[error("Login to the messaging web client failed")]
    LoginFailed,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

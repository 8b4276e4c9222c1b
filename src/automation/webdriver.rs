//! WebDriver-backed `BrowserSession` and client construction.

use super::{BrowserSession, WaitOutcome};
use crate::core::config::Config;
use crate::core::error::Result;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::map::Map as JsonMap;
use std::time::Duration;

/// A live browser session driven over the WebDriver protocol.
pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    /// Connects to the configured WebDriver instance with a Chrome profile bound
    /// to the persistent user-data directory, so an authenticated messaging
    /// session survives across runs.
    pub async fn connect(config: &Config) -> Result<Self> {
        tracing::debug!(
            target: "automation_task",
            "Connecting to WebDriver at {}...",
            config.webdriver_url
        );

        let mut caps = JsonMap::new();
        let mut chrome_opts = JsonMap::new();

        let mut args: Vec<String> = vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
        ];
        if let Some(ref profile) = config.browser_profile_dir {
            args.push(format!("user-data-dir={}", profile.display()));
            args.push("--profile-directory=Default".to_string());
        }
        if config.headless {
            args.push("--headless=new".to_string());
            args.push("--window-size=1280,900".to_string());
        }
        chrome_opts.insert("args".to_string(), serde_json::json!(args));

        caps.insert("browserName".to_string(), serde_json::json!("chrome"));
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!(chrome_opts),
        );

        tracing::trace!(target: "automation_task", "WebDriver capabilities: {:?}", caps);

        let mut builder = ClientBuilder::native();
        builder.capabilities(caps);

        match builder.connect(&config.webdriver_url).await {
            Ok(client) => {
                tracing::info!(target: "automation_task", "WebDriver client connected successfully.");
                Ok(Self { client })
            }
            Err(e) => {
                tracing::error!(
                    target: "automation_task",
                    "Failed to connect to WebDriver at {}: {}",
                    config.webdriver_url,
                    e
                );
                Err(e.into())
            }
        }
    }
}

impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn wait_for_element(&mut self, selector: &str, timeout: Duration) -> Result<WaitOutcome> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(WaitOutcome::Found),
            Err(CmdError::WaitTimeout) => Ok(WaitOutcome::TimedOut),
            Err(e) => Err(e.into()),
        }
    }

    async fn wait_and_click(&mut self, selector: &str, timeout: Duration) -> Result<WaitOutcome> {
        let element = match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(element) => element,
            Err(CmdError::WaitTimeout) => return Ok(WaitOutcome::TimedOut),
            Err(e) => return Err(e.into()),
        };
        element.click().await?;
        Ok(WaitOutcome::Found)
    }

    async fn close(&mut self) -> Result<()> {
        // Client handles are cheap clones over one connection; closing any of
        // them ends the WebDriver session.
        self.client.clone().close().await?;
        Ok(())
    }
}

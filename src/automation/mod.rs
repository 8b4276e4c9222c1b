//! Browser automation seam and the messaging-session state machine built on it.

pub mod webdriver;
pub mod whatsapp;

use crate::core::error::Result;
use std::time::Duration;

/// Outcome of a bounded wait against the browser.
///
/// A timeout is a per-number result, not an error; engine-level failures come
/// back through `Err` and abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Found,
    TimedOut,
}

/// The operations the session automaton needs from a browser.
///
/// Implemented by [`webdriver::WebDriverSession`] for real runs and by scripted
/// fakes in tests. `close` must be safe to call exactly once on every exit path.
pub trait BrowserSession: Send {
    fn navigate(&mut self, url: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Polls until an element matching the CSS selector appears, or the timeout
    /// elapses.
    fn wait_for_element(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<WaitOutcome>> + Send;

    /// Polls for an element matching the CSS selector and clicks it when found.
    fn wait_and_click(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<WaitOutcome>> + Send;

    fn close(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;
}

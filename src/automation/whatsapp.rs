//! The messaging-session state machine: login detection, per-number reachability
//! probing, and per-number message sending.

use super::{BrowserSession, WaitOutcome};
use crate::core::config::{get_random_send_pause, Config};
use crate::core::error::{AppError, Result};
use crate::core::models::{ProbeReport, Reachability, SendReport};
use crate::store::NumberStore;
use url::Url;

/// Marker present once the web client has an authenticated session.
const LOGGED_IN_MARKER: &str = r#"span[aria-hidden="true"][data-icon="lock-small"]"#;
/// Marker present once a conversation with the target number has opened.
const CONVERSATION_MARKER: &str = "header._amid";
/// The send control in a pre-filled conversation.
const SEND_BUTTON: &str = r#"button[aria-label="Send"]"#;

/// Phases of one automaton run, used for logging and terminal reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatonState {
    Starting,
    AwaitingLogin,
    LoggedIn,
    LoginFailed,
    Working,
    Done,
}

/// Drives one probe or send run against a browser session.
///
/// Both run shapes share the login phase and the teardown guarantee: the session
/// is closed exactly once on every exit path, including engine errors. A run is
/// never re-entered; callers serialize runs on the same browser profile through
/// the session gate.
pub struct SessionAutomaton<'a> {
    config: &'a Config,
    store: &'a dyn NumberStore,
    state: AutomatonState,
}

impl<'a> SessionAutomaton<'a> {
    pub fn new(config: &'a Config, store: &'a dyn NumberStore) -> Self {
        Self {
            config,
            store,
            state: AutomatonState::Starting,
        }
    }

    /// The phase the automaton is currently in.
    pub fn state(&self) -> AutomatonState {
        self.state
    }

    /// Checks reachability for every number still `Unknown`.
    pub async fn run_probe<S: BrowserSession>(mut self, mut session: S) -> Result<ProbeReport> {
        let result = self.probe_inner(&mut session).await;
        close_session(&mut session).await;
        result
    }

    /// Sends `message` to every number marked `Reachable`.
    pub async fn run_send<S: BrowserSession>(
        mut self,
        mut session: S,
        message: &str,
    ) -> Result<SendReport> {
        let result = self.send_inner(&mut session, message).await;
        close_session(&mut session).await;
        result
    }

    async fn probe_inner<S: BrowserSession>(&mut self, session: &mut S) -> Result<ProbeReport> {
        self.await_login(session, true).await?;
        self.state = AutomatonState::Working;

        let pending = self.store.valid_by_reachability(Reachability::Unknown)?;
        tracing::info!(
            target: "automation_task",
            "Probing {} numbers with unknown reachability",
            pending.len()
        );

        let mut report = ProbeReport::default();
        for record in &pending {
            let url = deep_link(self.config, &record.phone_number, None)?;
            session.navigate(&url).await?;

            match session
                .wait_for_element(CONVERSATION_MARKER, self.config.element_timeout)
                .await?
            {
                WaitOutcome::Found => {
                    self.store
                        .set_reachability(&record.phone_number, Reachability::Reachable)?;
                    report.reachable += 1;
                    tracing::debug!(
                        target: "automation_task",
                        "{} is reachable",
                        record.phone_number
                    );
                }
                WaitOutcome::TimedOut => {
                    self.store
                        .set_reachability(&record.phone_number, Reachability::Unreachable)?;
                    tracing::debug!(
                        target: "automation_task",
                        "{} did not open a conversation within {:?}",
                        record.phone_number,
                        self.config.element_timeout
                    );
                }
            }
            report.checked += 1;
        }

        self.state = AutomatonState::Done;
        tracing::info!(
            target: "automation_task",
            "Probe run completed: {} checked, {} reachable",
            report.checked,
            report.reachable
        );
        Ok(report)
    }

    async fn send_inner<S: BrowserSession>(
        &mut self,
        session: &mut S,
        message: &str,
    ) -> Result<SendReport> {
        // Sending never blocks on interactive login; an expired session is a
        // hard failure for the whole run
        self.await_login(session, false).await?;
        self.state = AutomatonState::Working;

        let recipients = self.store.valid_by_reachability(Reachability::Reachable)?;
        tracing::info!(
            target: "automation_task",
            "Broadcasting to {} reachable numbers",
            recipients.len()
        );

        let mut report = SendReport::default();
        for record in &recipients {
            let url = deep_link(self.config, &record.phone_number, Some(message))?;
            session.navigate(&url).await?;
            report.attempted += 1;

            match session
                .wait_and_click(SEND_BUTTON, self.config.element_timeout)
                .await?
            {
                WaitOutcome::Found => {
                    report.sent += 1;
                }
                WaitOutcome::TimedOut => {
                    tracing::warn!(
                        target: "automation_task",
                        "Failed to send message to {}",
                        record.phone_number
                    );
                }
            }

            tokio::time::sleep(get_random_send_pause(self.config)).await;
        }

        self.state = AutomatonState::Done;
        tracing::info!(
            target: "automation_task",
            "Send run completed: {} of {} sends succeeded",
            report.sent,
            report.attempted
        );
        Ok(report)
    }

    /// Navigates to the web client and waits for the logged-in marker. With
    /// `allow_interactive`, a miss on the quick check is retried with the long
    /// timeout so a login code can be scanned.
    async fn await_login<S: BrowserSession>(
        &mut self,
        session: &mut S,
        allow_interactive: bool,
    ) -> Result<()> {
        self.state = AutomatonState::AwaitingLogin;
        session.navigate(&self.config.messaging_base_url).await?;

        match session
            .wait_for_element(LOGGED_IN_MARKER, self.config.login_check_timeout)
            .await?
        {
            WaitOutcome::Found => {
                self.state = AutomatonState::LoggedIn;
                tracing::info!(target: "automation_task", "Already logged in to the web client");
                return Ok(());
            }
            WaitOutcome::TimedOut if !allow_interactive => {
                self.state = AutomatonState::LoginFailed;
                tracing::error!(target: "automation_task", "Session expired; aborting send run");
                return Err(AppError::LoginFailed);
            }
            WaitOutcome::TimedOut => {}
        }

        tracing::info!(target: "automation_task", "Please scan the login code to log in");
        match session
            .wait_for_element(LOGGED_IN_MARKER, self.config.login_interactive_timeout)
            .await?
        {
            WaitOutcome::Found => {
                self.state = AutomatonState::LoggedIn;
                tracing::info!(target: "automation_task", "Login successful");
                Ok(())
            }
            WaitOutcome::TimedOut => {
                self.state = AutomatonState::LoginFailed;
                tracing::error!(target: "automation_task", "Could not log in to the web client");
                Err(AppError::LoginFailed)
            }
        }
    }
}

/// Builds the per-number deep link, optionally pre-filling the message text.
fn deep_link(config: &Config, phone_number: &str, text: Option<&str>) -> Result<String> {
    let mut url = Url::parse(&config.messaging_base_url)?;
    url.set_path("/send");
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("phone", phone_number);
        if let Some(text) = text {
            query.append_pair("text", text);
        }
    }
    Ok(url.into())
}

async fn close_session<S: BrowserSession>(session: &mut S) {
    if let Err(e) = session.close().await {
        tracing::warn!(
            target: "automation_task",
            "Failed to close the browser session cleanly: {}",
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigBuilder;
    use crate::core::models::PhoneRecord;
    use crate::store::{MemoryStore, NumberStore};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Scripted step for a fake wait: found, timed out, or an engine failure.
    #[derive(Clone, Copy)]
    enum Scripted {
        Found,
        TimedOut,
        Fail,
    }

    #[derive(Default)]
    struct FakeSession {
        waits: VecDeque<Scripted>,
        clicks: VecDeque<Scripted>,
        navigations: Arc<parking_lot::Mutex<Vec<String>>>,
        closed: Arc<AtomicUsize>,
    }

    fn engine_error() -> AppError {
        fantoccini::error::CmdError::NotW3C(serde_json::json!("boom")).into()
    }

    impl BrowserSession for FakeSession {
        async fn navigate(&mut self, url: &str) -> Result<()> {
            self.navigations.lock().push(url.to_string());
            Ok(())
        }

        async fn wait_for_element(
            &mut self,
            _selector: &str,
            _timeout: Duration,
        ) -> Result<WaitOutcome> {
            match self.waits.pop_front().unwrap_or(Scripted::TimedOut) {
                Scripted::Found => Ok(WaitOutcome::Found),
                Scripted::TimedOut => Ok(WaitOutcome::TimedOut),
                Scripted::Fail => Err(engine_error()),
            }
        }

        async fn wait_and_click(
            &mut self,
            _selector: &str,
            _timeout: Duration,
        ) -> Result<WaitOutcome> {
            match self.clicks.pop_front().unwrap_or(Scripted::TimedOut) {
                Scripted::Found => Ok(WaitOutcome::Found),
                Scripted::TimedOut => Ok(WaitOutcome::TimedOut),
                Scripted::Fail => Err(engine_error()),
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_config() -> Config {
        ConfigBuilder::new()
            .send_pause(0.0, 0.0)
            .build()
            .expect("test config")
    }

    fn seeded_store(records: &[(&str, Reachability)]) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert_valid(
                &records
                    .iter()
                    .map(|(n, _)| PhoneRecord::new(*n, "France"))
                    .collect::<Vec<_>>(),
            )
            .unwrap();
        for (number, reachability) in records {
            store.set_reachability(number, *reachability).unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_login_failure_processes_nothing_and_closes_once() {
        let config = test_config();
        let store = seeded_store(&[("33611111111", Reachability::Unknown)]);
        let mut session = FakeSession::default();
        // Both the quick check and the interactive wait miss
        session.waits = VecDeque::from(vec![Scripted::TimedOut, Scripted::TimedOut]);
        let closed = Arc::clone(&session.closed);

        let automaton = SessionAutomaton::new(&config, &store);
        let result = automaton.run_probe(session).await;
        assert!(matches!(result, Err(AppError::LoginFailed)));

        let still_unknown = store.valid_by_reachability(Reachability::Unknown).unwrap();
        assert_eq!(still_unknown.len(), 1);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_marks_reachable_and_unreachable() {
        let config = test_config();
        let store = seeded_store(&[
            ("33611111111", Reachability::Unknown),
            ("33622222222", Reachability::Unknown),
        ]);
        let mut session = FakeSession::default();
        // Login found, then first number opens a conversation, second times out
        session.waits = VecDeque::from(vec![Scripted::Found, Scripted::Found, Scripted::TimedOut]);
        let navigations = Arc::clone(&session.navigations);

        let report = SessionAutomaton::new(&config, &store)
            .run_probe(session)
            .await
            .unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.reachable, 1);

        let visited = navigations.lock();
        assert_eq!(visited[0], "https://web.whatsapp.com");
        assert_eq!(
            visited[1],
            "https://web.whatsapp.com/send?phone=33611111111"
        );
        assert_eq!(
            visited[2],
            "https://web.whatsapp.com/send?phone=33622222222"
        );
        drop(visited);

        let reachable = store
            .valid_by_reachability(Reachability::Reachable)
            .unwrap();
        assert_eq!(reachable[0].phone_number, "33611111111");
        let unreachable = store
            .valid_by_reachability(Reachability::Unreachable)
            .unwrap();
        assert_eq!(unreachable[0].phone_number, "33622222222");
        // Nothing is left at Unknown
        assert!(store
            .valid_by_reachability(Reachability::Unknown)
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_probe_engine_error_aborts_but_still_tears_down() {
        let config = test_config();
        let store = seeded_store(&[
            ("33611111111", Reachability::Unknown),
            ("33622222222", Reachability::Unknown),
        ]);
        let mut session = FakeSession::default();
        session.waits = VecDeque::from(vec![Scripted::Found, Scripted::Found, Scripted::Fail]);
        let closed = Arc::clone(&session.closed);

        let result = SessionAutomaton::new(&config, &store)
            .run_probe(session)
            .await;
        assert!(matches!(result, Err(AppError::WebDriverCmd(_))));
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        // The first number was still flipped before the failure
        assert_eq!(
            store
                .valid_by_reachability(Reachability::Reachable)
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_send_counts_successes_and_skips_timeouts() {
        let config = test_config();
        let store = seeded_store(&[
            ("33611111111", Reachability::Reachable),
            ("33622222222", Reachability::Reachable),
            ("33633333333", Reachability::Unreachable),
        ]);
        let mut session = FakeSession::default();
        session.waits = VecDeque::from(vec![Scripted::Found]);
        session.clicks = VecDeque::from(vec![Scripted::Found, Scripted::TimedOut]);

        let report = SessionAutomaton::new(&config, &store)
            .run_send(session, "hello there")
            .await
            .unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.sent, 1);
    }

    #[tokio::test]
    async fn test_send_login_check_never_waits_interactively() {
        let config = test_config();
        let store = seeded_store(&[("33611111111", Reachability::Reachable)]);
        let mut session = FakeSession::default();
        // A single timeout must fail the run; only one wait is consumed
        session.waits = VecDeque::from(vec![Scripted::TimedOut, Scripted::Found]);

        let result = SessionAutomaton::new(&config, &store)
            .run_send(session, "hello")
            .await;
        assert!(matches!(result, Err(AppError::LoginFailed)));
    }

    #[test]
    fn test_deep_link_encodes_message_text() {
        let config = test_config();
        let url = deep_link(&config, "33612345678", Some("salut & bienvenue")).unwrap();
        assert!(url.starts_with("https://web.whatsapp.com/send?phone=33612345678&text="));
        assert!(!url.contains(' '));
        assert!(!url.contains("& b"));

        let probe_url = deep_link(&config, "33612345678", None).unwrap();
        assert_eq!(
            probe_url,
            "https://web.whatsapp.com/send?phone=33612345678"
        );
    }
}

//! # Phone Reach Core Library
//!
//! This crate provides the core logic for ingesting spreadsheets of raw phone
//! numbers, normalizing and classifying them by country, deduplicating them
//! against a persistent store, and driving a browser session to probe which
//! numbers are reachable on the messaging platform and broadcast to them.
//!
//! It is designed to be used either directly as a library or via the
//! `phone-reach` command-line tool (which uses this library).

mod automation;
mod core;
mod intake;
mod sheet;
mod store;

pub use crate::automation::webdriver::WebDriverSession;
pub use crate::automation::whatsapp::{AutomatonState, SessionAutomaton};
pub use crate::automation::{BrowserSession, WaitOutcome};
pub use crate::core::config::{Config, ConfigBuilder, ConfigFile};
pub use crate::core::error::{AppError, Result};
pub use crate::core::models::{
    IntakeReport, PhoneRecord, ProbeReport, Reachability, RejectReason, RejectedRecord, SendReport,
};
pub use crate::sheet::{load_sheet, Sheet};
pub use crate::store::{MemoryStore, NumberStore, SqliteStore};

use std::sync::Arc;
use tokio::task::JoinHandle;

/// Serializes automaton runs on one browser profile: whoever holds the gate owns
/// the session. Probe and broadcast both acquire it, so concurrent triggers
/// queue instead of racing.
pub type SessionGate = Arc<tokio::sync::Mutex<()>>;

pub fn new_session_gate() -> SessionGate {
    Arc::new(tokio::sync::Mutex::new(()))
}

/// Runs the intake pipeline over a parsed sheet, synchronously within the
/// triggering call.
///
/// Returns the counts of newly inserted records and the post-insert totals, or
/// a `MalformedInput`/`Persistence` error.
pub fn run_intake(store: &dyn NumberStore, sheet: &Sheet) -> Result<IntakeReport> {
    intake::pipeline::run(store, sheet)
}

/// Starts a reachability probe in the background and returns immediately.
///
/// The caller gets a handle for the spawned task; completion is otherwise only
/// observable through the mutated reachability fields in the store and a
/// completion log line. Login failures and engine errors terminate the run and
/// are reported through logging, never to the original caller.
pub fn spawn_probe(
    config: Arc<Config>,
    store: Arc<dyn NumberStore>,
    gate: SessionGate,
) -> JoinHandle<Option<ProbeReport>> {
    tokio::spawn(async move {
        let _guard = gate.lock().await;
        tracing::info!(target: "automation_task", "Probe run acquired the browser session");

        let session = match WebDriverSession::connect(&config).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(target: "automation_task", "Probe run failed to start: {}", e);
                return None;
            }
        };

        let automaton = SessionAutomaton::new(&config, store.as_ref());
        match automaton.run_probe(session).await {
            Ok(report) => {
                tracing::info!(
                    target: "automation_task",
                    "Reachability check completed: {} checked, {} reachable",
                    report.checked,
                    report.reachable
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(target: "automation_task", "Probe run failed: {}", e);
                None
            }
        }
    })
}

/// Broadcasts `message` to every number currently marked reachable.
///
/// Unlike [`spawn_probe`] this runs to completion in the calling task and
/// returns the send counts; an expired login session is a hard failure.
pub async fn run_broadcast(
    config: &Config,
    store: &dyn NumberStore,
    gate: &SessionGate,
    message: &str,
) -> Result<SendReport> {
    if message.trim().is_empty() {
        return Err(AppError::MalformedInput(
            "Message content is required".to_string(),
        ));
    }

    let _guard = gate.lock().await;
    tracing::info!(target: "automation_task", "Broadcast run acquired the browser session");

    let session = WebDriverSession::connect(config).await?;
    SessionAutomaton::new(config, store)
        .run_send(session, message)
        .await
}

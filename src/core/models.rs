//! Data model: persisted phone records and the reports returned by each operation.

use serde::{Deserialize, Serialize};

/// Whether the messaging platform has confirmed a number as registered.
///
/// Transitions only from `Unknown` to one of the other two states, driven by the
/// probe phase of the session automaton. A re-run of the probe phase may overwrite
/// an earlier result, but nothing resets a number back to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reachability {
    Unknown,
    Reachable,
    Unreachable,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Unknown => "unknown",
            Reachability::Reachable => "reachable",
            Reachability::Unreachable => "unreachable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unknown" => Some(Reachability::Unknown),
            "reachable" => Some(Reachability::Reachable),
            "unreachable" => Some(Reachability::Unreachable),
            _ => None,
        }
    }
}

/// A successfully classified number. `phone_number` is the canonical digit string
/// (unique key within the valid collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub country: String,
    pub reachability: Reachability,
}

impl PhoneRecord {
    /// A freshly classified record; reachability starts unknown.
    pub fn new(phone_number: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            country: country.into(),
            reachability: Reachability::Unknown,
        }
    }
}

/// Why a raw value was routed to the invalid collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Normalization rejected the string outright.
    #[serde(rename = "Invalid format")]
    InvalidFormat,
    /// Normalization succeeded but no country could be determined.
    #[serde(rename = "No country detected")]
    NoCountryDetected,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidFormat => "Invalid format",
            RejectReason::NoCountryDetected => "No country detected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Invalid format" => Some(RejectReason::InvalidFormat),
            "No country detected" => Some(RejectReason::NoCountryDetected),
            _ => None,
        }
    }
}

/// An unclassifiable entry. `phone_number` is the best-effort normalized string,
/// falling back to the raw trimmed value (unique key within the invalid collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub reason: RejectReason,
}

/// Counts reported by one intake run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeReport {
    pub new_valid: usize,
    pub new_invalid: usize,
    pub total_valid: u64,
    pub total_invalid: u64,
}

/// Counts reported when a probe run completes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Numbers whose reachability was checked this run.
    pub checked: usize,
    /// Of those, how many the platform confirmed as registered.
    pub reachable: usize,
}

/// Counts reported by one broadcast run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendReport {
    /// Reachable numbers a send was attempted for.
    pub attempted: usize,
    /// Sends where the send control was found and clicked.
    pub sent: usize,
}

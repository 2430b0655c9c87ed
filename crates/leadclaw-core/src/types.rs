//! Contact domain model — the subset of CRM state the lifecycle core
//! reads and writes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// CRM property names for the outreach fields this core owns.
pub mod properties {
    pub const OUTREACH_STATUS: &str = "ai_outreach_status";
    pub const ATTEMPT_COUNT: &str = "ai_attempt_count";
    pub const NEXT_ATTEMPT_TIME: &str = "ai_next_attempt_time";
    pub const FOLLOWUP_STEP: &str = "ai_followup_step";
    pub const NEXT_FOLLOWUP_TIME: &str = "ai_next_followup_time";
    pub const CALL_OUTCOME: &str = "ai_call_outcome";
    pub const CALL_SUMMARY: &str = "ai_call_summary";
    pub const RECORDING_URL: &str = "ai_recording_url";
    pub const BOOKING_TIME: &str = "ai_call_booking_time";
    pub const LEAD_STATUS_HINT: &str = "hs_lead_status";
    // Legacy spelling preserved: this is the live CRM property name.
    pub const SEQUENCE_MARKER: &str = "enroll_in_sequance";

    pub const FIRST_NAME: &str = "firstname";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
}

/// Where a contact sits in the primary call-retry lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutreachStatus {
    /// Eligible for outreach (initial state, set by external enrollment).
    Pending,
    /// A call is in flight; waiting on the analyzed webhook.
    Calling,
    /// Terminal: outreach must never resume.
    HardStop,
    /// Terminal: retry attempts exhausted without a decision.
    Completed,
}

impl OutreachStatus {
    /// The CRM property value for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachStatus::Pending => "Pending",
            OutreachStatus::Calling => "Calling",
            OutreachStatus::HardStop => "Hard Stop",
            OutreachStatus::Completed => "Completed",
        }
    }

    /// Parse a CRM property value. Unknown values yield `None` — a contact
    /// with an unrecognized status is never selected by either lane.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(OutreachStatus::Pending),
            "Calling" => Some(OutreachStatus::Calling),
            "Hard Stop" => Some(OutreachStatus::HardStop),
            "Completed" => Some(OutreachStatus::Completed),
            _ => None,
        }
    }

    /// Terminal statuses exit the lifecycle: no lane may select the contact.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutreachStatus::HardStop | OutreachStatus::Completed)
    }
}

impl std::fmt::Display for OutreachStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lead-source classification attached to each outbound call as call-time
/// context for the AI agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadSource {
    MetaAd,
    HubspotWarm,
}

impl LeadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::MetaAd => "META_AD",
            LeadSource::HubspotWarm => "HUBSPOT_WARM",
        }
    }

    /// Classify from the upstream lead-status hint. Total over all inputs:
    /// unknown or missing hints fall through to the default.
    pub fn classify(hint: Option<&str>) -> Self {
        match hint {
            Some("ATTEMPTED_TO_CONTACT") | Some("BAD_TIMING") => LeadSource::HubspotWarm,
            _ => LeadSource::MetaAd,
        }
    }
}

/// A contact snapshot read from the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Opaque CRM record id, stable for the contact lifetime.
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Upstream categorical signal driving lead-source classification.
    #[serde(default)]
    pub lead_status_hint: Option<String>,
    /// `None` when the CRM field is absent or unrecognized; such contacts
    /// are invisible to both lanes but still resolvable by email.
    #[serde(default)]
    pub outreach_status: Option<OutreachStatus>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default)]
    pub next_attempt_time: Option<DateTime<Utc>>,
    #[serde(default = "default_followup_step")]
    pub followup_step: u32,
    #[serde(default)]
    pub next_followup_time: Option<DateTime<Utc>>,
}

fn default_followup_step() -> u32 {
    1
}

impl Contact {
    /// First name as spoken to the contact, with the standard fallback.
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("there")
    }
}

/// Typed patch persisted through `ContactStore::update`.
///
/// Time fields are double-optional: the outer `Option` means "touch this
/// field", the inner one distinguishes setting a value from clearing it
/// (cleared fields are written as empty strings, which is how the CRM
/// unsets a datetime property).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactUpdate {
    pub outreach_status: Option<OutreachStatus>,
    pub attempt_count: Option<u32>,
    pub next_attempt_time: Option<Option<DateTime<Utc>>>,
    pub followup_step: Option<u32>,
    pub next_followup_time: Option<Option<DateTime<Utc>>>,
    pub call_outcome: Option<String>,
    pub call_summary: Option<String>,
    pub recording_url: Option<String>,
    pub booking_time: Option<Option<String>>,
    pub sequence_complete: bool,
}

impl ContactUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OutreachStatus) -> Self {
        self.outreach_status = Some(status);
        self
    }

    pub fn attempt_count(mut self, count: u32) -> Self {
        self.attempt_count = Some(count);
        self
    }

    /// `None` clears the field in the CRM.
    pub fn next_attempt_time(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.next_attempt_time = Some(at);
        self
    }

    pub fn followup_step(mut self, step: u32) -> Self {
        self.followup_step = Some(step);
        self
    }

    pub fn next_followup_time(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.next_followup_time = Some(at);
        self
    }

    pub fn call_outcome(mut self, outcome: &str) -> Self {
        self.call_outcome = Some(outcome.to_string());
        self
    }

    pub fn call_summary(mut self, summary: &str) -> Self {
        self.call_summary = Some(summary.to_string());
        self
    }

    pub fn recording_url(mut self, url: &str) -> Self {
        self.recording_url = Some(url.to_string());
        self
    }

    /// `None` clears the field in the CRM, so a value from an earlier call
    /// never outlives the call that produced it.
    pub fn booking_time(mut self, at: Option<&str>) -> Self {
        self.booking_time = Some(at.map(String::from));
        self
    }

    /// Mark the follow-up sequence finished without a booking.
    pub fn sequence_complete(mut self) -> Self {
        self.sequence_complete = true;
        self
    }

    /// Flatten into CRM property name/value pairs.
    pub fn to_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = Vec::new();
        if let Some(status) = self.outreach_status {
            props.push((properties::OUTREACH_STATUS, status.as_str().to_string()));
        }
        if let Some(count) = self.attempt_count {
            props.push((properties::ATTEMPT_COUNT, count.to_string()));
        }
        if let Some(at) = self.next_attempt_time {
            props.push((properties::NEXT_ATTEMPT_TIME, format_time(at)));
        }
        if let Some(step) = self.followup_step {
            props.push((properties::FOLLOWUP_STEP, step.to_string()));
        }
        if let Some(at) = self.next_followup_time {
            props.push((properties::NEXT_FOLLOWUP_TIME, format_time(at)));
        }
        if let Some(outcome) = &self.call_outcome {
            props.push((properties::CALL_OUTCOME, outcome.clone()));
        }
        if let Some(summary) = &self.call_summary {
            props.push((properties::CALL_SUMMARY, summary.clone()));
        }
        if let Some(url) = &self.recording_url {
            props.push((properties::RECORDING_URL, url.clone()));
        }
        if let Some(at) = &self.booking_time {
            props.push((properties::BOOKING_TIME, at.clone().unwrap_or_default()));
        }
        if self.sequence_complete {
            props.push((properties::SEQUENCE_MARKER, "sequence_complete_no_booking".to_string()));
        }
        props
    }
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::new(),
    }
}

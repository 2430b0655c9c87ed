//! Inbound webhook payloads, validated at the boundary.
//!
//! Providers send loosely-shaped JSON; everything is parsed into explicit
//! tagged variants here, before any state-machine code runs. A payload
//! that fails validation parses to `None` — the HTTP layer acknowledges
//! it and drops it, since there is nothing to reconcile.

use serde_json::Value;

/// A validated inbound event, ready for the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    CallAnalyzed(CallAnalysis),
    BookingConfirmed { email: String },
}

/// Fields extracted from a call-analyzed dialer event. `contact_id` and
/// `attempt_number` are the correlation metadata attached when the call
/// was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct CallAnalysis {
    pub contact_id: String,
    pub attempt_number: u32,
    pub outcome: String,
    pub summary: String,
    pub recording_url: String,
    /// Passed through verbatim — the agent already emits the correct
    /// local ISO format, no timezone conversion here.
    pub booking_time: Option<String>,
}

/// Parse the dialer provider's webhook body. Only `call_analyzed` events
/// with correlation metadata are reconcilable.
pub fn parse_call_webhook(body: &Value) -> Option<InboundEvent> {
    if body["event"].as_str()? != "call_analyzed" {
        return None;
    }
    let call = body.get("call")?;
    let metadata = call.get("metadata")?;
    let contact_id = metadata["contact_id"]
        .as_str()
        .map(String::from)
        .or_else(|| metadata["contact_id"].as_u64().map(|n| n.to_string()))?;
    let attempt_number = metadata["attempt_number"]
        .as_u64()
        .or_else(|| metadata["attempt_number"].as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(0) as u32;

    let analysis = &call["call_analysis"];
    let custom = &analysis["custom_analysis_data"];
    Some(InboundEvent::CallAnalyzed(CallAnalysis {
        contact_id,
        attempt_number,
        outcome: custom["ai_call_outcome"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("No Outcome")
            .to_string(),
        summary: analysis["call_summary"]
            .as_str()
            .filter(|s| !s.is_empty())
            .unwrap_or("No summary provided")
            .to_string(),
        recording_url: call["recording_url"].as_str().unwrap_or("").to_string(),
        booking_time: custom["ai_call_booking_time"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(String::from),
    }))
}

/// Parse the calendar provider's booking webhook: the first attendee's
/// email identifies the contact.
pub fn parse_booking_webhook(body: &Value) -> Option<InboundEvent> {
    let attendees = body["payload"]["attendees"].as_array()?;
    let email = attendees.first()?["email"].as_str()?;
    if email.is_empty() {
        return None;
    }
    Some(InboundEvent::BookingConfirmed { email: email.to_string() })
}

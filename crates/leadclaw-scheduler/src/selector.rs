//! Lead selection — pure, side-effect-free eligibility filters for both
//! lanes, plus phone normalization. No cross-contact ordering guarantee.

use chrono::{DateTime, Utc};

use leadclaw_core::types::{Contact, OutreachStatus};

/// Batch cap per cycle. Matches the upstream API page limit; not an
/// architectural limit.
pub const BATCH_LIMIT: usize = 100;

/// Primary lane: `Pending`, due (no next-attempt time or at/past it), and
/// callable. Already-`Calling` contacts fall out here, which is what makes
/// a re-entrant tick safe.
pub fn eligible_for_call(contact: &Contact, now: DateTime<Utc>) -> bool {
    let pending = contact.outreach_status == Some(OutreachStatus::Pending);
    let due = contact.next_attempt_time.is_none_or(|t| t <= now);
    let callable = contact.phone.as_deref().is_some_and(|p| !p.trim().is_empty());
    pending && due && callable
}

/// Follow-up lane: `Pending` with a follow-up time strictly in the past.
pub fn eligible_for_followup(contact: &Contact, now: DateTime<Utc>) -> bool {
    contact.outreach_status == Some(OutreachStatus::Pending)
        && contact.next_followup_time.is_some_and(|t| t < now)
}

pub fn select_primary(contacts: &[Contact], now: DateTime<Utc>) -> Vec<&Contact> {
    contacts
        .iter()
        .filter(|c| eligible_for_call(c, now))
        .take(BATCH_LIMIT)
        .collect()
}

pub fn select_followup(contacts: &[Contact], now: DateTime<Utc>) -> Vec<&Contact> {
    contacts
        .iter()
        .filter(|c| eligible_for_followup(c, now))
        .take(BATCH_LIMIT)
        .collect()
}

/// Normalize toward E.164: strip whitespace, prefix `+` if absent. No
/// further validation — a malformed number surfaces as a dialer error and
/// is handled per contact.
pub fn normalize_e164(phone: &str) -> String {
    let stripped: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.starts_with('+') {
        stripped
    } else {
        format!("+{stripped}")
    }
}

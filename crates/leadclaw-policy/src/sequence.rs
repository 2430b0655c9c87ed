//! Follow-up sequence timeline.
//!
//! Five fixed steps alternating SMS and email. Delays are absolute
//! hours-from-enrollment: when advancing to step *k+1*, the next fire time
//! is `now + timeline[k+1].delay_hours` (the single documented semantic —
//! never a delta between successive steps).

use chrono::{DateTime, Duration, Utc};
use url::Url;

/// Delivery channel for one timeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowupChannel {
    Sms,
    Email,
}

/// One entry in the timeline. 1-indexed, matching the CRM step property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowupStep {
    pub step: u32,
    pub delay_hours: f64,
    pub channel: FollowupChannel,
}

/// Last step of the sequence; reaching it forces a terminal transition.
pub const MAX_STEP: u32 = 5;

const TIMELINE: [FollowupStep; 5] = [
    FollowupStep { step: 1, delay_hours: 0.0, channel: FollowupChannel::Sms },
    FollowupStep { step: 2, delay_hours: 0.5, channel: FollowupChannel::Email },
    FollowupStep { step: 3, delay_hours: 24.0, channel: FollowupChannel::Sms },
    FollowupStep { step: 4, delay_hours: 48.0, channel: FollowupChannel::Email },
    FollowupStep { step: 5, delay_hours: 72.0, channel: FollowupChannel::Email },
];

/// Static, ordered lookup over the timeline.
pub struct FollowupSequence;

impl FollowupSequence {
    pub fn step_at(step: u32) -> Option<&'static FollowupStep> {
        TIMELINE.iter().find(|s| s.step == step)
    }

    pub fn next_step_after(step: u32) -> Option<&'static FollowupStep> {
        Self::step_at(step + 1)
    }

    /// Fire time for a step being scheduled now. Sub-hour delays are kept
    /// at minute precision (step 2 fires 30 minutes after scheduling).
    pub fn next_fire_time(step: &FollowupStep, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes((step.delay_hours * 60.0) as i64)
    }
}

/// SMS body for the given step. Pure: same inputs, same text. Returns
/// `None` for steps that go out by email.
pub fn render_sms(step: u32, first_name: &str, booking_link: &str) -> Option<String> {
    match step {
        1 => Some(format!(
            "Hi {first_name}, sorry we missed you! I'd love to chat. You can book a time here: {booking_link}"
        )),
        3 => Some(format!(
            "Hey {first_name}, just a quick reminder to grab a slot for our session if you're still interested! {booking_link}"
        )),
        _ => None,
    }
}

/// Booking link carrying contact identity and step-specific UTM
/// attribution, percent-encoded. Falls back to the bare base URL if it
/// does not parse.
pub fn booking_link(base: &str, first_name: &str, email: &str, step: u32) -> String {
    let utm = format!("followup_step{step}");
    let params = [
        ("name", first_name),
        ("email", email),
        ("utm_source", utm.as_str()),
    ];
    match Url::parse_with_params(base, &params) {
        Ok(url) => url.into(),
        Err(_) => base.to_string(),
    }
}

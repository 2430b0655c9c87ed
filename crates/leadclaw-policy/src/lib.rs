//! # LeadClaw Policy
//!
//! The two pure leaves of the outreach lifecycle: the call-retry backoff
//! table and the follow-up sequence timeline. No IO, no clock access —
//! callers pass `now` in, so every decision is reproducible in tests.

pub mod retry;
pub mod sequence;

pub use retry::{NextAttempt, RetryPolicy};
pub use sequence::{FollowupChannel, FollowupSequence, FollowupStep, MAX_STEP};

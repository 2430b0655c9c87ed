//! # LeadClaw Scheduler
//!
//! The outreach lifecycle core: pure lead selection over contact
//! snapshots, the two-lane tick (primary call-retry + follow-up
//! sequence), and the fixed-cadence poller loop that drives it.
//!
//! ## Architecture
//! ```text
//! Poller (tokio interval, default 120s)
//!   └── LifecycleScheduler::try_tick (non-overlapping)
//!         ├── Primary lane: ContactStore list → selector filter
//!         │     → classify lead source → Dialer.place_call
//!         │     → persist Calling + attempt_count (before next tick)
//!         └── Follow-up lane: ContactStore search → selector filter
//!               → SMS/email step dispatch → advance step or Hard Stop
//! ```
//! Per-contact failures never abort a batch; each tick returns a
//! `TickReport` of what happened.

pub mod engine;
pub mod lifecycle;
pub mod selector;

pub use engine::spawn_poller;
pub use lifecycle::{ContactFailure, LifecycleScheduler, TickReport};

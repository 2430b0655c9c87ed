//! # LeadClaw Gateway
//!
//! The inbound HTTP surface: health probe plus the two outcome webhooks
//! (call analyzed, booking confirmed). Payloads are validated into tagged
//! event types at the boundary; the reconciler applies the resulting
//! transitions through the contact store. Every webhook is acknowledged
//! with 200 regardless of internal outcome — the senders retry on
//! anything else, and retry storms are worse than a dropped event.

pub mod events;
pub mod reconciler;
pub mod server;

pub use events::{CallAnalysis, InboundEvent};
pub use reconciler::WebhookReconciler;
pub use server::{AppState, build_router, serve};

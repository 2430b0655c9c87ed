//! # LeadClaw Core
//!
//! Shared foundation for the LeadClaw workspace: configuration, the
//! workspace-wide error type, the contact domain model, and the boundary
//! traits that seam the lifecycle core off from its external collaborators
//! (CRM, dialer, SMS, email, clock).

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::LeadClawConfig;
pub use error::{LeadClawError, Result};
pub use traits::{CallHandle, CallRequest, Clock, ContactStore, Dialer, EmailSender, SmsSender, SystemClock};
pub use types::{Contact, ContactUpdate, LeadSource, OutreachStatus};

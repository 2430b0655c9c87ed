//! # LeadClaw Channels
//!
//! Outbound channel adapters. Each vendor module follows the same shape:
//! a config struct, a client wrapping `reqwest`, and an implementation of
//! the corresponding `leadclaw-core` capability trait. Message rendering
//! is kept in pure functions so templates are testable without IO.

pub mod email;
pub mod retell;
pub mod twilio;

pub use email::ResendMailer;
pub use retell::RetellDialer;
pub use twilio::TwilioSms;

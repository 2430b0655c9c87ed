//! LeadClaw error types.

use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, LeadClawError>;

/// All errors produced by LeadClaw crates. Adapters wrap their HTTP and
/// decoding failures into `Crm`/`Channel` strings with request context.
///
/// Nothing here is fatal to the process: the poller and the webhook
/// handlers catch at the per-contact / per-event level and keep going.
#[derive(Debug, Error)]
pub enum LeadClawError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("CRM error: {0}")]
    Crm(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

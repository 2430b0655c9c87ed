//! Boundary traits between the lifecycle core and its external
//! collaborators. Adapters live in `leadclaw-crm` / `leadclaw-channels`;
//! tests supply hand-rolled mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{Contact, ContactUpdate, LeadSource};

/// Supplies the current time. Injected so all delay math is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The external CRM that owns contact state. Correctness of the lifecycle
/// depends on per-record updates being atomic and read-after-write visible.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// One page of the calling segment (the upstream API caps page size).
    async fn list_eligible_primary(&self) -> Result<Vec<Contact>>;

    /// Contacts enrolled in the follow-up sequence whose next step is due
    /// before `now`.
    async fn search_eligible_followup(&self, now: DateTime<Utc>) -> Result<Vec<Contact>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>>;

    async fn update(&self, contact_id: &str, update: ContactUpdate) -> Result<()>;
}

/// Call-time context and correlation metadata for one outbound call.
/// `contact_id` + `attempt_number` come back on the analyzed webhook and
/// are the only way to match it to this call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub contact_id: String,
    pub attempt_number: u32,
    /// E.164-normalized destination.
    pub to_number: String,
    pub first_name: String,
    pub email: Option<String>,
    pub lead_source: LeadSource,
}

/// Provider handle for an initiated call.
#[derive(Debug, Clone)]
pub struct CallHandle {
    pub call_id: String,
}

/// Outbound AI phone-call capability.
#[async_trait]
pub trait Dialer: Send + Sync {
    async fn place_call(&self, request: CallRequest) -> Result<CallHandle>;
}

/// Outbound SMS capability. Returns the provider message id.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String>;
}

/// Outbound follow-up email capability.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_followup(
        &self,
        to: &str,
        first_name: &str,
        step: u32,
        booking_link: &str,
    ) -> Result<()>;
}

//! Webhook reconciliation — terminal and corrective transitions applied
//! outside the polling cadence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use leadclaw_core::error::Result;
use leadclaw_core::traits::{Clock, ContactStore};
use leadclaw_core::types::{ContactUpdate, OutreachStatus};
use leadclaw_policy::retry::{NextAttempt, RetryPolicy};

use crate::events::{CallAnalysis, InboundEvent};

/// Primary-lane transition computed from a call outcome and the attempt
/// number it belonged to.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub status: OutreachStatus,
    pub next_attempt_time: Option<DateTime<Utc>>,
}

/// Pure transition logic. This is the only path that returns a contact to
/// `Pending` for a further attempt; hard-stop outcomes and exhaustion both
/// clear the schedule.
pub fn resolve_transition(outcome: &str, attempt_number: u32, now: DateTime<Utc>) -> Transition {
    if RetryPolicy::is_hard_stop(outcome) {
        return Transition {
            status: OutreachStatus::HardStop,
            next_attempt_time: None,
        };
    }
    match RetryPolicy::next_eligible_time(attempt_number, now) {
        NextAttempt::At(at) => Transition {
            status: OutreachStatus::Pending,
            next_attempt_time: Some(at),
        },
        NextAttempt::Exhausted => Transition {
            status: OutreachStatus::Completed,
            next_attempt_time: None,
        },
    }
}

pub struct WebhookReconciler {
    store: Arc<dyn ContactStore>,
    clock: Arc<dyn Clock>,
}

impl WebhookReconciler {
    pub fn new(store: Arc<dyn ContactStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Apply a validated inbound event. An error here is for logging only;
    /// the HTTP surface acknowledges the sender regardless.
    pub async fn apply(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::CallAnalyzed(analysis) => self.apply_call_analysis(analysis).await,
            InboundEvent::BookingConfirmed { email } => self.apply_booking(&email).await,
        }
    }

    async fn apply_call_analysis(&self, analysis: CallAnalysis) -> Result<()> {
        let transition =
            resolve_transition(&analysis.outcome, analysis.attempt_number, self.clock.now());
        tracing::info!(
            contact_id = %analysis.contact_id,
            attempt = analysis.attempt_number,
            outcome = %analysis.outcome,
            status = transition.status.as_str(),
            "📥 Call analyzed"
        );

        // Result fields are persisted unconditionally alongside the status;
        // an absent booking time clears whatever an earlier call left.
        let update = ContactUpdate::new()
            .status(transition.status)
            .next_attempt_time(transition.next_attempt_time)
            .call_outcome(&analysis.outcome)
            .call_summary(&analysis.summary)
            .recording_url(&analysis.recording_url)
            .booking_time(analysis.booking_time.as_deref());
        self.store.update(&analysis.contact_id, update).await
    }

    /// A confirmed booking overrides any in-flight retry schedule: all
    /// outreach stops, regardless of lane or attempt count.
    async fn apply_booking(&self, email: &str) -> Result<()> {
        match self.store.find_by_email(email).await? {
            Some(contact) => {
                self.store
                    .update(
                        &contact.id,
                        ContactUpdate::new()
                            .status(OutreachStatus::HardStop)
                            .call_outcome("Interested"),
                    )
                    .await?;
                tracing::info!(contact_id = %contact.id, %email, "🛑 Booking confirmed; outreach stopped");
                Ok(())
            }
            None => {
                tracing::info!(%email, "No contact found for confirmed booking");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use leadclaw_core::traits::FixedClock;
    use leadclaw_core::types::{Contact, properties};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_interested_is_hard_stop_with_cleared_schedule() {
        let t = resolve_transition("Interested", 2, now());
        assert_eq!(t.status, OutreachStatus::HardStop);
        assert_eq!(t.next_attempt_time, None);
    }

    #[test]
    fn test_no_outcome_attempt_one_retries_in_an_hour() {
        let t = resolve_transition("No Outcome", 1, now());
        assert_eq!(t.status, OutreachStatus::Pending);
        assert_eq!(t.next_attempt_time, Some(now() + Duration::hours(1)));
    }

    #[test]
    fn test_exhausted_attempts_complete() {
        let t = resolve_transition("No Outcome", 7, now());
        assert_eq!(t.status, OutreachStatus::Completed);
        assert_eq!(t.next_attempt_time, None);
    }

    #[test]
    fn test_hard_stop_wins_over_exhaustion() {
        let t = resolve_transition("Not Interested", 99, now());
        assert_eq!(t.status, OutreachStatus::HardStop);
    }

    struct MockStore {
        by_email: Option<Contact>,
        updates: Mutex<Vec<(String, ContactUpdate)>>,
    }

    impl MockStore {
        fn new(by_email: Option<Contact>) -> Self {
            Self { by_email, updates: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl ContactStore for MockStore {
        async fn list_eligible_primary(&self) -> Result<Vec<Contact>> {
            Ok(Vec::new())
        }
        async fn search_eligible_followup(&self, _now: DateTime<Utc>) -> Result<Vec<Contact>> {
            Ok(Vec::new())
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<Contact>> {
            Ok(self.by_email.clone())
        }
        async fn update(&self, contact_id: &str, update: ContactUpdate) -> Result<()> {
            self.updates.lock().unwrap().push((contact_id.to_string(), update));
            Ok(())
        }
    }

    fn calling_contact() -> Contact {
        Contact {
            id: "501".into(),
            first_name: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            phone: Some("+15550100".into()),
            lead_status_hint: None,
            outreach_status: Some(OutreachStatus::Calling),
            attempt_count: 2,
            next_attempt_time: None,
            followup_step: 1,
            next_followup_time: None,
        }
    }

    #[tokio::test]
    async fn test_call_analysis_persists_results_with_status() {
        let store = Arc::new(MockStore::new(None));
        let reconciler = WebhookReconciler::new(store.clone(), Arc::new(FixedClock(now())));

        reconciler
            .apply(InboundEvent::CallAnalyzed(CallAnalysis {
                contact_id: "501".into(),
                attempt_number: 1,
                outcome: "No Outcome".into(),
                summary: "Voicemail.".into(),
                recording_url: "https://rec/1".into(),
                booking_time: None,
            }))
            .await
            .unwrap();

        let updates = store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        let (id, update) = &updates[0];
        assert_eq!(id, "501");
        assert_eq!(update.outreach_status, Some(OutreachStatus::Pending));
        assert_eq!(update.next_attempt_time, Some(Some(now() + Duration::hours(1))));
        assert_eq!(update.call_outcome.as_deref(), Some("No Outcome"));
        assert_eq!(update.call_summary.as_deref(), Some("Voicemail."));
        assert_eq!(update.recording_url.as_deref(), Some("https://rec/1"));
    }

    #[tokio::test]
    async fn test_absent_booking_time_clears_stale_value() {
        let store = Arc::new(MockStore::new(None));
        let reconciler = WebhookReconciler::new(store.clone(), Arc::new(FixedClock(now())));

        // A later call without a booking must not leave the one from an
        // earlier call standing in the CRM.
        reconciler
            .apply(InboundEvent::CallAnalyzed(CallAnalysis {
                contact_id: "501".into(),
                attempt_number: 3,
                outcome: "No Outcome".into(),
                summary: "No answer.".into(),
                recording_url: String::new(),
                booking_time: None,
            }))
            .await
            .unwrap();

        let updates = store.updates.lock().unwrap();
        let update = &updates[0].1;
        assert_eq!(update.booking_time, Some(None));
        assert!(
            update
                .to_properties()
                .contains(&(properties::BOOKING_TIME, String::new()))
        );
    }

    #[tokio::test]
    async fn test_booking_confirmation_overrides_in_flight_call() {
        let store = Arc::new(MockStore::new(Some(calling_contact())));
        let reconciler = WebhookReconciler::new(store.clone(), Arc::new(FixedClock(now())));

        reconciler
            .apply(InboundEvent::BookingConfirmed { email: "ana@example.com".into() })
            .await
            .unwrap();

        let updates = store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.outreach_status, Some(OutreachStatus::HardStop));
        assert_eq!(updates[0].1.call_outcome.as_deref(), Some("Interested"));
    }

    #[tokio::test]
    async fn test_booking_for_unknown_email_is_a_noop() {
        let store = Arc::new(MockStore::new(None));
        let reconciler = WebhookReconciler::new(store.clone(), Arc::new(FixedClock(now())));

        reconciler
            .apply(InboundEvent::BookingConfirmed { email: "ghost@example.com".into() })
            .await
            .unwrap();
        assert!(store.updates.lock().unwrap().is_empty());
    }
}

//! The lifecycle tick — one sequential pass over both outreach lanes.
//!
//! Contacts are processed one at a time so each status write lands before
//! the next contact is considered; that sequential discipline, plus the
//! immediate `Calling` write after call initiation, is what prevents
//! duplicate calls — there is no explicit lock around contacts.

use std::sync::Arc;

use uuid::Uuid;

use leadclaw_core::error::{LeadClawError, Result};
use leadclaw_core::traits::{CallRequest, Clock, ContactStore, Dialer, EmailSender, SmsSender};
use leadclaw_core::types::{Contact, ContactUpdate, LeadSource, OutreachStatus};
use leadclaw_policy::sequence::{self, FollowupChannel, FollowupSequence, MAX_STEP};

use crate::selector;

/// A per-contact failure recorded during a tick. Failures leave the
/// contact unmutated (or partially mutated per the step's contract) and
/// never abort the batch.
#[derive(Debug, Clone)]
pub struct ContactFailure {
    pub contact_id: String,
    /// Which lane stage failed: "call" or "followup".
    pub stage: &'static str,
    pub message: String,
}

/// What one tick did, keyed by a correlation id that appears in every log
/// line of the cycle.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick_id: Uuid,
    pub calls_placed: usize,
    pub followups_sent: usize,
    pub failures: Vec<ContactFailure>,
}

/// The orchestrating loop body: decides actions for every eligible contact
/// in each lane and persists the resulting transitions.
pub struct LifecycleScheduler {
    store: Arc<dyn ContactStore>,
    dialer: Arc<dyn Dialer>,
    sms: Arc<dyn SmsSender>,
    email: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    booking_url: String,
    /// Guards against overlapping ticks when a cycle outlasts the cadence.
    tick_gate: tokio::sync::Mutex<()>,
}

impl LifecycleScheduler {
    pub fn new(
        store: Arc<dyn ContactStore>,
        dialer: Arc<dyn Dialer>,
        sms: Arc<dyn SmsSender>,
        email: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        booking_url: String,
    ) -> Self {
        Self {
            store,
            dialer,
            sms,
            email,
            clock,
            booking_url,
            tick_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one tick, waiting if another is in progress.
    pub async fn run_tick(&self) -> TickReport {
        let _guard = self.tick_gate.lock().await;
        self.tick_inner().await
    }

    /// Run one tick unless a previous one is still running, in which case
    /// the cycle is skipped (the next tick re-evaluates the same state).
    pub async fn try_tick(&self) -> Option<TickReport> {
        let Ok(_guard) = self.tick_gate.try_lock() else {
            return None;
        };
        Some(self.tick_inner().await)
    }

    async fn tick_inner(&self) -> TickReport {
        let tick_id = Uuid::new_v4();
        let mut report = TickReport {
            tick_id,
            calls_placed: 0,
            followups_sent: 0,
            failures: Vec::new(),
        };
        tracing::info!(%tick_id, "⏱️ Poller cycle start");

        self.run_primary_lane(&mut report).await;
        self.run_followup_lane(&mut report).await;

        tracing::info!(
            %tick_id,
            calls = report.calls_placed,
            followups = report.followups_sent,
            failures = report.failures.len(),
            "⏱️ Poller cycle end"
        );
        report
    }

    async fn run_primary_lane(&self, report: &mut TickReport) {
        // A fetch error degrades to an empty batch; the poller never dies.
        let batch = match self.store.list_eligible_primary().await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(tick_id = %report.tick_id, "⚠️ Primary lane fetch failed: {e}");
                Vec::new()
            }
        };
        let due = selector::select_primary(&batch, self.clock.now());
        tracing::info!(
            tick_id = %report.tick_id,
            candidates = batch.len(),
            due = due.len(),
            "Primary lane: contacts ready for calls"
        );

        for contact in due {
            match self.place_call(contact).await {
                Ok(call_id) => {
                    report.calls_placed += 1;
                    tracing::info!(contact_id = %contact.id, %call_id, "✅ Call initiated");
                }
                Err(e) => {
                    // No state mutation: indistinguishable from not-yet-tried,
                    // so the contact is naturally retried next cycle.
                    tracing::warn!(contact_id = %contact.id, "⚠️ Call attempt failed: {e}");
                    report.failures.push(ContactFailure {
                        contact_id: contact.id.clone(),
                        stage: "call",
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    async fn run_followup_lane(&self, report: &mut TickReport) {
        let now = self.clock.now();
        let batch = match self.store.search_eligible_followup(now).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(tick_id = %report.tick_id, "⚠️ Follow-up lane fetch failed: {e}");
                Vec::new()
            }
        };
        // The store already filters server-side; re-filtering is idempotent
        // and keeps the eligibility contract in one place.
        let due = selector::select_followup(&batch, now);
        tracing::info!(
            tick_id = %report.tick_id,
            due = due.len(),
            "Follow-up lane: contacts due for a sequence step"
        );

        for contact in due {
            match self.advance_followup(contact).await {
                Ok(()) => report.followups_sent += 1,
                Err(e) => {
                    tracing::warn!(contact_id = %contact.id, "⚠️ Follow-up step failed: {e}");
                    report.failures.push(ContactFailure {
                        contact_id: contact.id.clone(),
                        stage: "followup",
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Primary-lane action for one contact: classify, dial, persist.
    async fn place_call(&self, contact: &Contact) -> Result<String> {
        let next_attempt = contact.attempt_count + 1;
        let lead_source = LeadSource::classify(contact.lead_status_hint.as_deref());
        let phone = selector::normalize_e164(contact.phone.as_deref().unwrap_or_default());

        tracing::info!(
            contact_id = %contact.id,
            attempt = next_attempt,
            source = lead_source.as_str(),
            "📞 Placing call"
        );
        let handle = self
            .dialer
            .place_call(CallRequest {
                contact_id: contact.id.clone(),
                attempt_number: next_attempt,
                to_number: phone,
                first_name: contact.display_name().to_string(),
                email: contact.email.clone(),
                lead_source,
            })
            .await?;

        // Persist immediately so no later cycle can observe this contact
        // as Pending while the call is in flight.
        self.store
            .update(
                &contact.id,
                ContactUpdate::new()
                    .status(OutreachStatus::Calling)
                    .attempt_count(next_attempt),
            )
            .await?;
        Ok(handle.call_id)
    }

    /// Follow-up-lane action for one contact: dispatch the current step,
    /// then advance the step pointer or close out the sequence.
    async fn advance_followup(&self, contact: &Contact) -> Result<()> {
        let step_num = contact.followup_step.max(1);
        let Some(step) = FollowupSequence::step_at(step_num) else {
            // Off the end of the timeline with no transition recorded;
            // nothing to send, nothing to schedule.
            tracing::debug!(contact_id = %contact.id, step = step_num, "No timeline step; skipping");
            return Ok(());
        };

        let first_name = contact.display_name();
        let email = contact.email.as_deref().unwrap_or_default();
        let link = sequence::booking_link(&self.booking_url, first_name, email, step_num);

        match step.channel {
            FollowupChannel::Sms => {
                let to = contact.phone.as_deref().ok_or_else(|| {
                    LeadClawError::Channel("follow-up SMS without a phone number".into())
                })?;
                let body = sequence::render_sms(step_num, first_name, &link).ok_or_else(|| {
                    LeadClawError::Channel(format!("no SMS body for step {step_num}"))
                })?;
                let message_id = self.sms.send_sms(to, &body).await?;
                tracing::info!(
                    contact_id = %contact.id,
                    step = step_num,
                    %message_id,
                    "💬 Follow-up SMS sent"
                );
            }
            FollowupChannel::Email => {
                if email.is_empty() {
                    return Err(LeadClawError::Channel(
                        "follow-up email without an address".into(),
                    ));
                }
                self.email.send_followup(email, first_name, step_num, &link).await?;
                tracing::info!(contact_id = %contact.id, step = step_num, "📧 Follow-up email sent");
            }
        }

        if step_num >= MAX_STEP {
            self.store
                .update(
                    &contact.id,
                    ContactUpdate::new()
                        .sequence_complete()
                        .status(OutreachStatus::HardStop),
                )
                .await?;
            tracing::info!(contact_id = %contact.id, "🛑 Follow-up sequence complete");
            return Ok(());
        }

        match FollowupSequence::next_step_after(step_num) {
            Some(next_step) => {
                let fire_at = FollowupSequence::next_fire_time(next_step, self.clock.now());
                self.store
                    .update(
                        &contact.id,
                        ContactUpdate::new()
                            .followup_step(next_step.step)
                            .next_followup_time(Some(fire_at)),
                    )
                    .await?;
            }
            None => {
                self.store
                    .update(&contact.id, ContactUpdate::new().sequence_complete())
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use leadclaw_core::traits::{CallHandle, FixedClock};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn pending_contact(id: &str) -> Contact {
        Contact {
            id: id.into(),
            first_name: Some("Ana".into()),
            email: Some("ana@example.com".into()),
            phone: Some("+1 555 0100".into()),
            lead_status_hint: None,
            outreach_status: Some(OutreachStatus::Pending),
            attempt_count: 0,
            next_attempt_time: None,
            followup_step: 1,
            next_followup_time: None,
        }
    }

    #[derive(Default)]
    struct MockStore {
        primary: Mutex<Vec<Contact>>,
        followup: Mutex<Vec<Contact>>,
        updates: Mutex<Vec<(String, ContactUpdate)>>,
        fail_updates: bool,
    }

    #[async_trait]
    impl ContactStore for MockStore {
        async fn list_eligible_primary(&self) -> Result<Vec<Contact>> {
            Ok(self.primary.lock().unwrap().clone())
        }
        async fn search_eligible_followup(&self, _now: DateTime<Utc>) -> Result<Vec<Contact>> {
            Ok(self.followup.lock().unwrap().clone())
        }
        async fn find_by_email(&self, _email: &str) -> Result<Option<Contact>> {
            Ok(None)
        }
        async fn update(&self, contact_id: &str, update: ContactUpdate) -> Result<()> {
            if self.fail_updates {
                return Err(LeadClawError::Crm("update refused".into()));
            }
            self.updates.lock().unwrap().push((contact_id.to_string(), update));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockDialer {
        calls: Mutex<Vec<CallRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl Dialer for MockDialer {
        async fn place_call(&self, request: CallRequest) -> Result<CallHandle> {
            if self.fail {
                return Err(LeadClawError::Channel("dialer down".into()));
            }
            self.calls.lock().unwrap().push(request);
            Ok(CallHandle { call_id: "call_abc".into() })
        }
    }

    #[derive(Default)]
    struct MockSms {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsSender for MockSms {
        async fn send_sms(&self, to: &str, body: &str) -> Result<String> {
            self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
            Ok("SM123".into())
        }
    }

    #[derive(Default)]
    struct MockEmail {
        sent: Mutex<Vec<(String, u32)>>,
    }

    #[async_trait]
    impl EmailSender for MockEmail {
        async fn send_followup(
            &self,
            to: &str,
            _first_name: &str,
            step: u32,
            _booking_link: &str,
        ) -> Result<()> {
            self.sent.lock().unwrap().push((to.to_string(), step));
            Ok(())
        }
    }

    struct Harness {
        store: Arc<MockStore>,
        dialer: Arc<MockDialer>,
        sms: Arc<MockSms>,
        email: Arc<MockEmail>,
        scheduler: LifecycleScheduler,
    }

    fn harness(store: MockStore, dialer: MockDialer) -> Harness {
        let store = Arc::new(store);
        let dialer = Arc::new(dialer);
        let sms = Arc::new(MockSms::default());
        let email = Arc::new(MockEmail::default());
        let scheduler = LifecycleScheduler::new(
            store.clone(),
            dialer.clone(),
            sms.clone(),
            email.clone(),
            Arc::new(FixedClock(now())),
            "https://cal.example.com/intro".into(),
        );
        Harness { store, dialer, sms, email, scheduler }
    }

    #[tokio::test]
    async fn test_call_persists_calling_and_incremented_count() {
        let store = MockStore::default();
        let mut contact = pending_contact("501");
        contact.attempt_count = 2;
        store.primary.lock().unwrap().push(contact);
        let h = harness(store, MockDialer::default());

        let report = h.scheduler.run_tick().await;
        assert_eq!(report.calls_placed, 1);
        assert!(report.failures.is_empty());

        let calls = h.dialer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].attempt_number, 3);
        assert_eq!(calls[0].to_number, "+15550100");

        let updates = h.store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "501");
        assert_eq!(updates[0].1.outreach_status, Some(OutreachStatus::Calling));
        assert_eq!(updates[0].1.attempt_count, Some(3));
    }

    #[tokio::test]
    async fn test_calling_contact_not_redialed() {
        // The state written by a successful cycle makes the contact
        // ineligible on the next read — re-entrant safety.
        let store = MockStore::default();
        let mut contact = pending_contact("501");
        contact.outreach_status = Some(OutreachStatus::Calling);
        store.primary.lock().unwrap().push(contact);
        let h = harness(store, MockDialer::default());

        let report = h.scheduler.run_tick().await;
        assert_eq!(report.calls_placed, 0);
        assert!(h.dialer.calls.lock().unwrap().is_empty());
        assert!(h.store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dialer_failure_leaves_contact_unmutated() {
        let store = MockStore::default();
        store.primary.lock().unwrap().push(pending_contact("501"));
        let h = harness(store, MockDialer { fail: true, ..Default::default() });

        let report = h.scheduler.run_tick().await;
        assert_eq!(report.calls_placed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, "call");
        assert!(h.store.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_write_failure_is_recorded() {
        let store = MockStore { fail_updates: true, ..Default::default() };
        store.primary.lock().unwrap().push(pending_contact("501"));
        let h = harness(store, MockDialer::default());

        let report = h.scheduler.run_tick().await;
        assert_eq!(report.calls_placed, 0);
        assert_eq!(report.failures.len(), 1);
        // The call itself went out; only the persist failed. The contact
        // stays Pending in the store and is re-evaluated next cycle.
        assert_eq!(h.dialer.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_batch() {
        let store = MockStore::default();
        let mut bad = pending_contact("bad");
        bad.phone = Some("+1 555 0100".into());
        store.primary.lock().unwrap().push(bad);
        store.primary.lock().unwrap().push(pending_contact("good"));

        // Dialer that fails only the first contact.
        #[derive(Default)]
        struct FlakyDialer {
            calls: Mutex<Vec<CallRequest>>,
        }
        #[async_trait]
        impl Dialer for FlakyDialer {
            async fn place_call(&self, request: CallRequest) -> Result<CallHandle> {
                if request.contact_id == "bad" {
                    return Err(LeadClawError::Channel("number rejected".into()));
                }
                self.calls.lock().unwrap().push(request);
                Ok(CallHandle { call_id: "c1".into() })
            }
        }

        let store = Arc::new(store);
        let dialer = Arc::new(FlakyDialer::default());
        let scheduler = LifecycleScheduler::new(
            store.clone(),
            dialer.clone(),
            Arc::new(MockSms::default()),
            Arc::new(MockEmail::default()),
            Arc::new(FixedClock(now())),
            "https://cal.example.com/intro".into(),
        );

        let report = scheduler.run_tick().await;
        assert_eq!(report.calls_placed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].contact_id, "bad");
        assert_eq!(dialer.calls.lock().unwrap()[0].contact_id, "good");
    }

    #[tokio::test]
    async fn test_followup_step1_sends_sms_and_advances() {
        let store = MockStore::default();
        let mut contact = pending_contact("601");
        contact.followup_step = 1;
        contact.next_followup_time = Some(now() - Duration::minutes(5));
        store.followup.lock().unwrap().push(contact);
        let h = harness(store, MockDialer::default());

        let report = h.scheduler.run_tick().await;
        assert_eq!(report.followups_sent, 1);

        let sent = h.sms.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Ana"));
        assert!(sent[0].1.contains("utm_source=followup_step1"));

        let updates = h.store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.followup_step, Some(2));
        // Step 2 delay is 30 minutes from scheduling.
        assert_eq!(
            updates[0].1.next_followup_time,
            Some(Some(now() + Duration::minutes(30)))
        );
    }

    #[tokio::test]
    async fn test_followup_step2_sends_email() {
        let store = MockStore::default();
        let mut contact = pending_contact("602");
        contact.followup_step = 2;
        contact.next_followup_time = Some(now() - Duration::minutes(5));
        store.followup.lock().unwrap().push(contact);
        let h = harness(store, MockDialer::default());

        h.scheduler.run_tick().await;
        let sent = h.email.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[("ana@example.com".to_string(), 2)]);

        let updates = h.store.updates.lock().unwrap();
        assert_eq!(updates[0].1.followup_step, Some(3));
        assert_eq!(
            updates[0].1.next_followup_time,
            Some(Some(now() + Duration::hours(24)))
        );
    }

    #[tokio::test]
    async fn test_followup_step5_is_terminal() {
        let store = MockStore::default();
        let mut contact = pending_contact("603");
        contact.followup_step = 5;
        contact.next_followup_time = Some(now() - Duration::minutes(5));
        store.followup.lock().unwrap().push(contact);
        let h = harness(store, MockDialer::default());

        let report = h.scheduler.run_tick().await;
        assert_eq!(report.followups_sent, 1);

        let updates = h.store.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.outreach_status, Some(OutreachStatus::HardStop));
        assert!(updates[0].1.sequence_complete);
        assert_eq!(updates[0].1.followup_step, None, "no step advance past the end");
    }

    #[tokio::test]
    async fn test_followup_step_zero_treated_as_one() {
        let store = MockStore::default();
        let mut contact = pending_contact("604");
        contact.followup_step = 0;
        contact.next_followup_time = Some(now() - Duration::minutes(5));
        store.followup.lock().unwrap().push(contact);
        let h = harness(store, MockDialer::default());

        h.scheduler.run_tick().await;
        assert_eq!(h.sms.sent.lock().unwrap().len(), 1);
        assert_eq!(h.store.updates.lock().unwrap()[0].1.followup_step, Some(2));
    }

    #[tokio::test]
    async fn test_store_fetch_failure_degrades_to_empty_tick() {
        struct DeadStore;
        #[async_trait]
        impl ContactStore for DeadStore {
            async fn list_eligible_primary(&self) -> Result<Vec<Contact>> {
                Err(LeadClawError::Crm("segment list unavailable".into()))
            }
            async fn search_eligible_followup(&self, _now: DateTime<Utc>) -> Result<Vec<Contact>> {
                Err(LeadClawError::Crm("search unavailable".into()))
            }
            async fn find_by_email(&self, _email: &str) -> Result<Option<Contact>> {
                Ok(None)
            }
            async fn update(&self, _id: &str, _update: ContactUpdate) -> Result<()> {
                Ok(())
            }
        }

        let scheduler = LifecycleScheduler::new(
            Arc::new(DeadStore),
            Arc::new(MockDialer::default()),
            Arc::new(MockSms::default()),
            Arc::new(MockEmail::default()),
            Arc::new(FixedClock(now())),
            String::new(),
        );
        let report = scheduler.run_tick().await;
        assert_eq!(report.calls_placed, 0);
        assert_eq!(report.followups_sent, 0);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_try_tick_skips_while_tick_running() {
        let h = harness(MockStore::default(), MockDialer::default());
        let scheduler = Arc::new(h.scheduler);
        let _guard = scheduler.tick_gate.lock().await;
        assert!(scheduler.try_tick().await.is_none());
    }
}

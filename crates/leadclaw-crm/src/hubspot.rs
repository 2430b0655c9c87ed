//! HubSpot-backed contact store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};

use leadclaw_core::config::CrmConfig;
use leadclaw_core::error::{LeadClawError, Result};
use leadclaw_core::traits::ContactStore;
use leadclaw_core::types::{Contact, ContactUpdate, OutreachStatus, properties};

/// Page size for list membership and search requests — the upstream API
/// caps pages at 100, which also bounds one poller cycle's batch.
const PAGE_LIMIT: usize = 100;

/// Properties fetched for every contact read.
const CONTACT_PROPERTIES: [&str; 9] = [
    properties::FIRST_NAME,
    properties::EMAIL,
    properties::PHONE,
    properties::LEAD_STATUS_HINT,
    properties::OUTREACH_STATUS,
    properties::ATTEMPT_COUNT,
    properties::NEXT_ATTEMPT_TIME,
    properties::FOLLOWUP_STEP,
    properties::NEXT_FOLLOWUP_TIME,
];

pub struct HubspotStore {
    config: CrmConfig,
    client: reqwest::Client,
}

impl HubspotStore {
    pub fn new(config: CrmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .client
            .post(format!("{}{path}", self.config.base_url))
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| LeadClawError::Crm(format!("{path}: {e}")))?;
        if !resp.status().is_success() {
            return Err(LeadClawError::Crm(format!("{path}: HTTP {}", resp.status())));
        }
        resp.json()
            .await
            .map_err(|e| LeadClawError::Crm(format!("{path}: {e}")))
    }

    /// Record ids of the calling-segment list members (one page).
    async fn list_member_ids(&self) -> Result<Vec<String>> {
        let url = format!(
            "{}/crm/v3/lists/{}/memberships?limit={PAGE_LIMIT}",
            self.config.base_url, self.config.call_list_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .send()
            .await
            .map_err(|e| LeadClawError::Crm(format!("list memberships: {e}")))?;
        if !resp.status().is_success() {
            return Err(LeadClawError::Crm(format!("list memberships: HTTP {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| LeadClawError::Crm(format!("list memberships: {e}")))?;
        let ids = body["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|r| {
                        r["recordId"]
                            .as_str()
                            .map(String::from)
                            .or_else(|| r["recordId"].as_u64().map(|n| n.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    async fn batch_read(&self, ids: &[String]) -> Result<Vec<Contact>> {
        let body = json!({
            "inputs": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>(),
            "properties": CONTACT_PROPERTIES,
        });
        let resp = self.post_json("/crm/v3/objects/contacts/batch/read", &body).await?;
        Ok(parse_contacts(&resp))
    }

    async fn search(&self, request: &Value) -> Result<Vec<Contact>> {
        let resp = self.post_json("/crm/v3/objects/contacts/search", request).await?;
        Ok(parse_contacts(&resp))
    }
}

#[async_trait]
impl ContactStore for HubspotStore {
    async fn list_eligible_primary(&self) -> Result<Vec<Contact>> {
        let ids = self.list_member_ids().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.batch_read(&ids).await
    }

    async fn search_eligible_followup(&self, now: DateTime<Utc>) -> Result<Vec<Contact>> {
        let request = json!({
            "filterGroups": [{
                "filters": [
                    {
                        "propertyName": properties::OUTREACH_STATUS,
                        "operator": "EQ",
                        "value": OutreachStatus::Pending.as_str(),
                    },
                    {
                        "propertyName": properties::NEXT_FOLLOWUP_TIME,
                        "operator": "LT",
                        "value": now.to_rfc3339_opts(SecondsFormat::Millis, true),
                    },
                ],
            }],
            "properties": CONTACT_PROPERTIES,
            "limit": PAGE_LIMIT,
        });
        self.search(&request).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let request = json!({
            "filterGroups": [{
                "filters": [{
                    "propertyName": properties::EMAIL,
                    "operator": "EQ",
                    "value": email,
                }],
            }],
            "properties": CONTACT_PROPERTIES,
            "limit": 1,
        });
        Ok(self.search(&request).await?.into_iter().next())
    }

    async fn update(&self, contact_id: &str, update: ContactUpdate) -> Result<()> {
        let props: serde_json::Map<String, Value> = update
            .to_properties()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Value::String(value)))
            .collect();
        let resp = self
            .client
            .patch(format!("{}/crm/v3/objects/contacts/{contact_id}", self.config.base_url))
            .bearer_auth(&self.config.access_token)
            .json(&json!({ "properties": props }))
            .send()
            .await
            .map_err(|e| LeadClawError::Crm(format!("update {contact_id}: {e}")))?;
        if !resp.status().is_success() {
            return Err(LeadClawError::Crm(format!(
                "update {contact_id}: HTTP {}",
                resp.status()
            )));
        }
        tracing::debug!(contact_id, fields = props.len(), "CRM contact updated");
        Ok(())
    }
}

fn parse_contacts(body: &Value) -> Vec<Contact> {
    body["results"]
        .as_array()
        .map(|results| results.iter().filter_map(parse_contact).collect())
        .unwrap_or_default()
}

/// Parse one CRM record. All outreach properties arrive as strings;
/// unparseable numbers degrade to their defaults rather than dropping the
/// record.
fn parse_contact(record: &Value) -> Option<Contact> {
    let id = record["id"]
        .as_str()
        .map(String::from)
        .or_else(|| record["id"].as_u64().map(|n| n.to_string()))?;
    let props = &record["properties"];
    Some(Contact {
        id,
        first_name: prop_string(props, properties::FIRST_NAME),
        email: prop_string(props, properties::EMAIL),
        phone: prop_string(props, properties::PHONE),
        lead_status_hint: prop_string(props, properties::LEAD_STATUS_HINT),
        outreach_status: props[properties::OUTREACH_STATUS]
            .as_str()
            .and_then(OutreachStatus::parse),
        attempt_count: prop_number(props, properties::ATTEMPT_COUNT).unwrap_or(0),
        next_attempt_time: prop_time(props, properties::NEXT_ATTEMPT_TIME),
        followup_step: prop_number(props, properties::FOLLOWUP_STEP).unwrap_or(1),
        next_followup_time: prop_time(props, properties::NEXT_FOLLOWUP_TIME),
    })
}

fn prop_string(props: &Value, name: &str) -> Option<String> {
    props[name].as_str().filter(|s| !s.is_empty()).map(String::from)
}

fn prop_number(props: &Value, name: &str) -> Option<u32> {
    match &props[name] {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        _ => None,
    }
}

fn prop_time(props: &Value, name: &str) -> Option<DateTime<Utc>> {
    props[name]
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

//! Retell AI dialer adapter.
//!
//! Places outbound phone calls with call-time dynamic variables for the
//! AI agent and correlation metadata (`contact_id`, `attempt_number`) that
//! comes back on the call-analyzed webhook.

use async_trait::async_trait;
use serde_json::{Value, json};

use leadclaw_core::config::DialerConfig;
use leadclaw_core::error::{LeadClawError, Result};
use leadclaw_core::traits::{CallHandle, CallRequest, Dialer};

pub struct RetellDialer {
    config: DialerConfig,
    client: reqwest::Client,
}

impl RetellDialer {
    pub fn new(config: DialerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn call_payload(&self, request: &CallRequest) -> Value {
        json!({
            "from_number": self.config.from_number,
            "to_number": request.to_number,
            "agent_id": self.config.agent_id,
            "retell_llm_dynamic_variables": {
                "FirstName": request.first_name,
                "contact_id": request.contact_id,
                "lead_source": request.lead_source.as_str(),
                "Email": request.email.clone().unwrap_or_default(),
            },
            "metadata": {
                "contact_id": request.contact_id,
                "attempt_number": request.attempt_number,
            },
        })
    }
}

#[async_trait]
impl Dialer for RetellDialer {
    async fn place_call(&self, request: CallRequest) -> Result<CallHandle> {
        let payload = self.call_payload(&request);
        let resp = self
            .client
            .post(format!("{}/v2/create-phone-call", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LeadClawError::Channel(format!("Retell: {e}")))?;
        if !resp.status().is_success() {
            return Err(LeadClawError::Channel(format!("Retell: HTTP {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| LeadClawError::Channel(format!("Retell: {e}")))?;
        let call_id = body["call_id"].as_str().unwrap_or_default().to_string();
        tracing::debug!(contact_id = %request.contact_id, %call_id, "Dialer accepted call");
        Ok(CallHandle { call_id })
    }
}

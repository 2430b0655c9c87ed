//! Twilio SMS adapter.

use async_trait::async_trait;
use serde_json::Value;

use leadclaw_core::config::SmsConfig;
use leadclaw_core::error::{LeadClawError, Result};
use leadclaw_core::traits::SmsSender;

pub struct TwilioSms {
    config: SmsConfig,
    client: reqwest::Client,
}

impl TwilioSms {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSms {
    async fn send_sms(&self, to: &str, body: &str) -> Result<String> {
        let form = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| LeadClawError::Channel(format!("Twilio: {e}")))?;
        if !resp.status().is_success() {
            return Err(LeadClawError::Channel(format!("Twilio: HTTP {}", resp.status())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| LeadClawError::Channel(format!("Twilio: {e}")))?;
        Ok(body["sid"].as_str().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let sms = TwilioSms::new(SmsConfig {
            account_sid: "AC123".into(),
            auth_token: "tok".into(),
            from_number: "+15550000".into(),
            base_url: "https://api.twilio.com".into(),
        });
        assert_eq!(
            sms.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}

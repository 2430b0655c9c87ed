//! Follow-up email adapter (Resend-style JSON API).
//!
//! Templates exist only for the email steps of the sequence (2, 4, 5).
//! Rendering is pure; the sender just posts the rendered template.

use async_trait::async_trait;
use serde_json::json;

use leadclaw_core::config::EmailConfig;
use leadclaw_core::error::{LeadClawError, Result};
use leadclaw_core::traits::EmailSender;

/// A rendered follow-up email.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailTemplate {
    pub subject: String,
    pub html: String,
}

/// Render the template for an email sequence step. Returns `None` for
/// steps that go out by SMS or lie outside the sequence.
pub fn render_followup(step: u32, first_name: &str, booking_link: &str) -> Option<EmailTemplate> {
    match step {
        2 => Some(EmailTemplate {
            subject: format!("I just tried calling you / {first_name}"),
            html: format!(
                "<p>Hey {first_name},</p>\
                 <p>I just tried giving you a call about your request — sorry I missed you!</p>\
                 <p>I wanted to personally reach out because we've been helping founders like you \
                 book 20+ qualified sales calls per month using AI-powered outreach systems.</p>\
                 <p>If that sounds interesting, grab a quick 15-min slot and I'll walk you through \
                 exactly how it works:</p>\
                 <p><a class=\"cta\" href=\"{booking_link}\">📅 Book Your Strategy Call</a></p>\
                 <p>Talk soon,<br>Roman</p>"
            ),
        }),
        4 => Some(EmailTemplate {
            subject: format!("This is how founders are booking 20+ calls/month {first_name}"),
            html: format!(
                "<p>Hey {first_name},</p>\
                 <p>Following up — I know things get busy, so I'll keep this short.</p>\
                 <p>We recently helped a B2B founder go from 3 calls/month to 22 qualified sales \
                 calls using our AI-powered outreach system. No cold calling. No spam. Just smart, \
                 targeted conversations with decision-makers.</p>\
                 <p>Here's what made the difference:</p>\
                 <p>• AI agents that qualify and engage leads 24/7</p>\
                 <p>• Multi-channel sequences (calls, SMS, email) that actually convert</p>\
                 <p>• A system that scales without adding headcount</p>\
                 <p>If you're serious about scaling revenue without scaling complexity, this is \
                 worth 15 minutes of your time:</p>\
                 <p><a class=\"cta\" href=\"{booking_link}\">📅 Grab Your Free Strategy Session</a></p>\
                 <p>Best,<br>Roman</p>"
            ),
        }),
        5 => Some(EmailTemplate {
            subject: format!("Should I close your file, {first_name}?"),
            html: format!(
                "<p>Hey {first_name},</p>\
                 <p>I've reached out a few times now and haven't heard back, so I want to respect \
                 your time.</p>\
                 <p>If growing your pipeline with qualified sales calls isn't a priority right now, \
                 no worries at all — I'll close out your file.</p>\
                 <p>But if you've just been busy and this is still on your radar, here's your last \
                 chance to grab a free strategy session:</p>\
                 <p><a class=\"cta\" href=\"{booking_link}\">📅 Book Before I Close Your File</a></p>\
                 <p>Either way, I wish you nothing but success.</p>\
                 <p>Cheers,<br>Roman</p>"
            ),
        }),
        _ => None,
    }
}

pub struct ResendMailer {
    config: EmailConfig,
    client: reqwest::Client,
}

impl ResendMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendMailer {
    async fn send_followup(
        &self,
        to: &str,
        first_name: &str,
        step: u32,
        booking_link: &str,
    ) -> Result<()> {
        let template = render_followup(step, first_name, booking_link)
            .ok_or_else(|| LeadClawError::Channel(format!("no email template for step {step}")))?;
        let resp = self
            .client
            .post(format!("{}/emails", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "from": self.config.from,
                "to": [to],
                "subject": template.subject,
                "html": template.html,
            }))
            .send()
            .await
            .map_err(|e| LeadClawError::Channel(format!("Resend: {e}")))?;
        if !resp.status().is_success() {
            return Err(LeadClawError::Channel(format!("Resend: HTTP {}", resp.status())));
        }
        tracing::debug!(%to, step, "Follow-up email accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_exist_for_email_steps_only() {
        for step in [2, 4, 5] {
            assert!(render_followup(step, "Ana", "https://x").is_some(), "step {step}");
        }
        for step in [0, 1, 3, 6] {
            assert!(render_followup(step, "Ana", "https://x").is_none(), "step {step}");
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let a = render_followup(2, "Ana", "X").unwrap();
        let b = render_followup(2, "Ana", "X").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_templates_embed_name_and_link() {
        for step in [2, 4, 5] {
            let t = render_followup(step, "Ana", "https://cal.example.com/x").unwrap();
            assert!(t.subject.contains("Ana"));
            assert!(t.html.contains("Ana"));
            assert!(t.html.contains("https://cal.example.com/x"));
        }
    }

    #[test]
    fn test_breakup_email_subject() {
        let t = render_followup(5, "Ana", "X").unwrap();
        assert_eq!(t.subject, "Should I close your file, Ana?");
    }
}

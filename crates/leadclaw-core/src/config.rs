//! LeadClaw configuration system.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LeadClawError, Result};

/// Root configuration. Every adapter takes its section by value at
/// construction — there are no ambient singletons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadClawConfig {
    #[serde(default)]
    pub crm: CrmConfig,
    #[serde(default)]
    pub dialer: DialerConfig,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl LeadClawConfig {
    /// Load config from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LeadClawError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| LeadClawError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }
}

/// External CRM (contact store) connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_crm_base_url")]
    pub base_url: String,
    /// Segment list whose members are candidates for the primary lane.
    #[serde(default = "default_call_list_id")]
    pub call_list_id: String,
}

fn default_crm_base_url() -> String {
    "https://api.hubapi.com".into()
}
fn default_call_list_id() -> String {
    "133".into()
}

impl Default for CrmConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            base_url: default_crm_base_url(),
            call_list_id: default_call_list_id(),
        }
    }
}

/// AI dialer provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialerConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub from_number: String,
    #[serde(default = "default_dialer_base_url")]
    pub base_url: String,
}

fn default_dialer_base_url() -> String {
    "https://api.retellai.com".into()
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            agent_id: String::new(),
            from_number: String::new(),
            base_url: default_dialer_base_url(),
        }
    }
}

/// SMS provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub account_sid: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default)]
    pub from_number: String,
    #[serde(default = "default_sms_base_url")]
    pub base_url: String,
}

fn default_sms_base_url() -> String {
    "https://api.twilio.com".into()
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            base_url: default_sms_base_url(),
        }
    }
}

/// Transactional email provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub api_key: String,
    /// Sender identity; must be a verified domain.
    #[serde(default = "default_email_from")]
    pub from: String,
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
}

fn default_email_from() -> String {
    "Onboarding <hello@yourdomain.com>".into()
}
fn default_email_base_url() -> String {
    "https://api.resend.com".into()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from: default_email_from(),
            base_url: default_email_base_url(),
        }
    }
}

/// Booking page used in follow-up messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingConfig {
    #[serde(default)]
    pub booking_url: String,
}

/// Poller cadence and batch sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    120
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Inbound HTTP surface (webhooks + health).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

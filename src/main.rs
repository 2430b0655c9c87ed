//! # LeadClaw — AI Outreach Middleware
//!
//! Drives AI phone-call retries and SMS/email follow-up sequences over
//! contacts held in an external CRM, and reconciles asynchronous call and
//! booking outcomes via webhooks.
//!
//! Usage:
//!   leadclaw                       # Start poller + gateway
//!   leadclaw --port 8080           # Custom gateway port
//!   leadclaw --once                # Run a single poller tick and exit

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use leadclaw_channels::{ResendMailer, RetellDialer, TwilioSms};
use leadclaw_core::LeadClawConfig;
use leadclaw_core::traits::{Clock, ContactStore, Dialer, EmailSender, SmsSender, SystemClock};
use leadclaw_crm::HubspotStore;
use leadclaw_gateway::{AppState, WebhookReconciler};
use leadclaw_scheduler::LifecycleScheduler;

#[derive(Parser)]
#[command(
    name = "leadclaw",
    version,
    about = "📞 LeadClaw — AI outreach lifecycle scheduler"
)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "~/.leadclaw/config.toml")]
    config: String,

    /// Gateway port override
    #[arg(short, long)]
    port: Option<u16>,

    /// Run a single poller tick and exit
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = shellexpand::tilde(&cli.config).to_string();
    if !Path::new(&config_path).exists() {
        tracing::warn!("No config at {config_path}; using defaults");
    }
    let config = LeadClawConfig::load_or_default(Path::new(&config_path))?;

    let store: Arc<dyn ContactStore> = Arc::new(HubspotStore::new(config.crm.clone()));
    let dialer: Arc<dyn Dialer> = Arc::new(RetellDialer::new(config.dialer.clone()));
    let sms: Arc<dyn SmsSender> = Arc::new(TwilioSms::new(config.sms.clone()));
    let email: Arc<dyn EmailSender> = Arc::new(ResendMailer::new(config.email.clone()));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let scheduler = Arc::new(LifecycleScheduler::new(
        store.clone(),
        dialer,
        sms,
        email,
        clock.clone(),
        config.booking.booking_url.clone(),
    ));

    if cli.once {
        let report = scheduler.run_tick().await;
        tracing::info!(
            tick_id = %report.tick_id,
            calls = report.calls_placed,
            followups = report.followups_sent,
            failures = report.failures.len(),
            "Single tick complete"
        );
        return Ok(());
    }

    tokio::spawn(leadclaw_scheduler::spawn_poller(
        scheduler,
        config.scheduler.poll_interval_secs,
    ));

    let reconciler = Arc::new(WebhookReconciler::new(store, clock));
    let port = cli.port.unwrap_or(config.gateway.port);
    let addr = SocketAddr::new(config.gateway.host.parse()?, port);
    leadclaw_gateway::serve(
        AppState {
            reconciler,
            start_time: std::time::Instant::now(),
        },
        addr,
    )
    .await?;
    Ok(())
}

//! # LeadClaw CRM
//!
//! `ContactStore` adapter for a HubSpot-style CRM. Three read paths and
//! one write path: list membership + batch read for the calling segment,
//! the search API for due follow-ups and email lookup, and property PATCH
//! for updates.

pub mod hubspot;

pub use hubspot::HubspotStore;

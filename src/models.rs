use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::bot::FormFields;
use crate::store::StoreError;

// Public lead form POST body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LeadSubmission {
    pub site_id: String,
    #[serde(default)]
    pub page_id: Option<String>,
    #[serde(default)]
    pub fields: FormFields,
}

// Same body for real and silently dropped submissions
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LeadResponse {
    pub success: bool,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    CtaClick,
    FormSubmit,
}

// Analytics beacon POST body
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct EventSubmission {
    pub site_id: String,
    #[serde(default)]
    pub page_id: Option<String>,
    pub event_type: EventType,
    #[serde(default)]
    pub metadata: Option<Value>,
}

// Row written to the leads table
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LeadRecord {
    pub site_id: String,
    pub page_id: Option<String>,
    pub data: FormFields,
    pub ip_hash: String,
    pub created_at: DateTime<Utc>,
}

// Row written to the analytics_events table
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub site_id: String,
    pub page_id: Option<String>,
    pub event_type: EventType,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

pub enum Record {
    Lead(LeadRecord),
    Event(EventRecord),
}

// Queued persistence job - record + optional channel for the outcome
pub struct PersistJob {
    pub record: Record,
    pub response_tx: Option<oneshot::Sender<Result<(), StoreError>>>,
}

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

use crate::models::{EventRecord, LeadRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("persistence worker stopped")]
    Closed,
}

/// Where admitted leads and analytics events end up.
#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn save_lead(&self, lead: LeadRecord) -> Result<(), StoreError>;
    async fn save_event(&self, event: EventRecord) -> Result<(), StoreError>;
    fn backend_name(&self) -> &'static str;
}

// Process-local store, used when no backend is configured
#[derive(Default)]
pub struct MemoryStore {
    leads: Mutex<Vec<LeadRecord>>,
    events: Mutex<Vec<EventRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leads(&self) -> Vec<LeadRecord> {
        self.leads.lock().clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn save_lead(&self, lead: LeadRecord) -> Result<(), StoreError> {
        self.leads.lock().push(lead);
        Ok(())
    }

    async fn save_event(&self, event: EventRecord) -> Result<(), StoreError> {
        self.events.lock().push(event);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Hosted Postgres behind a PostgREST-style API.
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        // add http:// if not present
        let base_url = if base_url.starts_with("http") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn insert<T: serde::Serialize + Sync>(
        &self,
        table: &str,
        row: &T,
    ) -> Result<(), StoreError> {
        let res = self
            .client
            .post(self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl LeadStore for RestStore {
    async fn save_lead(&self, lead: LeadRecord) -> Result<(), StoreError> {
        self.insert("leads", &lead).await
    }

    async fn save_event(&self, event: EventRecord) -> Result<(), StoreError> {
        self.insert("analytics_events", &event).await
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

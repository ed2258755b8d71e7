use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    types::{VisitId, VisitPurpose},
    visit::VisitRecord,
};

use super::{RemoteFailure, RemoteVisitSink};

const DEFAULT_TABLE: &str = "visitors";

/// Connection settings for the hosted visitors table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://example.supabase.co`.
    pub base_url: String,
    /// API key sent as both `apikey` and bearer token.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Table name under `/rest/v1/`.
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

#[derive(Debug, Serialize)]
struct CreateRow<'a> {
    full_name: &'a str,
    reason_for_visit: Option<&'a str>,
    person_to_meet: Option<&'a str>,
    phone_number: Option<&'a str>,
    photo_base64: Option<&'a str>,
    checked_in_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ReturnedRow {
    id: Value,
}

/// [`RemoteVisitSink`] speaking the PostgREST dialect of a hosted table.
pub struct HttpVisitSink {
    client: Client,
    config: RemoteConfig,
}

impl HttpVisitSink {
    /// Builds a sink with a default `reqwest` client.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteFailure> {
        let client = Client::builder()
            .build()
            .map_err(|e| RemoteFailure::Unreachable(format!("http client init failed: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Builds a sink around an existing client.
    pub fn with_client(client: Client, config: RemoteConfig) -> Self {
        Self { client, config }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }
}

#[async_trait]
impl RemoteVisitSink for HttpVisitSink {
    async fn record_check_in(&self, record: &VisitRecord) -> Result<VisitId, RemoteFailure> {
        let reason = match record.purpose {
            Some(VisitPurpose::Other) => record.free_text_reason.as_deref(),
            Some(purpose) => Some(purpose.code()),
            None => None,
        };
        let row = CreateRow {
            full_name: &record.visitor_name,
            reason_for_visit: reason,
            person_to_meet: record.person_to_meet.as_deref(),
            phone_number: record.phone_number.as_deref(),
            photo_base64: record.photo_reference.as_deref(),
            checked_in_at: record.check_in_time,
        };

        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .map_err(|e| RemoteFailure::Unreachable(e.to_string()))?;

        let rows = returned_rows(response).await?;
        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| RemoteFailure::Decode("insert returned no rows".to_string()))?;
        let id = remote_id(first.id)?;
        debug!(remote_id = %id, "remote check-in recorded");
        Ok(id)
    }

    async fn record_check_out(&self, id: &VisitId, at: DateTime<Utc>) -> Result<(), RemoteFailure> {
        let response = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{id}"))])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Prefer", "return=representation")
            .json(&json!({ "checked_out_at": at }))
            .send()
            .await
            .map_err(|e| RemoteFailure::Unreachable(e.to_string()))?;

        let rows = returned_rows(response).await?;
        if rows.is_empty() {
            return Err(RemoteFailure::MissingRow(id.clone()));
        }
        debug!(remote_id = %id, "remote check-out recorded");
        Ok(())
    }
}

async fn returned_rows(response: Response) -> Result<Vec<ReturnedRow>, RemoteFailure> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteFailure::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Vec<ReturnedRow>>()
        .await
        .map_err(|e| RemoteFailure::Decode(e.to_string()))
}

fn remote_id(value: Value) -> Result<VisitId, RemoteFailure> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(VisitId::new(s)),
        Value::Number(n) => Ok(VisitId::new(n.to_string())),
        other => Err(RemoteFailure::Decode(format!("unusable remote id: {other}"))),
    }
}

//! REST usage store
//!
//! Talks to a PostgREST-style endpoint (`/rest/v1/<table>`), the interface
//! exposed by hosted Postgres services. Counts use an exact-count header
//! probe instead of fetching rows; inserts ask for a minimal reply.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{GenerationRecord, UsageStore, VoiceRecord};
use crate::error::{Result, TtsError};

const VOICES_TABLE: &str = "user_voices";
const GENERATIONS_TABLE: &str = "tts_generations";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

pub struct RestStore {
    base_url: String,
    api_key: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TtsError::Store(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Exact row count for a user via the Content-Range reply header,
    /// without transferring any rows.
    async fn count(&self, table: &str, user_id: &str) -> Result<usize> {
        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("select", "user_id".to_string()),
            ])
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await
            .map_err(|e| TtsError::Store(format!("count request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtsError::Store(format!(
                "count request returned {}",
                response.status()
            )));
        }

        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| TtsError::Store("missing content-range header".to_string()))?;

        parse_total(content_range)
            .ok_or_else(|| TtsError::Store(format!("bad content-range: {}", content_range)))
    }

    async fn insert<T: serde::Serialize>(&self, table: &str, record: &T) -> Result<()> {
        let response = self
            .authed(self.client.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| TtsError::Store(format!("insert failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Store(format!(
                "insert into {} returned {}: {}",
                table, status, body
            )));
        }

        Ok(())
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        user_id: &str,
        newest_first: bool,
    ) -> Result<Vec<T>> {
        let mut query = vec![
            ("user_id", format!("eq.{}", user_id)),
            ("select", "*".to_string()),
        ];
        if newest_first {
            query.push(("order", "created_at.desc".to_string()));
        }

        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(&query)
            .send()
            .await
            .map_err(|e| TtsError::Store(format!("list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtsError::Store(format!(
                "list request returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TtsError::Store(format!("failed to parse {} rows: {}", table, e)))
    }
}

/// Parse the total out of a `Content-Range` value like `0-0/5` or `*/0`.
fn parse_total(content_range: &str) -> Option<usize> {
    content_range.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl UsageStore for RestStore {
    async fn voice_count(&self, user_id: &str) -> Result<usize> {
        self.count(VOICES_TABLE, user_id).await
    }

    async fn generation_count(&self, user_id: &str) -> Result<usize> {
        self.count(GENERATIONS_TABLE, user_id).await
    }

    async fn insert_voice(&self, record: &VoiceRecord) -> Result<()> {
        self.insert(VOICES_TABLE, record).await
    }

    async fn insert_generation(&self, record: &GenerationRecord) -> Result<()> {
        self.insert(GENERATIONS_TABLE, record).await
    }

    async fn list_voices(&self, user_id: &str) -> Result<Vec<VoiceRecord>> {
        self.list(VOICES_TABLE, user_id, false).await
    }

    async fn list_generations(&self, user_id: &str) -> Result<Vec<GenerationRecord>> {
        self.list(GENERATIONS_TABLE, user_id, true).await
    }

    async fn delete_voice(&self, user_id: &str, voice_id: &str) -> Result<()> {
        let response = self
            .authed(self.client.delete(self.table_url(VOICES_TABLE)))
            .query(&[
                ("user_id", format!("eq.{}", user_id)),
                ("voice_id", format!("eq.{}", voice_id)),
            ])
            .send()
            .await
            .map_err(|e| TtsError::Store(format!("delete failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(TtsError::Store(format!(
                "delete returned {}",
                response.status()
            )));
        }

        Ok(())
    }
}

//! Client for the hosted message table, spoken over its PostgREST interface.

use crate::error::AppError;
use crate::model::{ContactMessage, MessageType, NewContactMessage};
use crate::storage::MessageStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

pub const DEFAULT_TABLE: &str = "contact_test_app";

/// Connection settings for the hosted table.
#[derive(Debug)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: Url,
    /// Key sent both as `apikey` and as the bearer token.
    pub api_key: SecretString,
    pub table: String,
}

impl RestConfig {
    pub fn new(base_url: Url, api_key: SecretString) -> Self {
        Self {
            base_url,
            api_key,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn table_url(&self) -> Result<Url, AppError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("rest/v1/{}", self.table))
            .map_err(|err| AppError::invalid_data(format!("invalid table URL: {err}")))
    }
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    name: &'a str,
    email: &'a str,
    message: &'a str,
    #[serde(rename = "type")]
    message_type: MessageType,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
}

pub struct RestMessageStore {
    client: Client,
    config: RestConfig,
}

impl RestMessageStore {
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.config.api_key.expose_secret();
        request
            .header("apikey", key)
            .header("Authorization", format!("Bearer {key}"))
    }

    async fn rows_from(&self, res: Response) -> Result<Vec<ContactMessage>, AppError> {
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(%status, table = %self.config.table, "hosted table rejected request");
            return Err(AppError::upstream(format!("HTTP {status}: {text}")));
        }

        res.json::<Vec<ContactMessage>>()
            .await
            .map_err(|err| AppError::upstream(format!("Parse error: {err}")))
    }
}

#[async_trait]
impl MessageStore for RestMessageStore {
    async fn insert(&self, message: NewContactMessage) -> Result<ContactMessage, AppError> {
        let url = self.config.table_url()?;
        let row = InsertRow {
            name: &message.name,
            email: &message.email,
            message: &message.message,
            message_type: message.message_type,
            created_at: OffsetDateTime::now_utc(),
        };

        let request = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&[row]);
        let res = self.authorize(request).send().await?;

        let inserted = self
            .rows_from(res)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::upstream("insert returned no row"))?;
        debug!(id = inserted.id, table = %self.config.table, "inserted message");
        Ok(inserted)
    }

    async fn select_ordered(&self) -> Result<Vec<ContactMessage>, AppError> {
        let mut url = self.config.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc");
        let request = self.client.get(url);
        let res = self.authorize(request).send().await?;
        self.rows_from(res).await
    }
}

// src/source/http.rs

//! HTTP bulletin source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::source::{BulletinSource, extract_bulletin_text};

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &SourceConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetches the bulletin page over HTTP.
pub struct HttpBulletinSource {
    client: Client,
    url: String,
}

impl HttpBulletinSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        url::Url::parse(&config.url)?;
        Ok(Self {
            client: create_async_client(config)?,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl BulletinSource for HttpBulletinSource {
    fn name(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(&self.url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;
        log::debug!("Fetched {} bytes from {}", body.len(), self.url);

        Ok(extract_bulletin_text(&body))
    }
}

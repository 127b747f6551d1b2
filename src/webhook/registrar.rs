//! Helius webhook registrar
//!
//! Keeps one enhanced-transaction webhook subscribed to every deposit
//! wallet so incoming SOL triggers a pipeline run immediately instead of
//! waiting for the next cron cycle. Callers treat failures here as
//! non-fatal: registration must succeed even if the subscription does not.

use serde_json::json;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::PipelineError;

const API_BASE: &str = "https://api.helius.xyz/v0";

pub struct WebhookRegistrar {
    http: reqwest::Client,
    api_key: String,
    webhook_url: String,
    auth_secret: Option<String>,
    http_timeout: Duration,
}

impl WebhookRegistrar {
    /// `None` unless both the API key and a public webhook URL are set.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let api_key = config.helius_api_key.clone()?;
        let webhook_url = config.webhook_url.clone()?;
        Some(Self {
            http: reqwest::Client::new(),
            api_key,
            webhook_url,
            auth_secret: config.webhook_secret.clone(),
            http_timeout: Duration::from_secs(config.http_timeout_secs),
        })
    }

    /// Make sure `address` is covered by our webhook, creating the webhook
    /// on first use.
    pub async fn ensure_watched(&self, address: &str) -> Result<(), PipelineError> {
        match self.find_ours().await? {
            Some((webhook_id, mut addresses)) => {
                if addresses.iter().any(|a| a == address) {
                    log::debug!("{} already watched", address);
                    return Ok(());
                }
                addresses.push(address.to_string());
                self.update(&webhook_id, &addresses).await
            }
            None => self.create(&[address.to_string()]).await,
        }
    }

    /// Reconcile the webhook's address list with the full active set.
    pub async fn sync_all(&self, addresses: Vec<String>) -> Result<usize, PipelineError> {
        if addresses.is_empty() {
            log::info!("No deposit wallets to sync");
            return Ok(0);
        }
        let count = addresses.len();
        match self.find_ours().await? {
            Some((webhook_id, _)) => self.update(&webhook_id, &addresses).await?,
            None => self.create(&addresses).await?,
        }
        Ok(count)
    }

    /// Our webhook, identified by URL match, as (id, subscribed addresses).
    async fn find_ours(&self) -> Result<Option<(String, Vec<String>)>, PipelineError> {
        let response = self
            .http
            .get(format!("{}/webhooks?api-key={}", API_BASE, self.api_key))
            .timeout(self.http_timeout)
            .send()
            .await
            .map_err(|e| PipelineError::Registrar(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Registrar(format!(
                "Webhook listing failed: {}",
                response.status()
            )));
        }

        let webhooks: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| PipelineError::Registrar(e.to_string()))?;

        Ok(webhooks
            .iter()
            .find(|w| w["webhookURL"].as_str() == Some(self.webhook_url.as_str()))
            .map(|w| {
                let id = w["webhookID"].as_str().unwrap_or_default().to_string();
                let addresses = w["accountAddresses"]
                    .as_array()
                    .map(|list| {
                        list.iter()
                            .filter_map(|a| a.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                (id, addresses)
            }))
    }

    async fn create(&self, addresses: &[String]) -> Result<(), PipelineError> {
        let mut body = json!({
            "webhookURL": self.webhook_url,
            "transactionTypes": ["TRANSFER"],
            "accountAddresses": addresses,
            "webhookType": "enhanced",
        });
        if let Some(secret) = &self.auth_secret {
            body["authHeader"] = json!(secret);
        }

        let response = self
            .http
            .post(format!("{}/webhooks?api-key={}", API_BASE, self.api_key))
            .timeout(self.http_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Registrar(e.to_string()))?;

        if !response.status().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Registrar(format!(
                "Webhook creation failed: {}",
                text
            )));
        }
        log::info!("Created deposit webhook watching {} wallet(s)", addresses.len());
        Ok(())
    }

    async fn update(&self, webhook_id: &str, addresses: &[String]) -> Result<(), PipelineError> {
        let response = self
            .http
            .put(format!(
                "{}/webhooks/{}?api-key={}",
                API_BASE, webhook_id, self.api_key
            ))
            .timeout(self.http_timeout)
            .json(&json!({
                "webhookURL": self.webhook_url,
                "transactionTypes": ["TRANSFER"],
                "accountAddresses": addresses,
                "webhookType": "enhanced",
            }))
            .send()
            .await
            .map_err(|e| PipelineError::Registrar(e.to_string()))?;

        if !response.status().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Registrar(format!(
                "Webhook update failed: {}",
                text
            )));
        }
        log::info!("Webhook now watching {} wallet(s)", addresses.len());
        Ok(())
    }
}

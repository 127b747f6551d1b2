use chrono::Utc;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use super::models::{BurnRecord, NewProject, PlatformBurnRecord, Project};
use crate::config::AppConfig;
use crate::error::PipelineError;

/// The pipeline's view of the ledger store.
pub trait Ledger {
    fn active_projects(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Project>, PipelineError>> + Send;

    fn project_by_mint(
        &self,
        token_mint: &str,
    ) -> impl std::future::Future<Output = Result<Option<Project>, PipelineError>> + Send;

    fn project_by_deposit_address(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<Option<Project>, PipelineError>> + Send;

    fn register_project(
        &self,
        new: NewProject,
    ) -> impl std::future::Future<Output = Result<Project, PipelineError>> + Send;

    fn update_project_stats(
        &self,
        token_mint: &str,
        sol_delta: f64,
        burned_delta: f64,
    ) -> impl std::future::Future<Output = Result<(), PipelineError>> + Send;

    fn append_burn_record(
        &self,
        record: BurnRecord,
    ) -> impl std::future::Future<Output = Result<(), PipelineError>> + Send;

    fn append_platform_burn_record(
        &self,
        record: PlatformBurnRecord,
    ) -> impl std::future::Future<Output = Result<(), PipelineError>> + Send;

    /// Highest allocated wallet index + 1; index 0 stays reserved for the
    /// platform, so the first project gets index 1.
    fn next_wallet_index(
        &self,
    ) -> impl std::future::Future<Output = Result<u32, PipelineError>> + Send;
}

/// PostgREST client for the ledger store.
#[derive(Clone)]
pub struct LedgerClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    http_timeout: Duration,
}

impl LedgerClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.ledger_url.trim_end_matches('/').to_string(),
            service_key: config.ledger_service_key.clone(),
            http_timeout: Duration::from_secs(config.http_timeout_secs),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{}", self.base_url, path))
            .timeout(self.http_timeout)
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PipelineError> {
        let response = request
            .send()
            .await
            .map_err(|e| PipelineError::LedgerUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::LedgerUnavailable(format!(
                "{}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::LedgerUnavailable(e.to_string()))
    }

    async fn get_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, PipelineError> {
        self.send(self.request(Method::GET, path)).await
    }

    // Read-only queries for the HTTP surface; not part of the pipeline seam.

    pub async fn burn_history(
        &self,
        token_mint: &str,
        limit: usize,
    ) -> Result<Vec<BurnRecord>, PipelineError> {
        self.get_rows(&format!(
            "burn_history?token_mint=eq.{}&order=created_at.desc&limit={}",
            token_mint, limit
        ))
        .await
    }

    pub async fn recent_burns(&self, limit: usize) -> Result<Vec<BurnRecord>, PipelineError> {
        self.get_rows(&format!("burn_history?order=created_at.desc&limit={}", limit))
            .await
    }

    pub async fn platform_burns(&self) -> Result<Vec<PlatformBurnRecord>, PipelineError> {
        self.get_rows("platform_burns?order=created_at.desc").await
    }
}

impl Ledger for LedgerClient {
    async fn active_projects(&self) -> Result<Vec<Project>, PipelineError> {
        self.get_rows("projects?is_active=eq.true&order=created_at.desc")
            .await
    }

    async fn project_by_mint(&self, token_mint: &str) -> Result<Option<Project>, PipelineError> {
        let rows: Vec<Project> = self
            .get_rows(&format!("projects?token_mint=eq.{}", token_mint))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn project_by_deposit_address(
        &self,
        address: &str,
    ) -> Result<Option<Project>, PipelineError> {
        let rows: Vec<Project> = self
            .get_rows(&format!("projects?deposit_wallet=eq.{}", address))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn register_project(&self, new: NewProject) -> Result<Project, PipelineError> {
        let rows: Vec<Project> = self
            .send(self.request(Method::POST, "projects").json(&json!({
                "token_mint": new.token_mint,
                "token_name": new.token_name,
                "token_ticker": new.token_ticker,
                "creator_wallet": new.creator_wallet,
                "deposit_wallet": new.deposit_wallet,
                "deposit_wallet_index": new.deposit_wallet_index,
                "platform_fee_percent": new.platform_fee_percent,
                "total_sol_received": 0,
                "total_tokens_burned": 0,
                "total_burns": 0,
                "is_active": true,
                "created_at": Utc::now(),
            })))
            .await?;

        rows.into_iter().next().ok_or_else(|| {
            PipelineError::LedgerUnavailable("Insert returned no representation".to_string())
        })
    }

    async fn update_project_stats(
        &self,
        token_mint: &str,
        sol_delta: f64,
        burned_delta: f64,
    ) -> Result<(), PipelineError> {
        let project = self
            .project_by_mint(token_mint)
            .await?
            .ok_or_else(|| PipelineError::ProjectNotFound(token_mint.to_string()))?;

        let _: Vec<Project> = self
            .send(
                self.request(Method::PATCH, &format!("projects?token_mint=eq.{}", token_mint))
                    .json(&json!({
                        "total_sol_received": project.total_sol_received + sol_delta,
                        "total_tokens_burned": project.total_tokens_burned + burned_delta,
                        "total_burns": project.total_burns + 1,
                        "last_burn_at": Utc::now(),
                    })),
            )
            .await?;
        Ok(())
    }

    async fn append_burn_record(&self, record: BurnRecord) -> Result<(), PipelineError> {
        let record = BurnRecord {
            created_at: Some(Utc::now()),
            ..record
        };
        let _: Vec<BurnRecord> = self
            .send(self.request(Method::POST, "burn_history").json(&record))
            .await?;
        Ok(())
    }

    async fn append_platform_burn_record(
        &self,
        record: PlatformBurnRecord,
    ) -> Result<(), PipelineError> {
        let record = PlatformBurnRecord {
            created_at: Some(Utc::now()),
            ..record
        };
        let _: Vec<PlatformBurnRecord> = self
            .send(self.request(Method::POST, "platform_burns").json(&record))
            .await?;
        Ok(())
    }

    async fn next_wallet_index(&self) -> Result<u32, PipelineError> {
        let rows: Vec<serde_json::Value> = self
            .get_rows("projects?select=deposit_wallet_index&order=deposit_wallet_index.desc&limit=1")
            .await?;
        let highest = rows
            .first()
            .and_then(|row| row["deposit_wallet_index"].as_u64())
            .unwrap_or(0) as u32;
        Ok(highest + 1)
    }
}

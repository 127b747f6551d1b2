use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use super::types::{
    DashboardResponse, DepositResult, HealthResponse, ProjectStatsResponse, RegisterRequest,
    RegisterResponse, SyncWebhooksResponse, WebhookResponse, WebhookTransaction,
};
use crate::error::PipelineError;
use crate::pipeline::{CycleSummary, RunOutcome};
use crate::service::BuybackService;

pub async fn register_handler(
    State(service): State<Arc<BuybackService>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, PipelineError> {
    if request.token_mint.is_empty() || request.creator_wallet.is_empty() {
        return Err(PipelineError::InvalidInput(
            "token_mint and creator_wallet are required".to_string(),
        ));
    }
    Ok(Json(service.register_project(request).await?))
}

pub async fn run_project_handler(
    State(service): State<Arc<BuybackService>>,
    Path(token_mint): Path<String>,
) -> Result<Json<RunOutcome>, PipelineError> {
    Ok(Json(service.run_project(&token_mint).await?))
}

/// Cron trigger: run all active projects.
pub async fn run_cycle_handler(
    State(service): State<Arc<BuybackService>>,
    headers: HeaderMap,
) -> Result<Json<CycleSummary>, PipelineError> {
    if let Some(secret) = &service.config().cron_secret {
        let expected = format!("Bearer {}", secret);
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if provided != Some(expected.as_str()) {
            return Err(PipelineError::Unauthorized);
        }
    }
    Ok(Json(service.run_cycle().await?))
}

/// Helius pings this the moment SOL lands on a watched deposit wallet.
pub async fn webhook_handler(
    State(service): State<Arc<BuybackService>>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<WebhookResponse>, PipelineError> {
    if let Some(secret) = &service.config().webhook_secret {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if provided != Some(secret.as_str()) {
            log::warn!("Unauthorized webhook attempt");
            return Err(PipelineError::Unauthorized);
        }
    }

    // Helius sends an array of enhanced transactions; tolerate a single
    // object too. Entries that do not parse are ignored.
    let transactions: Vec<WebhookTransaction> = match payload {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        other => serde_json::from_value(other).ok().into_iter().collect(),
    };

    let received = transactions.len();
    log::info!("Webhook received: {} transaction(s)", received);

    let mut results = Vec::new();
    for tx in &transactions {
        for transfer in &tx.native_transfers {
            let Some(to) = &transfer.to_user_account else {
                continue;
            };
            match service.process_deposit(to).await {
                Ok(Some(outcome)) => results.push(DepositResult {
                    deposit_wallet: to.clone(),
                    token_mint: Some(outcome.token_mint.clone()),
                    outcome: Some(outcome),
                    error: None,
                }),
                // Not one of our deposit wallets
                Ok(None) => {}
                Err(e) => results.push(DepositResult {
                    deposit_wallet: to.clone(),
                    token_mint: None,
                    outcome: None,
                    error: Some(e.to_string()),
                }),
            }
        }
    }

    Ok(Json(WebhookResponse {
        received,
        processed: results.len(),
        results,
    }))
}

pub async fn sync_webhooks_handler(
    State(service): State<Arc<BuybackService>>,
) -> Result<Json<SyncWebhooksResponse>, PipelineError> {
    let synced = service.sync_webhooks().await?;
    Ok(Json(SyncWebhooksResponse { synced }))
}

pub async fn project_handler(
    State(service): State<Arc<BuybackService>>,
    Path(token_mint): Path<String>,
) -> Result<Json<ProjectStatsResponse>, PipelineError> {
    Ok(Json(service.project_stats(&token_mint).await?))
}

pub async fn dashboard_handler(
    State(service): State<Arc<BuybackService>>,
) -> Result<Json<DashboardResponse>, PipelineError> {
    Ok(Json(service.dashboard().await?))
}

pub async fn health_handler(
    State(service): State<Arc<BuybackService>>,
) -> (StatusCode, Json<HealthResponse>) {
    let report = service.health().await;
    let status = if report.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

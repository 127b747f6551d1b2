use serde::{Deserialize, Serialize};

use crate::ledger::{BurnRecord, Project};
use crate::pipeline::RunOutcome;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub token_mint: String,
    pub token_name: Option<String>,
    pub token_ticker: Option<String>,
    pub creator_wallet: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub project: Project,
    pub deposit_wallet: String,
    pub message: String,
}

/// One entry of a Helius enhanced-transaction webhook payload. Fields we
/// do not use are simply not modeled.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookTransaction {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub to_user_account: Option<String>,
    /// Lamports
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Serialize)]
pub struct DepositResult {
    pub deposit_wallet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_mint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RunOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub received: usize,
    pub processed: usize,
    pub results: Vec<DepositResult>,
}

#[derive(Debug, Serialize)]
pub struct SyncWebhooksResponse {
    pub synced: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectStatsResponse {
    pub project: Project,
    pub current_balance_sol: f64,
    pub burn_history: Vec<BurnRecord>,
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub total_projects: usize,
    pub total_sol_processed: f64,
    pub total_burns: u64,
}

#[derive(Debug, Serialize)]
pub struct PlatformTotals {
    pub total_sol_spent: f64,
    pub total_tokens_burned: f64,
    pub total_burns: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub overview: Overview,
    pub platform: PlatformTotals,
    pub projects: Vec<Project>,
    pub recent_burns: Vec<BurnRecord>,
}

#[derive(Debug, Serialize)]
pub struct HealthConfigReport {
    pub has_master_secret: bool,
    pub has_platform_token: bool,
    pub has_webhook_url: bool,
    pub has_telegram: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger: bool,
    pub rpc: bool,
    pub config: HealthConfigReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_payload_parses_helius_camel_case() {
        let payload = serde_json::json!({
            "signature": "5gS7...",
            "type": "TRANSFER",
            "tokenTransfers": [],
            "nativeTransfers": [
                { "fromUserAccount": "SenderAAA", "toUserAccount": "DepositAAA", "amount": 50_000_000u64 }
            ],
            "accountData": []
        });
        let tx: WebhookTransaction = serde_json::from_value(payload).unwrap();
        assert_eq!(tx.tx_type.as_deref(), Some("TRANSFER"));
        assert_eq!(tx.native_transfers.len(), 1);
        assert_eq!(
            tx.native_transfers[0].to_user_account.as_deref(),
            Some("DepositAAA")
        );
        assert_eq!(tx.native_transfers[0].amount, 50_000_000);
    }

    #[test]
    fn webhook_payload_tolerates_missing_transfers() {
        let tx: WebhookTransaction =
            serde_json::from_value(serde_json::json!({ "signature": "abc" })).unwrap();
        assert!(tx.native_transfers.is_empty());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered token project and its cumulative buyback stats.
///
/// Rows are created at registration and mutated only by the orchestrator
/// after a successful burn leg. Deactivation is a flag flip, never a
/// delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub token_mint: String,
    pub token_name: Option<String>,
    pub token_ticker: Option<String>,
    pub creator_wallet: String,
    pub deposit_wallet: String,
    pub deposit_wallet_index: u32,
    #[serde(default = "default_fee_percent")]
    pub platform_fee_percent: f64,
    #[serde(default)]
    pub total_sol_received: f64,
    #[serde(default)]
    pub total_tokens_burned: f64,
    #[serde(default)]
    pub total_burns: u32,
    pub last_burn_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Ticker when the project has one, otherwise the mint.
    pub fn label(&self) -> &str {
        self.token_ticker.as_deref().unwrap_or(&self.token_mint)
    }
}

fn default_fee_percent() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

/// Fields the service supplies when registering a project.
#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub token_mint: String,
    pub token_name: Option<String>,
    pub token_ticker: Option<String>,
    pub creator_wallet: String,
    pub deposit_wallet: String,
    pub deposit_wallet_index: u32,
    pub platform_fee_percent: f64,
}

/// Immutable log entry for one executed project-leg burn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnRecord {
    pub token_mint: String,
    pub sol_spent: f64,
    pub tokens_bought: Option<f64>,
    pub tokens_burned: f64,
    pub platform_fee_sol: Option<f64>,
    pub buy_signature: Option<String>,
    pub burn_signature: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Like [`BurnRecord`] but for the platform token, tagged with the project
/// whose fees funded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformBurnRecord {
    pub sol_spent: f64,
    pub tokens_burned: f64,
    pub buy_signature: Option<String>,
    pub burn_signature: Option<String>,
    pub source_project: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_rows_deserialize_with_sparse_columns() {
        let row = serde_json::json!({
            "token_mint": "MintAAA",
            "creator_wallet": "CreatorAAA",
            "deposit_wallet": "DepositAAA",
            "deposit_wallet_index": 3,
            "token_name": null,
            "token_ticker": null,
            "last_burn_at": null,
            "created_at": null
        });
        let project: Project = serde_json::from_value(row).unwrap();
        assert_eq!(project.platform_fee_percent, 2.0);
        assert_eq!(project.total_burns, 0);
        assert!(project.is_active);
        assert_eq!(project.label(), "MintAAA");
    }

    #[test]
    fn label_prefers_ticker() {
        let row = serde_json::json!({
            "token_mint": "MintAAA",
            "token_ticker": "AAA",
            "creator_wallet": "CreatorAAA",
            "deposit_wallet": "DepositAAA",
            "deposit_wallet_index": 1
        });
        let project: Project = serde_json::from_value(row).unwrap();
        assert_eq!(project.label(), "AAA");
    }
}

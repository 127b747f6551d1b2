//! The buyback-burn pipeline
//!
//! One orchestrator, parameterized by injected ledger/oracle/swap/burn
//! implementations, runs the same state machine for every trigger source:
//! balance check → fee split → project leg → platform leg → record.

pub mod lock;
pub mod orchestrator;
pub mod scheduler;

pub use lock::{ProjectLease, ProjectLocks};
pub use orchestrator::Orchestrator;
pub use scheduler::{BatchScheduler, CycleSummary, ProjectCycleResult};

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::ledger::Project;

/// The slice of configuration the pipeline itself needs.
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub master_secret: String,
    pub platform_token_mint: Option<Pubkey>,
    pub min_sol_for_buyback: f64,
    pub keep_sol_for_fees: f64,
    pub min_project_buy_sol: f64,
    pub min_platform_buy_sol: f64,
    pub settle_timeout: Duration,
    pub lease_ttl: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let platform_token_mint = config
            .platform_token_mint
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e| {
                PipelineError::Config(format!("PLATFORM_TOKEN_MINT is not a valid mint: {}", e))
            })?;

        Ok(Self {
            master_secret: config.master_secret.clone(),
            platform_token_mint,
            min_sol_for_buyback: config.min_sol_for_buyback,
            keep_sol_for_fees: config.keep_sol_for_fees,
            min_project_buy_sol: config.min_project_buy_sol,
            min_platform_buy_sol: config.min_platform_buy_sol,
            settle_timeout: Duration::from_secs(config.settle_timeout_secs),
            lease_ttl: Duration::from_secs(config.lease_ttl_secs),
        })
    }
}

/// How a deposit balance is divided between the two legs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeeSplit {
    pub available: f64,
    pub platform_fee: f64,
    pub project_portion: f64,
}

/// `available` is the balance minus the fee reserve; the platform fee is a
/// percentage of that, and the project gets the remainder, so the two
/// portions always sum back to `available`.
pub fn compute_split(balance: f64, keep_for_fees: f64, fee_percent: f64) -> FeeSplit {
    let available = (balance - keep_for_fees).max(0.0);
    let platform_fee = available * fee_percent / 100.0;
    FeeSplit {
        available,
        platform_fee,
        project_portion: available - platform_fee,
    }
}

/// Result of one swap+burn sub-operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegOutcome {
    Completed {
        sol_spent: f64,
        tokens_bought: f64,
        tokens_burned: f64,
        buy_signature: String,
        burn_signature: String,
    },
    /// Swap confirmed but nothing settled or the account came back empty;
    /// no record is written for this leg.
    NoTokensToBurn {
        sol_spent: f64,
        buy_signature: String,
    },
    /// Partial: funds were spent on a confirmed swap, the burn did not
    /// confirm. The buy signature is kept for reconciliation.
    BurnFailed {
        sol_spent: f64,
        buy_signature: String,
        error: String,
    },
    Skipped {
        reason: String,
    },
    SwapFailed {
        error: String,
    },
}

impl LegOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, LegOutcome::Completed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, LegOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Skipped { reason: String },
}

/// Structured outcome of one pipeline run. Always returned, never raised,
/// for anything short of a missing project, so operators can reconcile
/// on-chain activity even when a leg dies midway.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub token_mint: String,
    pub token_ticker: Option<String>,
    #[serde(flatten)]
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_sol: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<FeeSplit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_leg: Option<LegOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_leg: Option<LegOutcome>,
    /// Ledger writes that failed after a confirmed on-chain action; each
    /// one is an audit gap between chain state and recorded state.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ledger_errors: Vec<String>,
}

impl RunOutcome {
    pub fn skipped(project: &Project, balance_sol: Option<f64>, reason: &str) -> Self {
        Self {
            token_mint: project.token_mint.clone(),
            token_ticker: project.token_ticker.clone(),
            status: RunStatus::Skipped {
                reason: reason.to_string(),
            },
            balance_sol,
            split: None,
            project_leg: None,
            platform_leg: None,
            ledger_errors: Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, RunStatus::Skipped { .. })
    }
}

//! PumpPortal venue
//!
//! Covers pump.fun tokens on both the bonding curve and the AMM. The API
//! returns a fully built, serialized `VersionedTransaction`; we only sign
//! and submit it.

use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;

use super::{sign_and_submit, SwapOutcome, SwapVenue};
use crate::config::AppConfig;
use crate::error::PipelineError;

const TRADE_ENDPOINT: &str = "https://pumpportal.fun/api/trade-local";

pub struct PumpPortalVenue {
    http: reqwest::Client,
    rpc: Arc<RpcClient>,
    slippage_percent: f64,
    priority_fee_sol: f64,
    http_timeout: Duration,
    confirm_timeout: Duration,
}

impl PumpPortalVenue {
    pub fn new(rpc: Arc<RpcClient>, config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc,
            slippage_percent: config.slippage_percent,
            priority_fee_sol: config.priority_fee_sol,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
        }
    }
}

impl SwapVenue for PumpPortalVenue {
    fn name(&self) -> &'static str {
        "pumpportal"
    }

    async fn buy(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> Result<SwapOutcome, PipelineError> {
        log::debug!("PumpPortal: buying {} SOL of {}", sol_amount, mint);

        let response = self
            .http
            .post(TRADE_ENDPOINT)
            .timeout(self.http_timeout)
            .json(&json!({
                "publicKey": wallet.pubkey().to_string(),
                "action": "buy",
                "mint": mint.to_string(),
                "amount": sol_amount,
                "denominatedInSol": "true",
                "slippage": self.slippage_percent,
                "priorityFee": self.priority_fee_sol,
                "pool": "auto",
            }))
            .send()
            .await
            .map_err(|e| PipelineError::Venue(format!("PumpPortal request failed: {}", e)))?;

        if !response.status().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Venue(format!(
                "PumpPortal rejected the trade: {}",
                text
            )));
        }

        let tx_bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Venue(format!("PumpPortal response unreadable: {}", e)))?;
        let tx: VersionedTransaction = bincode::deserialize(&tx_bytes).map_err(|e| {
            PipelineError::Venue(format!("PumpPortal returned a malformed transaction: {}", e))
        })?;

        let signature = sign_and_submit(&self.rpc, wallet, tx, self.confirm_timeout).await?;

        Ok(SwapOutcome {
            signature: signature.to_string(),
            sol_spent: sol_amount,
        })
    }
}

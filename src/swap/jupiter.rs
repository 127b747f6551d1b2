//! Jupiter v6 venue
//!
//! General-purpose aggregator used as the fallback route: quote first,
//! then exchange the quote for a base64 transaction to sign and submit.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::sync::Arc;
use std::time::Duration;

use super::{sign_and_submit, SwapOutcome, SwapVenue};
use crate::config::AppConfig;
use crate::error::PipelineError;

const QUOTE_ENDPOINT: &str = "https://quote-api.jup.ag/v6/quote";
const SWAP_ENDPOINT: &str = "https://quote-api.jup.ag/v6/swap";

pub struct JupiterVenue {
    http: reqwest::Client,
    rpc: Arc<RpcClient>,
    slippage_bps: u64,
    http_timeout: Duration,
    confirm_timeout: Duration,
}

impl JupiterVenue {
    pub fn new(rpc: Arc<RpcClient>, config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc,
            slippage_bps: (config.slippage_percent * 100.0) as u64,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
        }
    }

    async fn quote(&self, mint: &Pubkey, lamports: u64) -> Result<serde_json::Value, PipelineError> {
        let response = self
            .http
            .get(QUOTE_ENDPOINT)
            .timeout(self.http_timeout)
            .query(&[
                ("inputMint", spl_token::native_mint::id().to_string()),
                ("outputMint", mint.to_string()),
                ("amount", lamports.to_string()),
                ("slippageBps", self.slippage_bps.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::Venue(format!("Jupiter quote request failed: {}", e)))?;

        if !response.status().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Venue(format!("Jupiter quote failed: {}", text)));
        }

        let quote: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Venue(format!("Jupiter quote unreadable: {}", e)))?;

        if let Some(error) = quote.get("error") {
            return Err(PipelineError::Venue(format!("No route found: {}", error)));
        }
        Ok(quote)
    }
}

impl SwapVenue for JupiterVenue {
    fn name(&self) -> &'static str {
        "jupiter"
    }

    async fn buy(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> Result<SwapOutcome, PipelineError> {
        let lamports = (sol_amount * LAMPORTS_PER_SOL as f64).floor() as u64;
        log::debug!("Jupiter: swapping {} lamports for {}", lamports, mint);

        let quote = self.quote(mint, lamports).await?;

        let response = self
            .http
            .post(SWAP_ENDPOINT)
            .timeout(self.http_timeout)
            .json(&json!({
                "quoteResponse": quote,
                "userPublicKey": wallet.pubkey().to_string(),
                "wrapAndUnwrapSol": true,
                "dynamicComputeUnitLimit": true,
                "prioritizationFeeLamports": "auto",
            }))
            .send()
            .await
            .map_err(|e| PipelineError::Venue(format!("Jupiter swap request failed: {}", e)))?;

        if !response.status().is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PipelineError::Venue(format!("Jupiter swap failed: {}", text)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Venue(format!("Jupiter swap unreadable: {}", e)))?;
        let tx_base64 = body["swapTransaction"].as_str().ok_or_else(|| {
            PipelineError::Venue("Jupiter returned no swap transaction".to_string())
        })?;

        let tx_bytes = BASE64
            .decode(tx_base64)
            .map_err(|e| PipelineError::Venue(format!("Jupiter transaction not base64: {}", e)))?;
        let tx: VersionedTransaction = bincode::deserialize(&tx_bytes).map_err(|e| {
            PipelineError::Venue(format!("Jupiter returned a malformed transaction: {}", e))
        })?;

        let signature = sign_and_submit(&self.rpc, wallet, tx, self.confirm_timeout).await?;

        Ok(SwapOutcome {
            signature: signature.to_string(),
            sol_spent: sol_amount,
        })
    }
}

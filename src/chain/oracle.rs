use solana_account_decoder::UiAccountData;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::error::PipelineError;

/// A wallet's holding of one mint, as reported by the chain.
#[derive(Debug, Clone)]
pub struct TokenBalance {
    /// Human-readable amount (`raw_amount / 10^decimals`)
    pub amount: f64,
    /// Amount in the token's smallest unit
    pub raw_amount: u64,
    pub decimals: u8,
    /// The token account holding the balance
    pub token_account: Pubkey,
    /// Which token program owns the account
    pub program_id: Pubkey,
}

/// Read-only chain queries the pipeline depends on.
///
/// A trait so the orchestrator can be driven against in-memory fakes.
pub trait BalanceOracle {
    fn sol_balance(
        &self,
        owner: &Pubkey,
    ) -> impl std::future::Future<Output = Result<f64, PipelineError>> + Send;

    /// `Ok(None)` means no token account exists for the mint, which is a
    /// normal zero-holdings outcome. Read failures are `OracleUnavailable`
    /// and must never be treated as a zero balance.
    fn token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> impl std::future::Future<Output = Result<Option<TokenBalance>, PipelineError>> + Send;
}

pub struct RpcOracle {
    rpc: Arc<RpcClient>,
}

impl RpcOracle {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self { rpc }
    }
}

impl BalanceOracle for RpcOracle {
    async fn sol_balance(&self, owner: &Pubkey) -> Result<f64, PipelineError> {
        let lamports = self
            .rpc
            .get_balance(owner)
            .await
            .map_err(|e| PipelineError::OracleUnavailable(e.to_string()))?;
        Ok(lamports as f64 / LAMPORTS_PER_SOL as f64)
    }

    async fn token_balance(
        &self,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Option<TokenBalance>, PipelineError> {
        find_token_account(&self.rpc, owner, mint).await
    }
}

/// Probe both token programs for the owner's account holding `mint`.
///
/// Checks the original SPL Token program first, then Token-2022, and
/// returns the first match. Shared by the oracle and the burn executor.
pub async fn find_token_account(
    rpc: &RpcClient,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Result<Option<TokenBalance>, PipelineError> {
    let mint_str = mint.to_string();

    for program_id in [spl_token::id(), spl_token_2022::id()] {
        let accounts = rpc
            .get_token_accounts_by_owner(owner, TokenAccountsFilter::ProgramId(program_id))
            .await
            .map_err(|e| PipelineError::OracleUnavailable(e.to_string()))?;

        for keyed in accounts {
            let UiAccountData::Json(parsed) = &keyed.account.data else {
                continue;
            };
            let info = &parsed.parsed["info"];
            if info["mint"].as_str() != Some(mint_str.as_str()) {
                continue;
            }

            let token_amount = &info["tokenAmount"];
            let raw_amount: u64 = token_amount["amount"]
                .as_str()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(0);
            let decimals = token_amount["decimals"].as_u64().unwrap_or(0) as u8;
            let amount = token_amount["uiAmount"]
                .as_f64()
                .unwrap_or_else(|| raw_amount as f64 / 10f64.powi(decimals as i32));
            let token_account = keyed.pubkey.parse().map_err(|e| {
                PipelineError::Chain(format!("Invalid token account address: {}", e))
            })?;

            return Ok(Some(TokenBalance {
                amount,
                raw_amount,
                decimals,
                token_account,
                program_id,
            }));
        }
    }

    Ok(None)
}

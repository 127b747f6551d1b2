use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account;
use std::sync::Arc;
use std::time::Duration;

use super::{BurnOutcome, BurnStrategy, TokenBurner};
use crate::chain::oracle::{find_token_account, TokenBalance};
use crate::chain::submit_and_confirm;
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::wallet::burn_vault_address;

pub struct BurnExecutor {
    rpc: Arc<RpcClient>,
    strategy: BurnStrategy,
    confirm_timeout: Duration,
}

impl BurnExecutor {
    pub fn new(rpc: Arc<RpcClient>, config: &AppConfig) -> Self {
        Self {
            rpc,
            strategy: config.burn_strategy,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
        }
    }

    /// Instructions sending the full holding to the burn vault, creating
    /// the vault's token account first when it does not exist yet.
    async fn incinerator_instructions(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
        holding: &TokenBalance,
    ) -> Result<Vec<Instruction>, PipelineError> {
        let vault = burn_vault_address();
        let vault_account =
            get_associated_token_address_with_program_id(&vault, mint, &holding.program_id);

        let mut instructions = Vec::new();

        let existing = self
            .rpc
            .get_account_with_commitment(&vault_account, CommitmentConfig::confirmed())
            .await
            .map_err(|e| PipelineError::Chain(format!("Vault account lookup failed: {}", e)))?
            .value;
        if existing.is_none() {
            log::debug!("Creating vault token account {}", vault_account);
            instructions.push(create_associated_token_account(
                &wallet.pubkey(),
                &vault,
                mint,
                &holding.program_id,
            ));
        }

        instructions.push(
            spl_token_2022::instruction::transfer_checked(
                &holding.program_id,
                &holding.token_account,
                mint,
                &vault_account,
                &wallet.pubkey(),
                &[],
                holding.raw_amount,
                holding.decimals,
            )
            .map_err(|e| PipelineError::BurnFailed(format!("Transfer build failed: {}", e)))?,
        );

        Ok(instructions)
    }
}

impl TokenBurner for BurnExecutor {
    async fn burn(&self, wallet: &Keypair, mint: &Pubkey) -> Result<BurnOutcome, PipelineError> {
        let owner = wallet.pubkey();

        let Some(holding) = find_token_account(&self.rpc, &owner, mint).await? else {
            return Ok(BurnOutcome::NoTokenAccount);
        };
        if holding.raw_amount == 0 {
            return Ok(BurnOutcome::ZeroBalance);
        }

        log::info!(
            "Burning {} tokens of {} from {}",
            holding.amount,
            mint,
            owner
        );

        // The whole raw balance, always; partial burns are not a thing here.
        let instructions = match self.strategy {
            BurnStrategy::Instruction => vec![spl_token_2022::instruction::burn(
                &holding.program_id,
                &holding.token_account,
                mint,
                &owner,
                &[],
                holding.raw_amount,
            )
            .map_err(|e| PipelineError::BurnFailed(format!("Burn build failed: {}", e)))?],
            BurnStrategy::Incinerator => {
                self.incinerator_instructions(wallet, mint, &holding).await?
            }
        };

        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| PipelineError::Chain(format!("Blockhash fetch failed: {}", e)))?;
        let tx =
            Transaction::new_signed_with_payer(&instructions, Some(&owner), &[wallet], blockhash);

        let signature = submit_and_confirm(&self.rpc, &tx, self.confirm_timeout)
            .await
            .map_err(|e| PipelineError::BurnFailed(e.to_string()))?;

        Ok(BurnOutcome::Burned {
            signature: signature.to_string(),
            amount: holding.amount,
            decimals: holding.decimals,
        })
    }
}

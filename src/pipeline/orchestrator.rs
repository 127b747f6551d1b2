use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;

use super::{compute_split, LegOutcome, PipelineSettings, ProjectLocks, RunOutcome, RunStatus};
use crate::burn::{BurnOutcome, TokenBurner};
use crate::chain::{await_token_settlement, BalanceOracle};
use crate::error::PipelineError;
use crate::ledger::{BurnRecord, Ledger, PlatformBurnRecord, Project};
use crate::notify::TelegramNotifier;
use crate::swap::TokenSwapper;
use crate::wallet::derive_wallet;

/// Per-project state machine: derive wallet → check balance → split →
/// project leg → platform leg → record → report.
///
/// The orchestrator owns no durable state; the ledger is the only
/// authority for what has been processed. Legs fail independently and
/// nothing is raised past the run result except a missing project.
pub struct Orchestrator<L, O, S, B> {
    settings: PipelineSettings,
    ledger: L,
    oracle: O,
    swapper: S,
    burner: B,
    notifier: Option<TelegramNotifier>,
    locks: Arc<ProjectLocks>,
}

impl<L, O, S, B> Orchestrator<L, O, S, B>
where
    L: Ledger + Send + Sync,
    O: BalanceOracle + Send + Sync,
    S: TokenSwapper + Send + Sync,
    B: TokenBurner + Send + Sync,
{
    pub fn new(
        settings: PipelineSettings,
        ledger: L,
        oracle: O,
        swapper: S,
        burner: B,
        notifier: Option<TelegramNotifier>,
    ) -> Self {
        let locks = Arc::new(ProjectLocks::new(settings.lease_ttl));
        Self {
            settings,
            ledger,
            oracle,
            swapper,
            burner,
            notifier,
            locks,
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Run the full buyback-burn pipeline for one project.
    pub async fn run(&self, token_mint: &str) -> Result<RunOutcome, PipelineError> {
        let project = self
            .ledger
            .project_by_mint(token_mint)
            .await?
            .ok_or_else(|| PipelineError::ProjectNotFound(token_mint.to_string()))?;

        // At most one in-flight run per project: cron and webhook triggers
        // must not race on the same custodial wallet.
        let Some(_lease) = self.locks.try_acquire(&project.token_mint) else {
            log::warn!("Run already in flight for {}, skipping", project.label());
            return Ok(RunOutcome::skipped(&project, None, "Run already in flight"));
        };

        let wallet = derive_wallet(&self.settings.master_secret, project.deposit_wallet_index);
        let owner = wallet.pubkey();
        log::info!("Processing {} (deposit wallet {})", project.label(), owner);

        let balance = self.oracle.sol_balance(&owner).await?;
        log::info!("Balance: {} SOL", balance);

        if balance < self.settings.min_sol_for_buyback {
            log::info!(
                "Skipping {}: {} SOL below minimum {}",
                project.label(),
                balance,
                self.settings.min_sol_for_buyback
            );
            return Ok(RunOutcome::skipped(
                &project,
                Some(balance),
                "Insufficient balance",
            ));
        }

        let project_mint: Pubkey = project.token_mint.parse().map_err(|e| {
            PipelineError::InvalidInput(format!("Project mint is not a valid pubkey: {}", e))
        })?;

        let split = compute_split(
            balance,
            self.settings.keep_sol_for_fees,
            project.platform_fee_percent,
        );
        log::info!(
            "Platform fee: {:.4} SOL, project buyback: {:.4} SOL",
            split.platform_fee,
            split.project_portion
        );

        let mut ledger_errors = Vec::new();

        let project_leg = if split.project_portion >= self.settings.min_project_buy_sol {
            let leg = self
                .execute_leg(&wallet, &owner, &project_mint, split.project_portion)
                .await;
            if let LegOutcome::Completed {
                sol_spent,
                tokens_bought,
                tokens_burned,
                buy_signature,
                burn_signature,
            } = &leg
            {
                self.record_project_leg(
                    &project,
                    split.platform_fee,
                    *sol_spent,
                    *tokens_bought,
                    *tokens_burned,
                    buy_signature,
                    burn_signature,
                    &mut ledger_errors,
                )
                .await;
                if let Some(notifier) = &self.notifier {
                    notifier
                        .notify_burn(
                            project.label(),
                            *sol_spent,
                            *tokens_burned,
                            buy_signature,
                            burn_signature,
                        )
                        .await;
                }
            }
            leg
        } else {
            LegOutcome::Skipped {
                reason: format!(
                    "Buyback portion {:.4} SOL below minimum",
                    split.project_portion
                ),
            }
        };

        let platform_leg = match self.settings.platform_token_mint {
            Some(platform_mint) if split.platform_fee >= self.settings.min_platform_buy_sol => {
                let leg = self
                    .execute_leg(&wallet, &owner, &platform_mint, split.platform_fee)
                    .await;
                if let LegOutcome::Completed {
                    sol_spent,
                    tokens_burned,
                    buy_signature,
                    burn_signature,
                    ..
                } = &leg
                {
                    self.record_platform_leg(
                        &project,
                        *sol_spent,
                        *tokens_burned,
                        buy_signature,
                        burn_signature,
                        &mut ledger_errors,
                    )
                    .await;
                    if let Some(notifier) = &self.notifier {
                        notifier
                            .notify_platform_burn(
                                *sol_spent,
                                *tokens_burned,
                                buy_signature,
                                burn_signature,
                                &project.token_mint,
                            )
                            .await;
                    }
                }
                leg
            }
            Some(_) => LegOutcome::Skipped {
                reason: format!(
                    "Platform fee {:.4} SOL below minimum",
                    split.platform_fee
                ),
            },
            None => LegOutcome::Skipped {
                reason: "No platform token configured".to_string(),
            },
        };

        Ok(RunOutcome {
            token_mint: project.token_mint.clone(),
            token_ticker: project.token_ticker.clone(),
            status: RunStatus::Completed,
            balance_sol: Some(balance),
            split: Some(split),
            project_leg: Some(project_leg),
            platform_leg: Some(platform_leg),
            ledger_errors,
        })
    }

    /// One swap+burn sub-operation. Every failure is caught here and folded
    /// into the leg outcome; an already-spent swap is never rolled back.
    async fn execute_leg(
        &self,
        wallet: &Keypair,
        owner: &Pubkey,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> LegOutcome {
        let swap = match self.swapper.buy_with_sol(wallet, mint, sol_amount).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Swap failed for {}: {}", mint, e);
                return LegOutcome::SwapFailed {
                    error: e.to_string(),
                };
            }
        };
        log::info!("Buy confirmed: {}", swap.signature);

        // Burns operate on settled balances only.
        let Some(settled) =
            await_token_settlement(&self.oracle, owner, mint, self.settings.settle_timeout).await
        else {
            log::warn!("No tokens settled after swap {}", swap.signature);
            return LegOutcome::NoTokensToBurn {
                sol_spent: swap.sol_spent,
                buy_signature: swap.signature,
            };
        };

        match self.burner.burn(wallet, mint).await {
            Ok(BurnOutcome::Burned {
                signature, amount, ..
            }) => {
                log::info!("Burn confirmed: {}", signature);
                LegOutcome::Completed {
                    sol_spent: swap.sol_spent,
                    tokens_bought: settled.amount,
                    tokens_burned: amount,
                    buy_signature: swap.signature,
                    burn_signature: signature,
                }
            }
            Ok(BurnOutcome::NoTokenAccount) | Ok(BurnOutcome::ZeroBalance) => {
                LegOutcome::NoTokensToBurn {
                    sol_spent: swap.sol_spent,
                    buy_signature: swap.signature,
                }
            }
            Err(e) => {
                log::error!("Burn failed after confirmed swap {}: {}", swap.signature, e);
                LegOutcome::BurnFailed {
                    sol_spent: swap.sol_spent,
                    buy_signature: swap.signature,
                    error: e.to_string(),
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_project_leg(
        &self,
        project: &Project,
        platform_fee: f64,
        sol_spent: f64,
        tokens_bought: f64,
        tokens_burned: f64,
        buy_signature: &str,
        burn_signature: &str,
        ledger_errors: &mut Vec<String>,
    ) {
        let record = BurnRecord {
            token_mint: project.token_mint.clone(),
            sol_spent,
            tokens_bought: Some(tokens_bought),
            tokens_burned,
            platform_fee_sol: Some(platform_fee),
            buy_signature: Some(buy_signature.to_string()),
            burn_signature: Some(burn_signature.to_string()),
            created_at: None,
        };
        if let Err(e) = self.ledger.append_burn_record(record).await {
            log::error!(
                "AUDIT GAP: burn {} confirmed on-chain but not recorded: {}",
                burn_signature,
                e
            );
            ledger_errors.push(format!("burn record not written: {}", e));
        }
        if let Err(e) = self
            .ledger
            .update_project_stats(&project.token_mint, sol_spent, tokens_burned)
            .await
        {
            log::error!(
                "AUDIT GAP: stats for {} not updated after burn {}: {}",
                project.token_mint,
                burn_signature,
                e
            );
            ledger_errors.push(format!("project stats not updated: {}", e));
        }
    }

    async fn record_platform_leg(
        &self,
        project: &Project,
        sol_spent: f64,
        tokens_burned: f64,
        buy_signature: &str,
        burn_signature: &str,
        ledger_errors: &mut Vec<String>,
    ) {
        let record = PlatformBurnRecord {
            sol_spent,
            tokens_burned,
            buy_signature: Some(buy_signature.to_string()),
            burn_signature: Some(burn_signature.to_string()),
            source_project: Some(project.token_mint.clone()),
            created_at: None,
        };
        if let Err(e) = self.ledger.append_platform_burn_record(record).await {
            log::error!(
                "AUDIT GAP: platform burn {} confirmed on-chain but not recorded: {}",
                burn_signature,
                e
            );
            ledger_errors.push(format!("platform burn record not written: {}", e));
        }
    }
}

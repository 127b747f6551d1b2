/// Buyback service - orchestration layer
///
/// Wires configuration into concrete components once at startup and
/// exposes the operations the HTTP surface delegates to.
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

use crate::api::types::{
    DashboardResponse, HealthConfigReport, HealthResponse, Overview, PlatformTotals,
    ProjectStatsResponse, RegisterRequest, RegisterResponse,
};
use crate::burn::BurnExecutor;
use crate::chain::{BalanceOracle, RpcOracle};
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::ledger::{Ledger, LedgerClient, NewProject};
use crate::notify::TelegramNotifier;
use crate::pipeline::{BatchScheduler, CycleSummary, Orchestrator, PipelineSettings, RunOutcome};
use crate::swap::{JupiterVenue, PumpPortalVenue, SwapRouter};
use crate::wallet::wallet_address;
use crate::webhook::WebhookRegistrar;

type ProdOrchestrator =
    Orchestrator<LedgerClient, RpcOracle, SwapRouter<PumpPortalVenue, JupiterVenue>, BurnExecutor>;

pub struct BuybackService {
    config: AppConfig,
    ledger: LedgerClient,
    oracle: RpcOracle,
    rpc: Arc<RpcClient>,
    orchestrator: ProdOrchestrator,
    scheduler: BatchScheduler,
    registrar: Option<WebhookRegistrar>,
    notifier: Option<TelegramNotifier>,
}

impl BuybackService {
    pub fn new(config: AppConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let settings = PipelineSettings::from_config(&config)?;

        let rpc = Arc::new(RpcClient::new(config.rpc_url.clone()));
        let ledger = LedgerClient::new(&config);

        let router = SwapRouter::new(
            PumpPortalVenue::new(Arc::clone(&rpc), &config),
            JupiterVenue::new(Arc::clone(&rpc), &config),
        );
        let orchestrator = Orchestrator::new(
            settings,
            ledger.clone(),
            RpcOracle::new(Arc::clone(&rpc)),
            router,
            BurnExecutor::new(Arc::clone(&rpc), &config),
            TelegramNotifier::from_config(&config),
        );

        Ok(Self {
            ledger,
            oracle: RpcOracle::new(Arc::clone(&rpc)),
            orchestrator,
            scheduler: BatchScheduler::new(&config),
            registrar: WebhookRegistrar::from_config(&config),
            notifier: TelegramNotifier::from_config(&config),
            rpc,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register a token project: allocate a wallet index, derive its
    /// deposit address, persist, then best-effort webhook subscription and
    /// notification.
    pub async fn register_project(
        &self,
        request: RegisterRequest,
    ) -> Result<RegisterResponse, PipelineError> {
        request
            .token_mint
            .parse::<Pubkey>()
            .map_err(|e| PipelineError::InvalidInput(format!("token_mint: {}", e)))?;
        request
            .creator_wallet
            .parse::<Pubkey>()
            .map_err(|e| PipelineError::InvalidInput(format!("creator_wallet: {}", e)))?;

        if self
            .ledger
            .project_by_mint(&request.token_mint)
            .await?
            .is_some()
        {
            return Err(PipelineError::AlreadyRegistered(request.token_mint));
        }

        let index = self.ledger.next_wallet_index().await?;
        let deposit_wallet = wallet_address(&self.config.master_secret, index);

        let project = self
            .ledger
            .register_project(NewProject {
                token_mint: request.token_mint,
                token_name: request.token_name,
                token_ticker: request.token_ticker,
                creator_wallet: request.creator_wallet,
                deposit_wallet: deposit_wallet.clone(),
                deposit_wallet_index: index,
                platform_fee_percent: self.config.platform_fee_percent,
            })
            .await?;
        log::info!(
            "Registered {} with deposit wallet {} (index {})",
            project.label(),
            deposit_wallet,
            index
        );

        if let Some(registrar) = &self.registrar {
            if let Err(e) = registrar.ensure_watched(&deposit_wallet).await {
                log::warn!(
                    "Could not subscribe {} for deposit notifications: {}",
                    deposit_wallet,
                    e
                );
            }
        }

        if let Some(notifier) = &self.notifier {
            notifier
                .notify_new_project(
                    project.token_name.as_deref(),
                    project.token_ticker.as_deref(),
                    &project.token_mint,
                    &deposit_wallet,
                )
                .await;
        }

        Ok(RegisterResponse {
            message: format!("Send creator fees to: {}", deposit_wallet),
            deposit_wallet,
            project,
        })
    }

    /// Run the pipeline for one project now.
    pub async fn run_project(&self, token_mint: &str) -> Result<RunOutcome, PipelineError> {
        self.orchestrator.run(token_mint).await
    }

    /// Run the pipeline for every active project.
    pub async fn run_cycle(&self) -> Result<CycleSummary, PipelineError> {
        self.scheduler.run_cycle(&self.orchestrator).await
    }

    /// Webhook path: a deposit landed on `address`; run the owning project
    /// if the address is one of ours.
    pub async fn process_deposit(
        &self,
        address: &str,
    ) -> Result<Option<RunOutcome>, PipelineError> {
        let Some(project) = self.ledger.project_by_deposit_address(address).await? else {
            return Ok(None);
        };
        log::info!("Deposit detected for {}", project.label());
        self.orchestrator
            .run(&project.token_mint)
            .await
            .map(Some)
    }

    /// Reconcile the webhook's watch list with all active deposit wallets.
    pub async fn sync_webhooks(&self) -> Result<usize, PipelineError> {
        let registrar = self.registrar.as_ref().ok_or_else(|| {
            PipelineError::Config("WEBHOOK_URL and HELIUS_API_KEY are required".to_string())
        })?;
        let addresses = self
            .ledger
            .active_projects()
            .await?
            .into_iter()
            .map(|p| p.deposit_wallet)
            .collect();
        registrar.sync_all(addresses).await
    }

    pub async fn project_stats(
        &self,
        token_mint: &str,
    ) -> Result<ProjectStatsResponse, PipelineError> {
        let project = self
            .ledger
            .project_by_mint(token_mint)
            .await?
            .ok_or_else(|| PipelineError::ProjectNotFound(token_mint.to_string()))?;

        let owner: Pubkey = project.deposit_wallet.parse().map_err(|e| {
            PipelineError::Chain(format!("Stored deposit wallet is not a valid pubkey: {}", e))
        })?;
        let current_balance_sol = self.oracle.sol_balance(&owner).await?;
        let burn_history = self.ledger.burn_history(token_mint, 50).await?;

        Ok(ProjectStatsResponse {
            project,
            current_balance_sol,
            burn_history,
        })
    }

    pub async fn dashboard(&self) -> Result<DashboardResponse, PipelineError> {
        let projects = self.ledger.active_projects().await?;
        let recent_burns = self.ledger.recent_burns(50).await?;
        let platform_burns = self.ledger.platform_burns().await?;

        Ok(DashboardResponse {
            overview: Overview {
                total_projects: projects.len(),
                total_sol_processed: projects.iter().map(|p| p.total_sol_received).sum(),
                total_burns: projects.iter().map(|p| p.total_burns as u64).sum(),
            },
            platform: PlatformTotals {
                total_sol_spent: platform_burns.iter().map(|b| b.sol_spent).sum(),
                total_tokens_burned: platform_burns.iter().map(|b| b.tokens_burned).sum(),
                total_burns: platform_burns.len(),
            },
            projects,
            recent_burns,
        })
    }

    pub async fn health(&self) -> HealthResponse {
        let ledger = match self.ledger.active_projects().await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Health check: ledger unreachable: {}", e);
                false
            }
        };
        let rpc = match self.rpc.get_health().await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Health check: RPC unreachable: {}", e);
                false
            }
        };

        HealthResponse {
            status: if ledger && rpc { "healthy" } else { "degraded" }.to_string(),
            ledger,
            rpc,
            config: HealthConfigReport {
                has_master_secret: !self.config.master_secret.is_empty(),
                has_platform_token: self.config.platform_token_mint.is_some(),
                has_webhook_url: self.config.webhook_url.is_some(),
                has_telegram: self.config.telegram_bot_token.is_some()
                    && self.config.telegram_chat_id.is_some(),
            },
        }
    }
}

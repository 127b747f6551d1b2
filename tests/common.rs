/// Shared test doubles for pipeline integration tests
///
/// In-memory implementations of the ledger, oracle, swapper, and burner
/// seams, with counters so tests can assert exactly which side effects a
/// run produced.
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use flywheel::burn::{BurnOutcome, TokenBurner};
use flywheel::chain::{BalanceOracle, TokenBalance};
use flywheel::error::PipelineError;
use flywheel::ledger::{BurnRecord, Ledger, NewProject, PlatformBurnRecord, Project};
use flywheel::pipeline::PipelineSettings;
use flywheel::swap::{SwapOutcome, TokenSwapper};

pub const TEST_SECRET: &str = "test-master-secret";

pub fn test_settings(platform_token_mint: Option<Pubkey>) -> PipelineSettings {
    PipelineSettings {
        master_secret: TEST_SECRET.to_string(),
        platform_token_mint,
        min_sol_for_buyback: 0.02,
        keep_sol_for_fees: 0.005,
        min_project_buy_sol: 0.01,
        // Low enough that a 2% fee on a small deposit still runs the leg
        min_platform_buy_sol: 0.0005,
        settle_timeout: Duration::from_millis(20),
        lease_ttl: Duration::from_secs(60),
    }
}

pub fn test_project(token_mint: &str, index: u32) -> Project {
    Project {
        token_mint: token_mint.to_string(),
        token_name: Some(format!("Project {}", index)),
        token_ticker: Some(format!("P{}", index)),
        creator_wallet: Pubkey::new_unique().to_string(),
        deposit_wallet: flywheel::wallet::wallet_address(TEST_SECRET, index),
        deposit_wallet_index: index,
        platform_fee_percent: 2.0,
        total_sol_received: 0.0,
        total_tokens_burned: 0.0,
        total_burns: 0,
        last_burn_at: None,
        is_active: true,
        created_at: None,
    }
}

pub fn holding(amount: f64, decimals: u8) -> TokenBalance {
    let raw_amount = (amount * 10f64.powi(decimals as i32)) as u64;
    TokenBalance {
        amount,
        raw_amount,
        decimals,
        token_account: Pubkey::new_unique(),
        program_id: Pubkey::new_unique(),
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryLedger {
    pub projects: Mutex<Vec<Project>>,
    pub burn_records: Arc<Mutex<Vec<BurnRecord>>>,
    pub platform_records: Arc<Mutex<Vec<PlatformBurnRecord>>>,
    pub stat_updates: Arc<Mutex<Vec<(String, f64, f64)>>>,
    /// When set, every write fails with `LedgerUnavailable`
    pub fail_writes: bool,
}

impl MemoryLedger {
    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: Mutex::new(projects),
            ..Default::default()
        }
    }

    fn write_guard(&self) -> Result<(), PipelineError> {
        if self.fail_writes {
            Err(PipelineError::LedgerUnavailable(
                "store offline".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

impl Ledger for MemoryLedger {
    async fn active_projects(&self) -> Result<Vec<Project>, PipelineError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }

    async fn project_by_mint(&self, token_mint: &str) -> Result<Option<Project>, PipelineError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.token_mint == token_mint)
            .cloned())
    }

    async fn project_by_deposit_address(
        &self,
        address: &str,
    ) -> Result<Option<Project>, PipelineError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.deposit_wallet == address)
            .cloned())
    }

    async fn register_project(&self, new: NewProject) -> Result<Project, PipelineError> {
        self.write_guard()?;
        let project = Project {
            token_mint: new.token_mint,
            token_name: new.token_name,
            token_ticker: new.token_ticker,
            creator_wallet: new.creator_wallet,
            deposit_wallet: new.deposit_wallet,
            deposit_wallet_index: new.deposit_wallet_index,
            platform_fee_percent: new.platform_fee_percent,
            total_sol_received: 0.0,
            total_tokens_burned: 0.0,
            total_burns: 0,
            last_burn_at: None,
            is_active: true,
            created_at: None,
        };
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn update_project_stats(
        &self,
        token_mint: &str,
        sol_delta: f64,
        burned_delta: f64,
    ) -> Result<(), PipelineError> {
        self.write_guard()?;
        self.stat_updates
            .lock()
            .unwrap()
            .push((token_mint.to_string(), sol_delta, burned_delta));
        Ok(())
    }

    async fn append_burn_record(&self, record: BurnRecord) -> Result<(), PipelineError> {
        self.write_guard()?;
        self.burn_records.lock().unwrap().push(record);
        Ok(())
    }

    async fn append_platform_burn_record(
        &self,
        record: PlatformBurnRecord,
    ) -> Result<(), PipelineError> {
        self.write_guard()?;
        self.platform_records.lock().unwrap().push(record);
        Ok(())
    }

    async fn next_wallet_index(&self) -> Result<u32, PipelineError> {
        let highest = self
            .projects
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.deposit_wallet_index)
            .max()
            .unwrap_or(0);
        Ok(highest + 1)
    }
}

// ---------------------------------------------------------------------------
// Oracle
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockOracle {
    pub default_sol: f64,
    pub sol_by_owner: HashMap<Pubkey, f64>,
    pub fail_owners: HashSet<Pubkey>,
    /// What settles into the wallet after any successful swap
    pub token: Option<TokenBalance>,
}

impl MockOracle {
    pub fn with_sol(default_sol: f64) -> Self {
        Self {
            default_sol,
            ..Default::default()
        }
    }
}

impl BalanceOracle for MockOracle {
    async fn sol_balance(&self, owner: &Pubkey) -> Result<f64, PipelineError> {
        if self.fail_owners.contains(owner) {
            return Err(PipelineError::OracleUnavailable("rpc timeout".to_string()));
        }
        Ok(self.sol_by_owner.get(owner).copied().unwrap_or(self.default_sol))
    }

    async fn token_balance(
        &self,
        _owner: &Pubkey,
        _mint: &Pubkey,
    ) -> Result<Option<TokenBalance>, PipelineError> {
        Ok(self.token.clone())
    }
}

// ---------------------------------------------------------------------------
// Swapper
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockSwapper {
    pub fail: bool,
    pub delay: Duration,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<(Pubkey, f64)>>>,
}

impl TokenSwapper for MockSwapper {
    async fn buy_with_sol(
        &self,
        _wallet: &Keypair,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> Result<SwapOutcome, PipelineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(PipelineError::SwapFailed {
                primary: "pumpportal: curve closed".to_string(),
                fallback: "jupiter: no route".to_string(),
            });
        }
        self.requests.lock().unwrap().push((*mint, sol_amount));
        Ok(SwapOutcome {
            signature: format!("buy-sig-{}", call),
            sol_spent: sol_amount,
        })
    }
}

// ---------------------------------------------------------------------------
// Burner
// ---------------------------------------------------------------------------

pub enum BurnBehavior {
    /// Burn the configured amount successfully
    Succeed { amount: f64 },
    /// Tokens never arrived: nothing to burn
    Empty,
    Fail,
}

pub struct MockBurner {
    pub behavior: BurnBehavior,
    pub calls: Arc<AtomicUsize>,
}

impl MockBurner {
    pub fn new(behavior: BurnBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl TokenBurner for MockBurner {
    async fn burn(&self, _wallet: &Keypair, _mint: &Pubkey) -> Result<BurnOutcome, PipelineError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            BurnBehavior::Succeed { amount } => Ok(BurnOutcome::Burned {
                signature: format!("burn-sig-{}", call),
                amount: *amount,
                decimals: 6,
            }),
            BurnBehavior::Empty => Ok(BurnOutcome::ZeroBalance),
            BurnBehavior::Fail => Err(PipelineError::BurnFailed(
                "blockhash expired".to_string(),
            )),
        }
    }
}

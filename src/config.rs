/// Service configuration from environment variables
///
/// Built once in `main` and passed by reference into every component
/// constructor. Pipeline code never reads the environment directly.
use std::env;

use crate::burn::BurnStrategy;
use crate::error::PipelineError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Master secret all custodial wallets are derived from (never persisted)
    pub master_secret: String,
    /// Solana JSON-RPC endpoint
    pub rpc_url: String,
    /// Helius API key (webhook registrar; also the default RPC endpoint)
    pub helius_api_key: Option<String>,
    /// PostgREST base URL of the ledger store
    pub ledger_url: String,
    /// Service key for the ledger store
    pub ledger_service_key: String,
    /// Mint of the platform token bought back with the fee portion
    pub platform_token_mint: Option<String>,
    /// Fee percentage applied to newly registered projects
    pub platform_fee_percent: f64,
    /// Wallet index reserved for the platform itself
    pub platform_wallet_index: u32,
    /// Deposit balance below this is skipped entirely
    pub min_sol_for_buyback: f64,
    /// SOL left in the deposit wallet to cover transaction fees
    pub keep_sol_for_fees: f64,
    /// Smallest project-leg swap worth submitting
    pub min_project_buy_sol: f64,
    /// Smallest platform-leg swap worth submitting
    pub min_platform_buy_sol: f64,
    /// Slippage tolerance in percent, attached to every swap request
    pub slippage_percent: f64,
    /// Priority fee in SOL, attached to every swap request
    pub priority_fee_sol: f64,
    /// How acquired tokens are destroyed
    pub burn_strategy: BurnStrategy,
    /// Public URL Helius should POST deposit notifications to
    pub webhook_url: Option<String>,
    /// Shared secret expected in the webhook auth header
    pub webhook_secret: Option<String>,
    /// Bearer secret expected on the cycle (cron) endpoint
    pub cron_secret: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Upper bound on a single confirmation wait
    pub confirm_timeout_secs: u64,
    /// Upper bound on the post-swap settlement wait
    pub settle_timeout_secs: u64,
    /// Upper bound on any venue/ledger HTTP round trip
    pub http_timeout_secs: u64,
    /// Pause between projects within one batch cycle
    pub project_pacing_ms: u64,
    /// Whole-cycle time budget
    pub cycle_timeout_secs: u64,
    /// Per-project lease expiry (guards against leaked leases)
    pub lease_ttl_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Required: `SEED_PHRASE`, `SUPABASE_URL`, `SUPABASE_KEY`, and either
    /// `SOLANA_RPC_URL` or `HELIUS_API_KEY`. Everything else has defaults.
    pub fn from_env() -> Self {
        let master_secret = env::var("SEED_PHRASE").unwrap_or_default();
        let helius_api_key = env::var("HELIUS_API_KEY").ok().filter(|k| !k.is_empty());

        let rpc_url = env::var("SOLANA_RPC_URL").unwrap_or_else(|_| match &helius_api_key {
            Some(key) => format!("https://mainnet.helius-rpc.com/?api-key={}", key),
            None => String::new(),
        });

        let burn_strategy = match env::var("BURN_STRATEGY")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "incinerator" | "transfer" => BurnStrategy::Incinerator,
            "instruction" | "burn" | "" => BurnStrategy::Instruction,
            other => {
                log::warn!(
                    "Unknown BURN_STRATEGY '{}', defaulting to the burn instruction",
                    other
                );
                BurnStrategy::Instruction
            }
        };

        let platform_token_mint = env::var("PLATFORM_TOKEN_MINT")
            .ok()
            .filter(|m| !m.is_empty());
        if platform_token_mint.is_none() {
            log::warn!("PLATFORM_TOKEN_MINT not set; platform-leg burns are disabled");
        }

        Self {
            master_secret,
            rpc_url,
            helius_api_key,
            ledger_url: env::var("SUPABASE_URL").unwrap_or_default(),
            ledger_service_key: env::var("SUPABASE_KEY").unwrap_or_default(),
            platform_token_mint,
            platform_fee_percent: env_f64("PLATFORM_FEE_PERCENT", 2.0),
            platform_wallet_index: env_u64("PLATFORM_BURN_WALLET_INDEX", 0) as u32,
            min_sol_for_buyback: env_f64("MIN_SOL_FOR_BUYBACK", 0.02),
            keep_sol_for_fees: env_f64("KEEP_SOL_FOR_FEES", 0.005),
            min_project_buy_sol: env_f64("MIN_PROJECT_BUY_SOL", 0.01),
            min_platform_buy_sol: env_f64("MIN_PLATFORM_BUY_SOL", 0.005),
            slippage_percent: env_f64("SLIPPAGE_PERCENT", 25.0),
            priority_fee_sol: env_f64("PRIORITY_FEE_SOL", 0.0005),
            burn_strategy,
            webhook_url: env::var("WEBHOOK_URL").ok().filter(|u| !u.is_empty()),
            webhook_secret: env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty()),
            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|t| !t.is_empty()),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok().filter(|c| !c.is_empty()),
            confirm_timeout_secs: env_u64("CONFIRM_TIMEOUT_SECS", 30),
            settle_timeout_secs: env_u64("SETTLE_TIMEOUT_SECS", 20),
            http_timeout_secs: env_u64("HTTP_TIMEOUT_SECS", 30),
            project_pacing_ms: env_u64("PROJECT_PACING_MS", 1000),
            cycle_timeout_secs: env_u64("CYCLE_TIMEOUT_SECS", 600),
            lease_ttl_secs: env_u64("LEASE_TTL_SECS", 120),
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.master_secret.is_empty() {
            return Err(PipelineError::Config("SEED_PHRASE is not set".into()));
        }
        if self.rpc_url.is_empty() {
            return Err(PipelineError::Config(
                "Set SOLANA_RPC_URL or HELIUS_API_KEY".into(),
            ));
        }
        if self.ledger_url.is_empty() || self.ledger_service_key.is_empty() {
            return Err(PipelineError::Config(
                "SUPABASE_URL and SUPABASE_KEY are required".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.platform_fee_percent) {
            return Err(PipelineError::Config(format!(
                "PLATFORM_FEE_PERCENT must be within 0..=100, got {}",
                self.platform_fee_percent
            )));
        }
        Ok(())
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Could not parse {}='{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Could not parse {}='{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl Default for AppConfig {
    /// Defaults mirroring `from_env` with an empty environment
    fn default() -> Self {
        Self {
            master_secret: String::new(),
            rpc_url: String::new(),
            helius_api_key: None,
            ledger_url: String::new(),
            ledger_service_key: String::new(),
            platform_token_mint: None,
            platform_fee_percent: 2.0,
            platform_wallet_index: 0,
            min_sol_for_buyback: 0.02,
            keep_sol_for_fees: 0.005,
            min_project_buy_sol: 0.01,
            min_platform_buy_sol: 0.005,
            slippage_percent: 25.0,
            priority_fee_sol: 0.0005,
            burn_strategy: BurnStrategy::Instruction,
            webhook_url: None,
            webhook_secret: None,
            cron_secret: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
            confirm_timeout_secs: 30,
            settle_timeout_secs: 20,
            http_timeout_secs: 30,
            project_pacing_ms: 1000,
            cycle_timeout_secs: 600,
            lease_ttl_secs: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_production_values() {
        let config = AppConfig::default();
        assert_eq!(config.platform_fee_percent, 2.0);
        assert_eq!(config.min_sol_for_buyback, 0.02);
        assert_eq!(config.keep_sol_for_fees, 0.005);
        assert!(matches!(config.burn_strategy, BurnStrategy::Instruction));
    }

    #[test]
    fn validate_rejects_missing_secret() {
        let config = AppConfig {
            rpc_url: "http://localhost:8899".into(),
            ledger_url: "http://localhost:54321".into(),
            ledger_service_key: "key".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_out_of_range_fee() {
        let config = AppConfig {
            master_secret: "secret".into(),
            rpc_url: "http://localhost:8899".into(),
            ledger_url: "http://localhost:54321".into(),
            ledger_service_key: "key".into(),
            platform_fee_percent: 120.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

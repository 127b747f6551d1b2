//! Swap execution
//!
//! A swap is always "spend SOL, receive tokens". Venues build the
//! transaction server-side; we sign locally, submit, and wait for
//! confirmation. The router tries the bonding-curve venue first and falls
//! back to the aggregator.

pub mod jupiter;
pub mod pump_portal;

pub use jupiter::JupiterVenue;
pub use pump_portal::PumpPortalVenue;

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;

use crate::chain::submit_and_confirm;
use crate::error::PipelineError;

/// SOL amounts are truncated to this many fractional digits before they go
/// to a venue; trailing float noise gets quotes rejected.
const SOL_AMOUNT_DECIMALS: u32 = 4;

#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// Confirmed transaction signature
    pub signature: String,
    pub sol_spent: f64,
}

/// One swap-execution service.
pub trait SwapVenue {
    fn name(&self) -> &'static str;

    fn buy(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> impl std::future::Future<Output = Result<SwapOutcome, PipelineError>> + Send;
}

/// What the orchestrator sees: a single buy operation with routing and
/// fallback hidden behind it.
pub trait TokenSwapper {
    fn buy_with_sol(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> impl std::future::Future<Output = Result<SwapOutcome, PipelineError>> + Send;
}

pub struct SwapRouter<P, S> {
    primary: P,
    secondary: S,
}

impl<P: SwapVenue, S: SwapVenue> SwapRouter<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P, S> TokenSwapper for SwapRouter<P, S>
where
    P: SwapVenue + Sync,
    S: SwapVenue + Sync,
{
    async fn buy_with_sol(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
        sol_amount: f64,
    ) -> Result<SwapOutcome, PipelineError> {
        let sol_amount = truncate_sol(sol_amount);

        match self.primary.buy(wallet, mint, sol_amount).await {
            Ok(outcome) => Ok(outcome),
            Err(primary_err) => {
                log::warn!(
                    "{} failed ({}), retrying via {}",
                    self.primary.name(),
                    primary_err,
                    self.secondary.name()
                );
                self.secondary
                    .buy(wallet, mint, sol_amount)
                    .await
                    .map_err(|fallback_err| PipelineError::SwapFailed {
                        primary: format!("{}: {}", self.primary.name(), primary_err),
                        fallback: format!("{}: {}", self.secondary.name(), fallback_err),
                    })
            }
        }
    }
}

/// Truncate (never round up) to [`SOL_AMOUNT_DECIMALS`] fractional digits.
pub fn truncate_sol(amount: f64) -> f64 {
    let scale = 10f64.powi(SOL_AMOUNT_DECIMALS as i32);
    (amount * scale).floor() / scale
}

/// Sign a venue-built transaction as the sole fee payer and submit it.
pub(crate) async fn sign_and_submit(
    rpc: &RpcClient,
    wallet: &Keypair,
    mut tx: VersionedTransaction,
    confirm_timeout: Duration,
) -> Result<Signature, PipelineError> {
    let signature = wallet.sign_message(&tx.message.serialize());
    if tx.signatures.is_empty() {
        tx.signatures.push(signature);
    } else {
        tx.signatures[0] = signature;
    }
    submit_and_confirm(rpc, &tx, confirm_timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedVenue {
        name: &'static str,
        outcome: Result<&'static str, &'static str>,
    }

    impl SwapVenue for FixedVenue {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn buy(
            &self,
            _wallet: &Keypair,
            _mint: &Pubkey,
            sol_amount: f64,
        ) -> Result<SwapOutcome, PipelineError> {
            match self.outcome {
                Ok(signature) => Ok(SwapOutcome {
                    signature: signature.to_string(),
                    sol_spent: sol_amount,
                }),
                Err(message) => Err(PipelineError::Venue(message.to_string())),
            }
        }
    }

    #[test]
    fn truncation_drops_float_noise() {
        assert_eq!(truncate_sol(0.045 * 0.02), 0.0009);
        assert_eq!(truncate_sol(0.123456), 0.1234);
        assert_eq!(truncate_sol(1.0), 1.0);
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let router = SwapRouter::new(
            FixedVenue { name: "primary", outcome: Ok("sig-primary") },
            FixedVenue { name: "fallback", outcome: Err("should not be called") },
        );
        let outcome = router
            .buy_with_sol(&Keypair::new(), &Pubkey::new_unique(), 0.05)
            .await
            .unwrap();
        assert_eq!(outcome.signature, "sig-primary");
    }

    #[tokio::test]
    async fn fallback_covers_primary_failure() {
        let router = SwapRouter::new(
            FixedVenue { name: "primary", outcome: Err("curve closed") },
            FixedVenue { name: "fallback", outcome: Ok("sig-fallback") },
        );
        let outcome = router
            .buy_with_sol(&Keypair::new(), &Pubkey::new_unique(), 0.05)
            .await
            .unwrap();
        assert_eq!(outcome.signature, "sig-fallback");
    }

    #[tokio::test]
    async fn both_failing_yields_one_aggregated_error() {
        let router = SwapRouter::new(
            FixedVenue { name: "primary", outcome: Err("curve closed") },
            FixedVenue { name: "fallback", outcome: Err("no route") },
        );
        let err = router
            .buy_with_sol(&Keypair::new(), &Pubkey::new_unique(), 0.05)
            .await
            .unwrap_err();
        match err {
            PipelineError::SwapFailed { primary, fallback } => {
                assert!(primary.contains("curve closed"));
                assert!(fallback.contains("no route"));
            }
            other => panic!("expected SwapFailed, got {:?}", other),
        }
    }
}

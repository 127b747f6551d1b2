//! Token destruction
//!
//! The pipeline always burns a wallet's entire holding of a mint, either
//! with the SPL burn instruction or by transferring to the unrecoverable
//! burn vault. Which one runs is a configuration choice.

pub mod executor;

pub use executor::BurnExecutor;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;

use crate::error::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurnStrategy {
    /// SPL burn instruction: reduces token supply directly
    Instruction,
    /// Full-balance transfer to the burn vault's token account
    Incinerator,
}

#[derive(Debug, Clone)]
pub enum BurnOutcome {
    Burned {
        signature: String,
        /// Human-readable amount destroyed
        amount: f64,
        decimals: u8,
    },
    /// No token account exists for the mint on either token program
    NoTokenAccount,
    /// The account exists but holds nothing
    ZeroBalance,
}

pub trait TokenBurner {
    fn burn(
        &self,
        wallet: &Keypair,
        mint: &Pubkey,
    ) -> impl std::future::Future<Output = Result<BurnOutcome, PipelineError>> + Send;
}

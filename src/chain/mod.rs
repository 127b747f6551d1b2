//! Chain access
//!
//! - Balance and token-account queries
//! - Transaction submission and bounded confirmation waits
//! - Post-swap settlement polling

pub mod confirm;
pub mod oracle;
pub mod settle;

pub use confirm::{await_confirmation, submit_and_confirm};
pub use oracle::{BalanceOracle, RpcOracle, TokenBalance};
pub use settle::await_token_settlement;

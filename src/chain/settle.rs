use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tokio::time::Instant;

use super::oracle::{BalanceOracle, TokenBalance};

const INITIAL_PROBE_DELAY: Duration = Duration::from_millis(250);
const MAX_PROBE_DELAY: Duration = Duration::from_secs(4);

/// Wait for purchased tokens to appear in the wallet after a confirmed swap.
///
/// Polls the oracle with exponential backoff up to `timeout`. A balance
/// still at zero when the deadline passes is the authoritative "no tokens
/// received" outcome; transient probe failures only consume time.
pub async fn await_token_settlement<O: BalanceOracle>(
    oracle: &O,
    owner: &Pubkey,
    mint: &Pubkey,
    timeout: Duration,
) -> Option<TokenBalance> {
    let deadline = Instant::now() + timeout;
    let mut delay = INITIAL_PROBE_DELAY;

    loop {
        match oracle.token_balance(owner, mint).await {
            Ok(Some(balance)) if balance.raw_amount > 0 => return Some(balance),
            Ok(_) => {}
            Err(e) => {
                log::warn!("Balance probe failed while waiting for settlement: {}", e);
            }
        }

        if Instant::now() + delay > deadline {
            return None;
        }
        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(MAX_PROBE_DELAY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedOracle {
        responses: Mutex<VecDeque<Option<TokenBalance>>>,
    }

    impl ScriptedOracle {
        fn new(responses: Vec<Option<TokenBalance>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    impl BalanceOracle for ScriptedOracle {
        async fn sol_balance(&self, _owner: &Pubkey) -> Result<f64, PipelineError> {
            Ok(0.0)
        }

        async fn token_balance(
            &self,
            _owner: &Pubkey,
            _mint: &Pubkey,
        ) -> Result<Option<TokenBalance>, PipelineError> {
            Ok(self.responses.lock().unwrap().pop_front().flatten())
        }
    }

    fn holding(raw_amount: u64) -> TokenBalance {
        TokenBalance {
            amount: raw_amount as f64 / 1e6,
            raw_amount,
            decimals: 6,
            token_account: Pubkey::new_unique(),
            program_id: spl_token::id(),
        }
    }

    #[tokio::test]
    async fn returns_once_tokens_arrive() {
        let oracle = ScriptedOracle::new(vec![None, Some(holding(0)), Some(holding(1_500_000))]);
        let settled = await_token_settlement(
            &oracle,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(settled.unwrap().raw_amount, 1_500_000);
    }

    #[tokio::test]
    async fn zero_after_timeout_is_no_tokens() {
        let oracle = ScriptedOracle::new(vec![None; 20]);
        let settled = await_token_settlement(
            &oracle,
            &Pubkey::new_unique(),
            &Pubkey::new_unique(),
            Duration::from_millis(50),
        )
        .await;
        assert!(settled.is_none());
    }
}

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use solana_client::rpc_client::SerializableTransaction;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::PipelineError;

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Submit a signed transaction and wait for confirmed commitment.
///
/// Preflight is skipped; an on-chain failure is caught by the confirmation
/// wait instead, so a venue-built transaction that lands but errors is
/// reported as a failure rather than a silent success.
pub async fn submit_and_confirm(
    rpc: &RpcClient,
    tx: &impl SerializableTransaction,
    timeout: Duration,
) -> Result<Signature, PipelineError> {
    let signature = rpc
        .send_transaction_with_config(
            tx,
            RpcSendTransactionConfig {
                skip_preflight: true,
                max_retries: Some(3),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| PipelineError::Chain(format!("Transaction submit failed: {}", e)))?;

    await_confirmation(rpc, &signature, timeout).await?;
    Ok(signature)
}

/// Poll signature status until confirmed, failed, or the deadline passes.
///
/// Timeout errors carry the signature: the transaction may still land, and
/// the next balance read is what reconciles the wallet with reality.
pub async fn await_confirmation(
    rpc: &RpcClient,
    signature: &Signature,
    timeout: Duration,
) -> Result<(), PipelineError> {
    let deadline = Instant::now() + timeout;

    loop {
        match rpc.get_signature_statuses(&[*signature]).await {
            Ok(statuses) => {
                if let Some(Some(status)) = statuses.value.first() {
                    if let Some(err) = &status.err {
                        return Err(PipelineError::Chain(format!(
                            "Transaction {} failed on-chain: {:?}",
                            signature, err
                        )));
                    }
                    if status.satisfies_commitment(CommitmentConfig::confirmed()) {
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                log::warn!("Status query for {} failed: {}", signature, e);
            }
        }

        if Instant::now() >= deadline {
            return Err(PipelineError::Chain(format!(
                "Confirmation timed out for {}",
                signature
            )));
        }
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
    }
}

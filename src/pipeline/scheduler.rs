use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

use super::{Orchestrator, RunOutcome};
use crate::burn::TokenBurner;
use crate::chain::BalanceOracle;
use crate::config::AppConfig;
use crate::error::PipelineError;
use crate::ledger::Ledger;
use crate::swap::TokenSwapper;

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectCycleResult {
    Completed {
        token_mint: String,
        outcome: RunOutcome,
    },
    Failed {
        token_mint: String,
        error: String,
    },
    /// Not attempted because the cycle's time budget ran out first.
    NotAttempted {
        token_mint: String,
        reason: String,
    },
}

#[derive(Debug, Serialize)]
pub struct CycleSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub results: Vec<ProjectCycleResult>,
}

/// Runs every active project through the pipeline, one at a time.
///
/// Sequential on purpose: venues rate-limit aggressively and two runs must
/// never race on one custodial wallet. A pacing delay separates projects
/// and a whole-cycle budget keeps upstream slowness from accumulating
/// unbounded.
pub struct BatchScheduler {
    pacing: Duration,
    cycle_timeout: Duration,
}

impl BatchScheduler {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            pacing: Duration::from_millis(config.project_pacing_ms),
            cycle_timeout: Duration::from_secs(config.cycle_timeout_secs),
        }
    }

    pub fn with_timing(pacing: Duration, cycle_timeout: Duration) -> Self {
        Self {
            pacing,
            cycle_timeout,
        }
    }

    pub async fn run_cycle<L, O, S, B>(
        &self,
        orchestrator: &Orchestrator<L, O, S, B>,
    ) -> Result<CycleSummary, PipelineError>
    where
        L: Ledger + Send + Sync,
        O: BalanceOracle + Send + Sync,
        S: TokenSwapper + Send + Sync,
        B: TokenBurner + Send + Sync,
    {
        let projects = orchestrator.ledger().active_projects().await?;
        log::info!("Cycle starting: {} active projects", projects.len());

        let started = Instant::now();
        let mut results = Vec::with_capacity(projects.len());

        for (position, project) in projects.iter().enumerate() {
            if started.elapsed() >= self.cycle_timeout {
                log::warn!(
                    "Cycle time budget exhausted, {} projects not attempted",
                    projects.len() - position
                );
                for remaining in &projects[position..] {
                    results.push(ProjectCycleResult::NotAttempted {
                        token_mint: remaining.token_mint.clone(),
                        reason: "Cycle time budget exhausted".to_string(),
                    });
                }
                break;
            }

            match orchestrator.run(&project.token_mint).await {
                Ok(outcome) => results.push(ProjectCycleResult::Completed {
                    token_mint: project.token_mint.clone(),
                    outcome,
                }),
                Err(e) => {
                    log::error!("Error processing {}: {}", project.token_mint, e);
                    results.push(ProjectCycleResult::Failed {
                        token_mint: project.token_mint.clone(),
                        error: e.to_string(),
                    });
                }
            }

            tokio::time::sleep(self.pacing).await;
        }

        let summary = summarize(results);
        log::info!(
            "Cycle complete: {} succeeded, {} skipped, {} failed of {}",
            summary.succeeded,
            summary.skipped,
            summary.failed,
            summary.total
        );
        Ok(summary)
    }
}

fn summarize(results: Vec<ProjectCycleResult>) -> CycleSummary {
    let mut succeeded = 0;
    let mut skipped = 0;
    let mut failed = 0;

    for result in &results {
        match result {
            ProjectCycleResult::Failed { .. } => failed += 1,
            ProjectCycleResult::NotAttempted { .. } => skipped += 1,
            ProjectCycleResult::Completed { outcome, .. } => {
                if outcome.is_skipped() {
                    skipped += 1;
                } else {
                    match &outcome.project_leg {
                        Some(leg) if leg.is_completed() => succeeded += 1,
                        Some(leg) if leg.is_skipped() => skipped += 1,
                        // Swap/burn trouble on the project leg: surfaced as
                        // a failure even though the run itself returned.
                        _ => failed += 1,
                    }
                }
            }
        }
    }

    CycleSummary {
        total: results.len(),
        succeeded,
        skipped,
        failed,
        results,
    }
}

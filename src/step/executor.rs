//! Interprets one [`Step`] at a time against the shared test context and
//! component registry, racing a timeout around every action (§4.6).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{instrument, warn};

use crate::component::Component;

use super::types::{Step, StepAction, StepOutcome, StepResult, TestContext};

/// §4.6: absent an explicit per-step override, every step gets 30s before
/// the engine calls it a timeout failure.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

const WAIT_UNTIL_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub struct StepExecutor;

impl StepExecutor {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, step, context, components), fields(step = %step.name, phase = %step.phase))]
    pub async fn execute(
        &self,
        step: &Step,
        context: &TestContext,
        components: &DashMap<String, Arc<dyn Component>>,
    ) -> StepResult {
        let timeout = step.timeout.unwrap_or(DEFAULT_STEP_TIMEOUT);
        let started = Instant::now();

        let outcome = match tokio::time::timeout(timeout, self.run_action(step, context, components)).await
        {
            Ok(Ok(())) => StepOutcome::Passed,
            Ok(Err(message)) => StepOutcome::Failed(message),
            Err(_) => {
                warn!(step = %step.name, timeout_ms = timeout.as_millis(), "step timed out");
                StepOutcome::TimedOut
            }
        };

        StepResult {
            step_id: step.id,
            name: step.name.clone(),
            phase: step.phase,
            outcome,
            duration: started.elapsed(),
        }
    }

    async fn run_action(
        &self,
        step: &Step,
        context: &TestContext,
        components: &DashMap<String, Arc<dyn Component>>,
    ) -> Result<(), String> {
        match &step.action {
            StepAction::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            StepAction::WaitUntil(predicate) => {
                loop {
                    if predicate(context) {
                        return Ok(());
                    }
                    tokio::time::sleep(WAIT_UNTIL_POLL_INTERVAL).await;
                }
            }
            StepAction::RegisterHook { component, hook } => {
                let target = components
                    .get(component)
                    .ok_or_else(|| format!("no such component '{component}'"))?;
                target.register_hook(hook.clone());
                Ok(())
            }
            StepAction::Custom(action) => action(context.clone()).await.map_err(|e| e.to_string()),
        }
    }
}

impl Default for StepExecutor {
    fn default() -> Self {
        Self::new()
    }
}

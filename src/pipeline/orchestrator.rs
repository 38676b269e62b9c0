//! Runs a step list against a base dataset.
//!
//! Each invocation prepares a private working copy, dispatches the steps in
//! order, and profiles whatever dataset it ends with. Nothing is kept between
//! invocations.

use super::diagnostics::{Diagnostics, analyze};
use super::dispatcher::{Dispatcher, StepOutcome};
use super::preprocess::Preprocessor;
use super::spec::{Receipt, Step};
use crate::config::{EngineConfig, HaltPolicy};
use crate::error::PipelineError;
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Preprocessing,
    /// Dispatching the step at this index
    Applying(usize),
    Diagnosing,
    Done,
    /// Halted by the step at this index
    Failed(usize),
}

impl PipelineState {
    pub fn can_advance_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Preprocessing)
            | (Self::Preprocessing, Self::Applying(0) | Self::Diagnosing)
            | (Self::Applying(_), Self::Diagnosing)
            | (Self::Diagnosing, Self::Done) => true,
            (Self::Applying(i), Self::Applying(j)) => j == i + 1,
            (Self::Applying(i), Self::Failed(j)) => i == j,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Preprocessing => f.write_str("preprocessing"),
            Self::Applying(i) => write!(f, "applying step {i}"),
            Self::Diagnosing => f.write_str("diagnosing"),
            Self::Done => f.write_str("done"),
            Self::Failed(i) => write!(f, "failed at step {i}"),
        }
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    debug_assert!(
        state.can_advance_to(next),
        "illegal pipeline transition: {state} -> {next}"
    );
    debug!(from = %state, to = %next, "Pipeline state change");
    *state = next;
}

/// Everything one pipeline invocation produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Final working dataset; on a halt, the dataset before the failed step
    pub dataset: DataFrame,
    pub receipts: Vec<Receipt>,
    pub diagnostics: Diagnostics,
    /// `Done` or `Failed(step)`
    pub state: PipelineState,
    pub duration: Duration,
}

impl PipelineOutcome {
    pub fn halted(&self) -> bool {
        matches!(self.state, PipelineState::Failed(_))
    }

    /// Receipt of the step that halted the run, if any.
    pub fn failed_step(&self) -> Option<&Receipt> {
        match self.state {
            PipelineState::Failed(index) => self.receipts.iter().find(|r| r.step_index == index),
            _ => None,
        }
    }

    pub fn applied_steps(&self) -> usize {
        self.receipts.iter().filter(|r| r.success).count()
    }

    /// One-line human summary of the run.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} of {} step(s) applied; {} rows x {} columns in {} ms",
            self.applied_steps(),
            self.receipts.len(),
            self.dataset.height(),
            self.dataset.width(),
            self.duration.as_millis()
        );
        if let Some(failed) = self.failed_step() {
            line.push_str(&format!(
                "; halted at step {} ({})",
                failed.step_index, failed.action
            ));
        }
        line
    }
}

pub struct Orchestrator {
    config: EngineConfig,
    preprocessor: Preprocessor,
    dispatcher: Dispatcher,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            preprocessor: Preprocessor::from_config(&config),
            dispatcher: Dispatcher::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `steps` against a private copy of `base`.
    ///
    /// Step failures are recorded in the receipts and never surface as an
    /// `Err`; only an unusable base dataset does.
    pub fn execute(&self, base: &DataFrame, steps: &[Step]) -> Result<PipelineOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();
        let span = info_span!("pipeline", %run_id);
        let _enter = span.enter();

        self.validate(base)?;
        info!(
            rows = base.height(),
            columns = base.width(),
            steps = steps.len(),
            policy = ?self.config.halt_policy,
            "Running pipeline"
        );

        let mut state = PipelineState::Idle;
        advance(&mut state, PipelineState::Preprocessing);
        let mut working = self
            .preprocessor
            .prepare(base)
            .map_err(|e| PipelineError::Preprocess(e.to_string()))?;

        let mut receipts = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            advance(&mut state, PipelineState::Applying(index));

            match self.dispatcher.apply(&working, step, index) {
                StepOutcome::Applied { dataset, receipt } => {
                    working = dataset;
                    receipts.push(receipt);
                }
                StepOutcome::Rejected { receipt, error } => {
                    receipts.push(receipt);
                    if error.is_fatal() || self.config.halt_policy == HaltPolicy::Strict {
                        warn!(step = index, "Pipeline halted: {error}");
                        advance(&mut state, PipelineState::Failed(index));
                        break;
                    }
                    debug!(step = index, "Skipping failed step");
                }
            }
        }

        let halted = matches!(state, PipelineState::Failed(_));
        if !halted {
            advance(&mut state, PipelineState::Diagnosing);
        }
        let diagnostics = analyze(&working);
        if !halted {
            advance(&mut state, PipelineState::Done);
        }

        let outcome = PipelineOutcome {
            run_id,
            started_at,
            dataset: working,
            receipts,
            diagnostics,
            state,
            duration: clock.elapsed(),
        };
        info!("Pipeline finished: {}", outcome.summary());
        Ok(outcome)
    }

    fn validate(&self, base: &DataFrame) -> Result<(), PipelineError> {
        if base.width() == 0 {
            return Err(PipelineError::MalformedDataset(
                "dataset has no columns".to_owned(),
            ));
        }

        let mut seen = HashSet::new();
        for (position, name) in base.get_column_names().into_iter().enumerate() {
            if name.trim().is_empty() {
                return Err(PipelineError::MalformedDataset(format!(
                    "column {position} has an empty name"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::MalformedDataset(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }

        if base.height() > self.config.max_rows {
            return Err(PipelineError::RowLimitExceeded {
                rows: base.height(),
                limit: self.config.max_rows,
            });
        }
        Ok(())
    }
}

/// Run `steps` with the default configuration.
pub fn execute_pipeline(base: &DataFrame, steps: &[Step]) -> Result<PipelineOutcome, PipelineError> {
    Orchestrator::default().execute(base, steps)
}

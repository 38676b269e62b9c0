//! Applies one declarative step to a dataset.

use super::actions::Transformed;
use super::registry::ActionRegistry;
use super::spec::{Receipt, Step};
use crate::error::StepError;
use polars::prelude::DataFrame;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of dispatching a single step.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Applied { dataset: DataFrame, receipt: Receipt },
    Rejected { receipt: Receipt, error: StepError },
}

impl StepOutcome {
    pub fn receipt(&self) -> &Receipt {
        match self {
            Self::Applied { receipt, .. } | Self::Rejected { receipt, .. } => receipt,
        }
    }
}

/// Resolves step actions through the registry and runs their transforms.
#[derive(Clone, Copy)]
pub struct Dispatcher {
    registry: &'static ActionRegistry,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(ActionRegistry::global())
    }
}

impl Dispatcher {
    pub fn new(registry: &'static ActionRegistry) -> Self {
        Self { registry }
    }

    /// Apply `step` (at position `index` in its pipeline) to `dataset`.
    ///
    /// The input frame is never modified. Failures are returned as
    /// [`StepOutcome::Rejected`] with a receipt describing them; deciding
    /// whether to halt is left to the caller.
    pub fn apply(&self, dataset: &DataFrame, step: &Step, index: usize) -> StepOutcome {
        let started = Instant::now();
        let rows_before = dataset.height();
        let columns_before = dataset.width();

        let result = self
            .registry
            .resolve(&step.action)
            .and_then(|(_, transform)| transform(dataset, &step.params));
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Transformed {
                dataset: output,
                message,
            }) => {
                debug!(
                    step = index,
                    action = %step.action,
                    rows_before,
                    rows_after = output.height(),
                    duration_ms,
                    "Step applied: {message}"
                );
                let receipt = Receipt {
                    step_index: index,
                    action: step.action.clone(),
                    success: true,
                    message,
                    rows_before,
                    rows_after: output.height(),
                    columns_before,
                    columns_after: output.width(),
                    error_kind: None,
                    duration_ms,
                };
                StepOutcome::Applied {
                    dataset: output,
                    receipt,
                }
            }
            Err(error) => {
                warn!(step = index, action = %step.action, kind = error.kind(), "Step failed: {error}");
                let receipt = Receipt {
                    step_index: index,
                    action: step.action.clone(),
                    success: false,
                    message: format!("{} ({})", error, error.kind()),
                    rows_before,
                    rows_after: rows_before,
                    columns_before,
                    columns_after: columns_before,
                    error_kind: Some(error.kind().to_owned()),
                    duration_ms,
                };
                StepOutcome::Rejected { receipt, error }
            }
        }
    }
}

//! Declarative cleaning pipelines.
//!
//! A pipeline is a JSON list of `{action, params}` steps. Each action is looked
//! up in a closed registry; nothing in the payload is ever evaluated as code.
//!
//! # Overview
//!
//! One invocation runs through these stages:
//! - **Preprocessing**: string columns are trimmed and null-like tokens
//!   (`"n/a"`, `"nan"`, empty strings, ...) become real nulls
//! - **Dispatch**: every step is resolved through [`ActionRegistry`] and its
//!   transform produces a new dataset plus a [`Receipt`]
//! - **Diagnostics**: the final dataset is profiled (nulls, inferred types,
//!   duplicates, a health score)
//!
//! Actions are grouped by prefix:
//! - **general_**: duplicates, column drop/rename/normalisation, null rows,
//!   calculated columns
//! - **numeric_**: imputation, outlier clipping, scaling, rounding
//! - **text_**: case, regex replacement, number extraction
//! - **type_**: date, numeric and text conversion
//!
//! # Example
//!
//! ```
//! use cleanroom::pipeline::{Step, execute_pipeline};
//! use polars::prelude::*;
//!
//! let df = df!("a" => [Some(1.0), None, Some(3.0)])?;
//! let steps = vec![
//!     Step::new("numeric_impute_by_method").with_param("method", "mean"),
//! ];
//!
//! let outcome = execute_pipeline(&df, &steps)?;
//! assert!(!outcome.halted());
//! assert_eq!(outcome.dataset.column("a")?.null_count(), 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A step that fails is recorded in its receipt. Under the default
//! [`HaltPolicy::Strict`](crate::config::HaltPolicy) the run stops there; the
//! lenient policy skips it and carries on. An unknown action always stops the
//! run.

pub mod actions;
pub mod diagnostics;
pub mod dispatcher;
pub mod orchestrator;
pub mod params;
pub mod preprocess;
pub mod preview;
pub mod registry;
pub mod spec;

pub use actions::{TransformFn, Transformed};
pub use diagnostics::{ColumnDiagnostics, Diagnostics, HealthReport, InferredType, analyze};
pub use dispatcher::{Dispatcher, StepOutcome};
pub use orchestrator::{
    Orchestrator, PipelineOutcome, PipelineState, execute_pipeline,
};
pub use params::Params;
pub use preprocess::Preprocessor;
pub use preview::PipelinePreview;
pub use registry::{ActionCategory, ActionId, ActionInfo, ActionRegistry};
pub use spec::{PipelineSpec, Receipt, SPEC_VERSION, Step};

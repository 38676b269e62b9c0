//! # Cleanroom - sandboxed data-cleaning pipelines
//!
//! Cleanroom applies a client-supplied list of cleaning steps to a tabular
//! dataset and reports what happened. Steps are plain data (`{action,
//! params}`) resolved through a closed whitelist of actions, so a payload can
//! never run anything the crate does not already ship.
//!
//! ## Quick Start
//!
//! ```
//! use cleanroom::pipeline::{PipelinePreview, PipelineSpec, execute_pipeline};
//! use polars::prelude::*;
//!
//! let df = df!(
//!     "name" => ["  Ada ", "Ada", "n/a"],
//!     "age" => [Some(36), Some(36), None]
//! )?;
//! let spec = PipelineSpec::from_json(r#"[
//!     {"action": "general_drop_duplicates"},
//!     {"action": "numeric_impute_by_method", "params": {"method": "median"}}
//! ]"#)?;
//!
//! let outcome = execute_pipeline(&df, &spec.steps)?;
//! assert_eq!(outcome.dataset.height(), 2);
//!
//! let preview = PipelinePreview::build(&outcome, 100);
//! println!("{}", preview.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`pipeline`]: action registry, preprocessing, dispatch, diagnostics and
//!   orchestration
//! - [`tools`]: AI tool catalogue with lazily loaded local models
//! - [`config`]: engine configuration (halt policy, limits, null tokens)
//! - [`error`]: error types and handling utilities
//! - [`logging`]: console and rolling-file `tracing` setup

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod tools;

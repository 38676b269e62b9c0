//! Error types for the cleaning engine and its outer surfaces.
//!
//! Three layers of failure exist:
//!
//! - [`StepError`]: a single pipeline step could not be applied. These are
//!   reported through the step's receipt and, depending on the halt policy,
//!   may or may not stop the pipeline.
//! - [`PipelineError`]: the pipeline as a whole could not run (malformed base
//!   dataset, row limit, preprocessing failure).
//! - [`CleanroomError`]: crate-level error for configuration, I/O and the CLI.
//!
//! ```
//! use cleanroom::error::StepError;
//!
//! let err = StepError::UnknownAction("drop_everything".to_owned());
//! assert!(err.is_fatal());
//! assert_eq!(err.kind(), "unknown_action");
//! ```

use std::fmt;

/// Failure of a single dispatched step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The step names an action that is not in the registry
    UnknownAction(String),

    /// The transform rejected its parameters
    InvalidParams { action: String, message: String },

    /// The transform failed while computing its result
    TransformRuntime { action: String, message: String },
}

impl StepError {
    pub fn invalid_params(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            action: action.into(),
            message: message.into(),
        }
    }

    pub fn runtime(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransformRuntime {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Unknown actions halt the pipeline regardless of the halt policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnknownAction(_))
    }

    /// Stable machine-readable tag, recorded on failed receipts.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAction(_) => "unknown_action",
            Self::InvalidParams { .. } => "invalid_params",
            Self::TransformRuntime { .. } => "transform_runtime_error",
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction(action) => write!(f, "Unknown cleaning action: {action}"),
            Self::InvalidParams { action, message } => {
                write!(f, "Invalid parameters for '{action}': {message}")
            }
            Self::TransformRuntime { action, message } => {
                write!(f, "Action '{action}' failed while running: {message}")
            }
        }
    }
}

impl std::error::Error for StepError {}

/// Unrecoverable failure of a whole pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The base dataset is structurally unusable
    MalformedDataset(String),

    /// The base dataset is larger than the configured limit
    RowLimitExceeded { rows: usize, limit: usize },

    /// Null/text normalisation failed before any step ran
    Preprocess(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedDataset(msg) => write!(f, "Malformed dataset: {msg}"),
            Self::RowLimitExceeded { rows, limit } => {
                write!(f, "Dataset has {rows} rows, limit is {limit}")
            }
            Self::Preprocess(msg) => write!(f, "Preprocessing failed: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

/// Main error type for cleanroom operations outside the engine core.
#[derive(Debug)]
pub enum CleanroomError {
    /// I/O errors (config files, CLI input and output)
    Io(std::io::Error),

    /// Data processing errors raised by polars
    DataProcessing(String),

    /// Pipeline could not run
    Pipeline(PipelineError),

    /// Configuration or payload (JSON) errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for CleanroomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Pipeline(e) => write!(f, "Pipeline error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CleanroomError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CleanroomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for CleanroomError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for CleanroomError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for CleanroomError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<PipelineError> for CleanroomError {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

/// Result type alias for cleanroom operations.
pub type Result<T> = std::result::Result<T, CleanroomError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<CleanroomError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: CleanroomError = e.into();
            CleanroomError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: CleanroomError = e.into();
            CleanroomError::Other(format!("{}: {}", f(), err))
        })
    }
}

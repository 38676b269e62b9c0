//! Transform implementations behind the action registry.
//!
//! Every transform is a plain function from `(&DataFrame, &Params)` to a new
//! `DataFrame` plus a human-readable message. Transforms never touch their
//! input: they clone the frame (column buffers are reference counted, so this
//! is cheap) and build the result through lazy expressions.

pub mod general;
pub mod numeric;
pub mod text;
pub mod types;

use super::params::Params;
use crate::error::StepError;
use polars::prelude::*;

/// Result of a successful transform.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub dataset: DataFrame,
    pub message: String,
}

impl Transformed {
    pub fn new(dataset: DataFrame, message: impl Into<String>) -> Self {
        Self {
            dataset,
            message: message.into(),
        }
    }
}

/// Signature shared by every registered transform.
pub type TransformFn = fn(&DataFrame, &Params) -> Result<Transformed, StepError>;

/// Map a polars failure to a runtime error for `action`.
pub(crate) fn runtime(action: &'static str) -> impl Fn(PolarsError) -> StepError {
    move |e| StepError::runtime(action, e.to_string())
}

/// Replace (or append) columns computed by `exprs`, keeping column order.
pub(crate) fn with_columns(df: &DataFrame, exprs: Vec<Expr>) -> PolarsResult<DataFrame> {
    df.clone().lazy().with_columns(exprs).collect()
}

pub(crate) fn select(df: &DataFrame, exprs: Vec<Expr>) -> PolarsResult<DataFrame> {
    df.clone().lazy().select(exprs).collect()
}

/// Reject any target column whose dtype fails `accepts`.
pub(crate) fn require_dtype(
    action: &'static str,
    df: &DataFrame,
    columns: &[String],
    expected: &str,
    accepts: impl Fn(&DataType) -> bool,
) -> Result<(), StepError> {
    for name in columns {
        let column = df
            .column(name)
            .map_err(|_| StepError::invalid_params(action, format!("unknown column: {name}")))?;
        if !accepts(column.dtype()) {
            return Err(StepError::invalid_params(
                action,
                format!("column '{name}' is {}, expected {expected}", column.dtype()),
            ));
        }
    }
    Ok(())
}

/// Nulls added to `columns` between two versions of a frame.
pub(crate) fn new_nulls(before: &DataFrame, after: &DataFrame, columns: &[String]) -> usize {
    columns
        .iter()
        .map(|name| {
            let old = before.column(name).map(Column::null_count).unwrap_or(0);
            let new = after.column(name).map(Column::null_count).unwrap_or(0);
            new.saturating_sub(old)
        })
        .sum()
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests;

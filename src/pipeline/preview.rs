//! Client-facing view of a pipeline run.

use super::diagnostics::Diagnostics;
use super::orchestrator::{PipelineOutcome, PipelineState};
use super::spec::Receipt;
use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Days between 0001-01-01 and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// First rows of the final dataset plus the run's audit data.
#[derive(Debug, Clone, Serialize)]
pub struct PipelinePreview {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub preview: Vec<Map<String, Value>>,
    pub total_rows: usize,
    pub diagnostics: Diagnostics,
    pub receipts: Vec<Receipt>,
    pub halted: bool,
    pub state: PipelineState,
}

impl PipelinePreview {
    /// Window the outcome's dataset to its first `limit` rows.
    pub fn build(outcome: &PipelineOutcome, limit: usize) -> Self {
        Self {
            run_id: outcome.run_id,
            started_at: outcome.started_at,
            preview: rows_to_json(&outcome.dataset, limit),
            total_rows: outcome.dataset.height(),
            diagnostics: outcome.diagnostics.clone(),
            receipts: outcome.receipts.clone(),
            halted: outcome.halted(),
            state: outcome.state,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Convert the first `limit` rows of `df` into JSON records.
pub fn rows_to_json(df: &DataFrame, limit: usize) -> Vec<Map<String, Value>> {
    let head = df.head(Some(limit));
    let columns = head.get_columns();

    (0..head.height())
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    let value = column.get(row).map_or(Value::Null, |v| any_to_json(&v));
                    (column.name().to_string(), value)
                })
                .collect()
        })
        .collect()
}

fn any_to_json(value: &AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),
        AnyValue::String(s) => Value::String((*s).to_owned()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Int8(v) => Value::from(*v),
        AnyValue::Int16(v) => Value::from(*v),
        AnyValue::Int32(v) => Value::from(*v),
        AnyValue::Int64(v) => Value::from(*v),
        AnyValue::UInt8(v) => Value::from(*v),
        AnyValue::UInt16(v) => Value::from(*v),
        AnyValue::UInt32(v) => Value::from(*v),
        AnyValue::UInt64(v) => Value::from(*v),
        AnyValue::Float32(v) => float_to_json(f64::from(*v)),
        AnyValue::Float64(v) => float_to_json(*v),
        AnyValue::Date(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map_or(Value::Null, |d| Value::String(d.format("%Y-%m-%d").to_string())),
        AnyValue::Datetime(v, unit, _) | AnyValue::DatetimeOwned(v, unit, _) => {
            datetime_to_json(*v, *unit)
        }
        other => Value::String(other.to_string()),
    }
}

/// Naive ISO 8601 text in UTC, e.g. `2024-01-31T08:30:00`.
fn datetime_to_json(v: i64, unit: TimeUnit) -> Value {
    let parsed = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
    };
    parsed.map_or(Value::Null, |dt| {
        Value::String(dt.naive_utc().format("%Y-%m-%dT%H:%M:%S%.f").to_string())
    })
}

/// NaN and infinities have no JSON form and become null.
fn float_to_json(v: f64) -> Value {
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

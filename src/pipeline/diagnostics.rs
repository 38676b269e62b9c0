//! Read-only dataset diagnostics.
//!
//! [`analyze`] never fails: any polars error while profiling a column only
//! degrades that column's figures (`unknown` type, zero distinct values).

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Date layouts recognised when voting on text values.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Below this share of agreeing values a column is reported as mixed.
const MIXED_TYPE_THRESHOLD: f64 = 0.9;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Numeric,
    Boolean,
    Date,
    Text,
    Unknown,
}

impl InferredType {
    /// Vote candidates; on equal counts the earlier entry wins.
    const VOTE_ORDER: [Self; 4] = [Self::Numeric, Self::Boolean, Self::Date, Self::Text];
}

impl fmt::Display for InferredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Text => "text",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDiagnostics {
    pub name: String,
    /// Physical polars dtype, e.g. `str` or `f64`
    pub dtype: String,
    pub null_count: usize,
    pub null_ratio: f64,
    pub inferred_type: InferredType,
    /// Share of non-null values agreeing with `inferred_type`
    pub type_agreement: f64,
    pub distinct_estimate: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// 0.0 (unusable) to 1.0 (no issues found)
    pub score: f32,
    pub risks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnDiagnostics>,
    pub duplicate_row_estimate: usize,
    pub type_distribution: BTreeMap<InferredType, usize>,
    pub health: HealthReport,
}

impl Diagnostics {
    pub fn column(&self, name: &str) -> Option<&ColumnDiagnostics> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Profile every column of `df`.
pub fn analyze(df: &DataFrame) -> Diagnostics {
    let row_count = df.height();

    let columns: Vec<ColumnDiagnostics> = df
        .get_columns()
        .iter()
        .map(|column| profile_column(column, row_count))
        .collect();

    let duplicate_row_estimate = if df.width() == 0 {
        0
    } else {
        df.unique_stable(None, UniqueKeepStrategy::First, None)
            .map(|unique| row_count.saturating_sub(unique.height()))
            .unwrap_or_else(|e| {
                tracing::debug!("Duplicate estimate unavailable: {e}");
                0
            })
    };

    let mut type_distribution = BTreeMap::new();
    for column in &columns {
        *type_distribution.entry(column.inferred_type).or_insert(0) += 1;
    }

    let health = assess_health(&columns, row_count, duplicate_row_estimate);

    Diagnostics {
        row_count,
        column_count: df.width(),
        columns,
        duplicate_row_estimate,
        type_distribution,
        health,
    }
}

fn profile_column(column: &Column, row_count: usize) -> ColumnDiagnostics {
    let null_count = column.null_count();
    let null_ratio = if row_count > 0 {
        null_count as f64 / row_count as f64
    } else {
        0.0
    };
    let (inferred_type, type_agreement) = infer_type(column);
    let distinct_estimate = column
        .as_materialized_series()
        .n_unique()
        .unwrap_or_else(|e| {
            tracing::debug!("Distinct count unavailable for '{}': {e}", column.name());
            0
        });

    ColumnDiagnostics {
        name: column.name().to_string(),
        dtype: column.dtype().to_string(),
        null_count,
        null_ratio,
        inferred_type,
        type_agreement,
        distinct_estimate,
    }
}

fn infer_type(column: &Column) -> (InferredType, f64) {
    if column.null_count() == column.len() {
        return (InferredType::Unknown, 0.0);
    }

    let dtype = column.dtype();
    if dtype.is_bool() {
        (InferredType::Boolean, 1.0)
    } else if dtype.is_primitive_numeric() {
        (InferredType::Numeric, 1.0)
    } else if dtype.is_temporal() {
        (InferredType::Date, 1.0)
    } else if dtype == &DataType::String {
        match column.str() {
            Ok(ca) => vote(ca.into_iter().flatten()),
            Err(_) => (InferredType::Unknown, 0.0),
        }
    } else {
        (InferredType::Text, 1.0)
    }
}

/// Majority vote over the classification of each value. Ties go to the
/// earlier type in `VOTE_ORDER`.
fn vote<'a>(values: impl Iterator<Item = &'a str>) -> (InferredType, f64) {
    let mut counts: BTreeMap<InferredType, usize> = BTreeMap::new();
    for kind in values.map(classify) {
        if kind != InferredType::Unknown {
            *counts.entry(kind).or_default() += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return (InferredType::Unknown, 0.0);
    }

    let (best, top) = InferredType::VOTE_ORDER
        .iter()
        .fold((InferredType::Unknown, 0), |(best, top), kind| {
            let count = counts.get(kind).copied().unwrap_or(0);
            if count > top { (*kind, count) } else { (best, top) }
        });
    (best, top as f64 / total as f64)
}

/// Classify one raw text value.
pub fn classify(value: &str) -> InferredType {
    let value = value.trim();
    if value.is_empty() {
        return InferredType::Unknown;
    }
    if value.parse::<f64>().is_ok_and(f64::is_finite) {
        return InferredType::Numeric;
    }
    if matches!(
        value.to_lowercase().as_str(),
        "true" | "false" | "yes" | "no"
    ) {
        return InferredType::Boolean;
    }
    let is_date = DATE_FORMATS
        .iter()
        .any(|f| NaiveDate::parse_from_str(value, f).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|f| NaiveDateTime::parse_from_str(value, f).is_ok());
    if is_date {
        InferredType::Date
    } else {
        InferredType::Text
    }
}

fn assess_health(
    columns: &[ColumnDiagnostics],
    row_count: usize,
    duplicates: usize,
) -> HealthReport {
    let mut risks = Vec::new();
    let mut score: f64 = 100.0;

    for col in columns {
        if row_count > 0 && col.inferred_type == InferredType::Unknown {
            risks.push(format!("Column '{}' has no usable values.", col.name));
            score -= 10.0;
            continue;
        }

        let null_pct = col.null_ratio * 100.0;
        if null_pct > 15.0 {
            risks.push(format!(
                "Column '{}' has significant missing data ({:.1}%).",
                col.name, null_pct
            ));
            score -= 10.0;
        } else if null_pct > 5.0 {
            score -= 5.0;
        }

        if col.type_agreement < MIXED_TYPE_THRESHOLD && col.inferred_type != InferredType::Text {
            risks.push(format!(
                "Column '{}' mixes value types; only {:.0}% look {}.",
                col.name,
                col.type_agreement * 100.0,
                col.inferred_type
            ));
            score -= 5.0;
        }
    }

    if duplicates > 0 {
        risks.push(format!("{duplicates} duplicate row(s) found."));
        score -= 5.0;
    }

    HealthReport {
        score: (score.max(0.0) / 100.0) as f32,
        risks,
    }
}

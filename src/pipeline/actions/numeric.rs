use super::{Transformed, plural, require_dtype, runtime, with_columns};
use crate::error::StepError;
use crate::pipeline::params::{ParamReader, Params};
use polars::prelude::*;
use serde::Deserialize;

const IMPUTE: &str = "numeric_impute_by_method";
const CLIP: &str = "numeric_clip_outliers";
const NORMALIZE: &str = "numeric_normalize";
const ROUND: &str = "numeric_round";

const DEFAULT_LOWER_QUANTILE: f64 = 0.05;
const DEFAULT_UPPER_QUANTILE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeMethod {
    Mean,
    Median,
    Mode,
    Zero,
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMethod {
    MinMax,
    ZScore,
}

fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric()
}

/// Explicit target columns, or every numeric column when none are named.
fn numeric_targets(
    action: &'static str,
    reader: &ParamReader<'_>,
    df: &DataFrame,
) -> Result<Vec<String>, StepError> {
    match reader.opt_columns(df)? {
        Some(columns) => {
            require_dtype(action, df, &columns, "a numeric column", is_numeric)?;
            Ok(columns)
        }
        None => Ok(df
            .get_columns()
            .iter()
            .filter(|c| is_numeric(c.dtype()))
            .map(|c| c.name().to_string())
            .collect()),
    }
}

fn null_total(df: &DataFrame, columns: &[String]) -> usize {
    columns
        .iter()
        .filter_map(|name| df.column(name).ok())
        .map(Column::null_count)
        .sum()
}

/// Fill nulls in numeric columns.
///
/// `mean` and `median` produce `Float64` columns; `mode`, `zero` and
/// `constant` keep the column type where the fill value allows it. When
/// several values tie for `mode`, the smallest one is used.
pub fn impute_by_method(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(IMPUTE, params);
    let method: ImputeMethod = reader.parse("method")?;
    let constant = match method {
        ImputeMethod::Constant => Some(reader.f64("value")?),
        _ => None,
    };
    let columns = numeric_targets(IMPUTE, &reader, df)?;

    if columns.is_empty() {
        return Ok(Transformed::new(df.clone(), "No numeric columns to impute"));
    }

    let exprs = columns
        .iter()
        .map(|name| {
            let expr = col(name.as_str());
            let filled = match method {
                ImputeMethod::Mean => {
                    let expr = expr.cast(DataType::Float64);
                    expr.clone().fill_null(expr.mean())
                }
                ImputeMethod::Median => {
                    let expr = expr.cast(DataType::Float64);
                    expr.clone().fill_null(expr.median())
                }
                ImputeMethod::Mode => expr.clone().fill_null(expr.mode().min()),
                ImputeMethod::Zero => expr.fill_null(lit(0)),
                ImputeMethod::Constant => expr.fill_null(lit(constant.unwrap_or_default())),
            };
            filled.alias(name.as_str())
        })
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(IMPUTE))?;
    let filled = null_total(df, &columns).saturating_sub(null_total(&result, &columns));

    Ok(Transformed::new(
        result,
        format!(
            "Filled {} in {}",
            plural(filled, "missing value"),
            plural(columns.len(), "column")
        ),
    ))
}

/// Clamp each column to its `[lower_quantile, upper_quantile]` range.
///
/// Bounds are computed once from the current values with linear
/// interpolation. A column with no values is left untouched.
pub fn clip_outliers(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(CLIP, params);
    let columns = reader.columns(df)?;
    require_dtype(CLIP, df, &columns, "a numeric column", is_numeric)?;

    let lower_q = reader
        .opt_f64("lower_quantile")?
        .unwrap_or(DEFAULT_LOWER_QUANTILE);
    let upper_q = reader
        .opt_f64("upper_quantile")?
        .unwrap_or(DEFAULT_UPPER_QUANTILE);
    if !(0.0..=1.0).contains(&lower_q) || !(0.0..=1.0).contains(&upper_q) {
        return Err(reader.invalid("quantiles must be between 0 and 1"));
    }
    if lower_q >= upper_q {
        return Err(reader.invalid("lower_quantile must be less than upper_quantile"));
    }

    let mut exprs = Vec::with_capacity(columns.len());
    let mut clipped = 0;
    for name in &columns {
        let values = df
            .column(name)
            .and_then(|c| c.as_materialized_series().cast(&DataType::Float64))
            .map_err(runtime(CLIP))?;
        let ca = values.f64().map_err(runtime(CLIP))?;

        let lower = ca
            .quantile(lower_q, QuantileMethod::Linear)
            .map_err(runtime(CLIP))?;
        let upper = ca
            .quantile(upper_q, QuantileMethod::Linear)
            .map_err(runtime(CLIP))?;
        let (Some(lower), Some(upper)) = (lower, upper) else {
            continue;
        };

        clipped += ca
            .into_iter()
            .flatten()
            .filter(|v| *v < lower || *v > upper)
            .count();

        let expr = col(name.as_str()).cast(DataType::Float64);
        exprs.push(
            when(expr.clone().lt(lit(lower)))
                .then(lit(lower))
                .when(expr.clone().gt(lit(upper)))
                .then(lit(upper))
                .otherwise(expr)
                .alias(name.as_str()),
        );
    }

    let result = with_columns(df, exprs).map_err(runtime(CLIP))?;
    Ok(Transformed::new(
        result,
        format!(
            "Clipped {} to the {lower_q}-{upper_q} quantile range",
            plural(clipped, "value")
        ),
    ))
}

/// Rescale columns to `[0, 1]` (`min_max`) or zero mean and unit variance
/// (`z_score`). Constant columns become `0.0`.
pub fn normalize(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(NORMALIZE, params);
    let method: NormalizeMethod = reader.parse("method")?;
    let columns = reader.columns(df)?;
    require_dtype(NORMALIZE, df, &columns, "a numeric column", is_numeric)?;

    let exprs = columns
        .iter()
        .map(|name| {
            let expr = col(name.as_str()).cast(DataType::Float64);
            let (offset, scale) = match method {
                NormalizeMethod::MinMax => {
                    let min = expr.clone().min();
                    (min.clone(), expr.clone().max() - min)
                }
                NormalizeMethod::ZScore => (expr.clone().mean(), expr.clone().std(1)),
            };
            let flat = scale.clone().eq(lit(0.0)).or(scale.clone().is_null());

            when(expr.clone().is_null())
                .then(lit(NULL).cast(DataType::Float64))
                .when(flat)
                .then(lit(0.0))
                .otherwise((expr - offset) / scale)
                .alias(name.as_str())
        })
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(NORMALIZE))?;
    let label = match method {
        NormalizeMethod::MinMax => "min-max",
        NormalizeMethod::ZScore => "z-score",
    };
    Ok(Transformed::new(
        result,
        format!("Applied {label} scaling to {}", plural(columns.len(), "column")),
    ))
}

/// Round float columns to `decimals` places. Integer columns are unchanged.
pub fn round(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(ROUND, params);
    let columns = reader.columns(df)?;
    let decimals = reader
        .opt_u32("decimals")?
        .ok_or_else(|| reader.invalid("missing 'decimals'"))?;
    require_dtype(ROUND, df, &columns, "a numeric column", is_numeric)?;

    let exprs = columns
        .iter()
        .filter(|name| {
            df.column(name.as_str())
                .is_ok_and(|c| c.dtype().is_float())
        })
        .map(|name| col(name.as_str()).round(decimals).alias(name.as_str()))
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(ROUND))?;
    Ok(Transformed::new(
        result,
        format!(
            "Rounded {} to {}",
            plural(columns.len(), "column"),
            plural(decimals as usize, "decimal")
        ),
    ))
}

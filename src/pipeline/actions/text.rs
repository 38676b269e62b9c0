use super::{Transformed, plural, require_dtype, runtime, with_columns};
use crate::error::StepError;
use crate::pipeline::params::{ParamReader, Params};
use polars::prelude::*;
use regex::Regex;
use serde::Deserialize;

const CHANGE_CASE: &str = "text_change_case";
const REGEX_REPLACE: &str = "text_regex_replace";
const EXTRACT_NUMBERS: &str = "text_extract_numbers";

/// First signed integer or decimal in a value.
const NUMBER_PATTERN: &str = r"(-?\d+(?:\.\d+)?)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Case {
    Lower,
    Upper,
}

fn is_text(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

fn text_columns(
    action: &'static str,
    reader: &ParamReader<'_>,
    df: &DataFrame,
) -> Result<Vec<String>, StepError> {
    let columns = reader.columns(df)?;
    require_dtype(action, df, &columns, "a text column", is_text)?;
    Ok(columns)
}

pub fn change_case(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(CHANGE_CASE, params);
    let case: Case = reader.parse("case")?;
    let columns = text_columns(CHANGE_CASE, &reader, df)?;

    let exprs = columns
        .iter()
        .map(|name| {
            let expr = col(name.as_str()).str();
            match case {
                Case::Lower => expr.to_lowercase(),
                Case::Upper => expr.to_uppercase(),
            }
            .alias(name.as_str())
        })
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(CHANGE_CASE))?;
    let label = match case {
        Case::Lower => "lower",
        Case::Upper => "upper",
    };
    Ok(Transformed::new(
        result,
        format!("Converted {} to {label} case", plural(columns.len(), "column")),
    ))
}

/// Replace every match of `pattern` with `replacement`.
///
/// The pattern is compiled with `regex` before any plan is built; a bad
/// expression is reported as `InvalidParams`.
pub fn regex_replace(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(REGEX_REPLACE, params);
    let pattern = reader.str("pattern")?;
    let replacement = reader.opt_str("replacement")?.unwrap_or_default();
    let columns = text_columns(REGEX_REPLACE, &reader, df)?;

    if pattern.is_empty() {
        return Err(reader.invalid("'pattern' is empty"));
    }
    let re = Regex::new(pattern).map_err(|e| reader.invalid(format!("invalid pattern: {e}")))?;

    let matches: usize = columns
        .iter()
        .filter_map(|name| df.column(name).ok())
        .filter_map(|c| c.str().ok())
        .map(|ca| ca.into_iter().flatten().map(|v| re.find_iter(v).count()).sum::<usize>())
        .sum();

    let exprs = columns
        .iter()
        .map(|name| {
            col(name.as_str())
                .str()
                .replace_all(lit(pattern), lit(replacement), false)
                .alias(name.as_str())
        })
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(REGEX_REPLACE))?;
    Ok(Transformed::new(
        result,
        format!("Replaced {}", plural(matches, "occurrence")),
    ))
}

/// Keep only the first number found in each value, as `Float64`.
///
/// Values without a number become null.
pub fn extract_numbers(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(EXTRACT_NUMBERS, params);
    let columns = text_columns(EXTRACT_NUMBERS, &reader, df)?;

    let exprs = columns
        .iter()
        .map(|name| {
            col(name.as_str())
                .str()
                .extract(lit(NUMBER_PATTERN), 1)
                .cast(DataType::Float64)
                .alias(name.as_str())
        })
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(EXTRACT_NUMBERS))?;
    let missing = super::new_nulls(df, &result, &columns);
    Ok(Transformed::new(
        result,
        format!(
            "Extracted numbers from {}, {} had none",
            plural(columns.len(), "column"),
            plural(missing, "value")
        ),
    ))
}

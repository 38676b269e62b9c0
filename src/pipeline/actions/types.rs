use super::{Transformed, new_nulls, plural, runtime, with_columns};
use crate::error::StepError;
use crate::pipeline::params::{ParamReader, Params};
use polars::prelude::*;

const TO_DATE: &str = "type_convert_to_date";
const TO_NUMERIC: &str = "type_convert_to_numeric";
const TO_TEXT: &str = "type_convert_to_text";

/// Parse columns into `Date`.
///
/// Text is parsed with `format` (strftime syntax) when given, otherwise the
/// format is inferred. Datetimes are truncated; values already typed `Date`
/// pass through. Values that cannot be parsed become null.
pub fn convert_to_date(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(TO_DATE, params);
    let columns = reader.columns(df)?;
    let format = reader.opt_str("format")?;

    if format.is_some_and(|f| !f.contains('%')) {
        return Err(reader.invalid("'format' has no % directives"));
    }

    let mut exprs = Vec::with_capacity(columns.len());
    for name in &columns {
        let dtype = df.column(name).map(|c| c.dtype().clone()).map_err(runtime(TO_DATE))?;
        let expr = col(name.as_str());
        let parsed = match dtype {
            DataType::Date => continue,
            DataType::String => expr.str().to_date(StrptimeOptions {
                format: format.map(Into::into),
                strict: false,
                ..Default::default()
            }),
            DataType::Datetime(_, _) => expr.cast(DataType::Date),
            other => {
                return Err(reader.invalid(format!(
                    "column '{name}' is {other}, expected text or a datetime"
                )));
            }
        };
        exprs.push(parsed.alias(name.as_str()));
    }

    let result = with_columns(df, exprs).map_err(runtime(TO_DATE))?;
    let failed = new_nulls(df, &result, &columns);
    Ok(Transformed::new(
        result,
        format!(
            "Converted {} to dates, {} could not be parsed",
            plural(columns.len(), "column"),
            plural(failed, "value")
        ),
    ))
}

/// Cast columns to `Float64`. Values that do not parse become null.
pub fn convert_to_numeric(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(TO_NUMERIC, params);
    let columns = reader.columns(df)?;

    let exprs = columns
        .iter()
        .map(|name| {
            let expr = col(name.as_str());
            let is_text = df
                .column(name.as_str())
                .is_ok_and(|c| c.dtype() == &DataType::String);
            if is_text {
                expr.str().strip_chars(lit(NULL)).cast(DataType::Float64)
            } else {
                expr.cast(DataType::Float64)
            }
            .alias(name.as_str())
        })
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(TO_NUMERIC))?;
    let failed = new_nulls(df, &result, &columns);
    Ok(Transformed::new(
        result,
        format!(
            "Converted {} to numbers, {} could not be parsed",
            plural(columns.len(), "column"),
            plural(failed, "value")
        ),
    ))
}

pub fn convert_to_text(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(TO_TEXT, params);
    let columns = reader.columns(df)?;

    let exprs = columns
        .iter()
        .map(|name| col(name.as_str()).cast(DataType::String).alias(name.as_str()))
        .collect();

    let result = with_columns(df, exprs).map_err(runtime(TO_TEXT))?;
    Ok(Transformed::new(
        result,
        format!("Converted {} to text", plural(columns.len(), "column")),
    ))
}

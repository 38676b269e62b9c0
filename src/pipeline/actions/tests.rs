#![expect(
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
use super::*;
use anyhow::Result;
use serde_json::{Value, json};

mod general;

fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        other => panic!("params must be an object, got {other}"),
    }
}

fn run(transform: TransformFn, df: &DataFrame, value: Value) -> Result<Transformed, StepError> {
    transform(df, &params(value))
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df.column(name)?.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

fn assert_invalid(result: Result<Transformed, StepError>, needle: &str) {
    match result {
        Err(err @ StepError::InvalidParams { .. }) => {
            assert!(
                err.to_string().contains(needle),
                "expected '{needle}' in '{err}'"
            );
        }
        Err(other) => panic!("expected InvalidParams, got {other:?}"),
        Ok(t) => panic!("expected InvalidParams, got success: {}", t.message),
    }
}

#[test]
fn test_plural() {
    assert_eq!(plural(0, "row"), "0 rows");
    assert_eq!(plural(1, "row"), "1 row");
    assert_eq!(plural(3, "column"), "3 columns");
}

#[test]
fn test_new_nulls_counts_only_added_nulls() -> Result<()> {
    let before = df!("a" => [Some(1.0), None, Some(3.0)], "b" => ["x", "y", "z"])?;
    let after = df!("a" => [None::<f64>, None, Some(3.0)], "b" => ["x", "y", "z"])?;

    assert_eq!(new_nulls(&before, &after, &["a".to_owned()]), 1);
    assert_eq!(new_nulls(&after, &before, &["a".to_owned()]), 0);
    assert_eq!(new_nulls(&before, &after, &["missing".to_owned()]), 0);
    Ok(())
}

#[test]
fn test_require_dtype_names_offending_column() -> Result<()> {
    let df = df!("n" => [1, 2], "s" => ["a", "b"])?;
    let cols = vec!["n".to_owned(), "s".to_owned()];

    let err = require_dtype("numeric_round", &df, &cols, "a numeric column", |dt| {
        dt.is_primitive_numeric()
    })
    .expect_err("s is text");
    assert!(err.to_string().contains("'s'"));
    assert!(err.to_string().contains("numeric_round"));
    Ok(())
}

#[test]
fn test_transforms_leave_input_untouched() -> Result<()> {
    let df = df!("a" => [Some(1.0), None, Some(1.0)])?;
    let snapshot = df.clone();

    let out = run(super::numeric::impute_by_method, &df, json!({"method": "zero"}))?;
    assert_eq!(out.dataset.column("a")?.null_count(), 0);
    assert!(df.equals_missing(&snapshot));
    assert_eq!(df.column("a")?.null_count(), 1);
    Ok(())
}

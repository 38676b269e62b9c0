use super::{assert_invalid, f64_values, run, str_values};
use crate::pipeline::actions::general::*;
use anyhow::Result;
use polars::prelude::*;
use serde_json::json;

#[test]
fn test_drop_duplicates_keeps_first_occurrence() -> Result<()> {
    let df = df!(
        "a" => [1, 1, 2, 1],
        "b" => ["x", "x", "y", "z"]
    )?;

    let out = run(drop_duplicates, &df, json!({}))?;
    assert_eq!(out.dataset.height(), 3);
    assert_eq!(str_values(&out.dataset, "b")?, vec![
        Some("x".to_owned()),
        Some("y".to_owned()),
        Some("z".to_owned())
    ]);
    assert_eq!(out.message, "Removed 1 duplicate row");
    Ok(())
}

#[test]
fn test_drop_duplicates_on_subset() -> Result<()> {
    let df = df!(
        "a" => [1, 1, 2, 1],
        "b" => ["x", "x", "y", "z"]
    )?;

    let out = run(drop_duplicates, &df, json!({"subset": ["a"]}))?;
    assert_eq!(out.dataset.height(), 2);

    assert_invalid(run(drop_duplicates, &df, json!({"subset": []})), "empty");
    assert_invalid(
        run(drop_duplicates, &df, json!({"subset": ["zz"]})),
        "unknown column",
    );
    Ok(())
}

#[test]
fn test_drop_columns() -> Result<()> {
    let df = df!("a" => [1], "b" => [2], "c" => [3])?;

    let out = run(drop_columns, &df, json!({"columns": ["b"]}))?;
    let names: Vec<&str> = out
        .dataset
        .get_column_names()
        .into_iter()
        .map(|n| n.as_str())
        .collect();
    assert_eq!(names, vec!["a", "c"]);

    assert_invalid(
        run(drop_columns, &df, json!({"columns": ["a", "b", "c"]})),
        "every column",
    );
    Ok(())
}

#[test]
fn test_rename_columns_preserves_order() -> Result<()> {
    let df = df!("first" => [1], "second" => [2])?;

    let out = run(
        rename_columns,
        &df,
        json!({"mapping": {"first": "alpha"}}),
    )?;
    let names: Vec<String> = out
        .dataset
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["alpha", "second"]);
    Ok(())
}

#[test]
fn test_rename_columns_rejects_collisions_and_unknown_sources() -> Result<()> {
    let df = df!("first" => [1], "second" => [2])?;

    assert_invalid(
        run(rename_columns, &df, json!({"mapping": {"first": "second"}})),
        "more than one column",
    );
    assert_invalid(
        run(rename_columns, &df, json!({"mapping": {"third": "x"}})),
        "third",
    );
    assert_invalid(run(rename_columns, &df, json!({"mapping": {}})), "empty");
    Ok(())
}

#[test]
fn test_rename_columns_swap() -> Result<()> {
    let df = df!("a" => [1], "b" => [2])?;
    let out = run(rename_columns, &df, json!({"mapping": {"a": "b", "b": "a"}}))?;
    assert_eq!(f64_values(&out.dataset, "a")?, vec![Some(2.0)]);
    assert_eq!(f64_values(&out.dataset, "b")?, vec![Some(1.0)]);
    Ok(())
}

#[test]
fn test_sanitize_column_name() {
    assert_eq!(sanitize_column_name("  First Name "), "first_name");
    assert_eq!(sanitize_column_name("Price ($)"), "price");
    assert_eq!(sanitize_column_name("a--b__c"), "a_b_c");
    assert_eq!(sanitize_column_name("2024 Sales"), "col_2024_sales");
    assert_eq!(sanitize_column_name("%%%"), "col");
}

#[test]
fn test_normalize_column_names_dedupes() -> Result<()> {
    let df = df!("User ID" => [1], "user-id" => [2], "ok" => [3])?;

    let out = run(normalize_column_names, &df, json!({}))?;
    let names: Vec<String> = out
        .dataset
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["user_id", "user_id_1", "ok"]);
    assert_eq!(out.message, "Normalized 2 of 3 column names");
    Ok(())
}

#[test]
fn test_drop_null_rows() -> Result<()> {
    let df = df!(
        "a" => [Some(1), None, Some(3), Some(4)],
        "b" => [Some("x"), Some("y"), None, Some("w")]
    )?;

    let any = run(drop_null_rows, &df, json!({}))?;
    assert_eq!(any.dataset.height(), 2);
    assert_eq!(any.message, "Removed 2 rows with missing values");

    let only_a = run(drop_null_rows, &df, json!({"columns": ["a"]}))?;
    assert_eq!(only_a.dataset.height(), 3);
    Ok(())
}

#[test]
fn test_calculated_column_arithmetic() -> Result<()> {
    let df = df!("qty" => [2, 3, 4], "price" => [1.5, 2.0, 0.0])?;

    let total = run(
        create_calculated_column,
        &df,
        json!({"name": "total", "left": "qty", "operator": "multiply", "right": "price"}),
    )?;
    assert_eq!(f64_values(&total.dataset, "total")?, vec![
        Some(3.0),
        Some(6.0),
        Some(0.0)
    ]);

    let shifted = run(
        create_calculated_column,
        &df,
        json!({"name": "qty_plus", "left": "qty", "operator": "add", "value": 10}),
    )?;
    assert_eq!(f64_values(&shifted.dataset, "qty_plus")?, vec![
        Some(12.0),
        Some(13.0),
        Some(14.0)
    ]);
    Ok(())
}

#[test]
fn test_calculated_column_divide_by_zero_is_null() -> Result<()> {
    let df = df!("a" => [4.0, 1.0], "b" => [2.0, 0.0])?;

    let out = run(
        create_calculated_column,
        &df,
        json!({"name": "ratio", "left": "a", "operator": "divide", "right": "b"}),
    )?;
    assert_eq!(f64_values(&out.dataset, "ratio")?, vec![Some(2.0), None]);
    Ok(())
}

#[test]
fn test_calculated_column_concat() -> Result<()> {
    let df = df!("first" => ["Ada", "Alan"], "id" => [1, 2])?;

    let out = run(
        create_calculated_column,
        &df,
        json!({"name": "label", "left": "first", "operator": "concat", "value": "-x"}),
    )?;
    assert_eq!(str_values(&out.dataset, "label")?, vec![
        Some("Ada-x".to_owned()),
        Some("Alan-x".to_owned())
    ]);

    let joined = run(
        create_calculated_column,
        &df,
        json!({"name": "key", "left": "first", "operator": "concat", "right": "id"}),
    )?;
    assert_eq!(str_values(&joined.dataset, "key")?, vec![
        Some("Ada1".to_owned()),
        Some("Alan2".to_owned())
    ]);
    Ok(())
}

#[test]
fn test_calculated_column_validation() -> Result<()> {
    let df = df!("a" => [1], "s" => ["x"])?;

    assert_invalid(
        run(
            create_calculated_column,
            &df,
            json!({"name": "a", "left": "a", "operator": "add", "value": 1}),
        ),
        "already exists",
    );
    assert_invalid(
        run(
            create_calculated_column,
            &df,
            json!({"name": "n", "left": "s", "operator": "add", "value": 1}),
        ),
        "numeric",
    );
    assert_invalid(
        run(
            create_calculated_column,
            &df,
            json!({"name": "n", "left": "a", "operator": "power", "value": 1}),
        ),
        "operator",
    );
    assert_invalid(
        run(
            create_calculated_column,
            &df,
            json!({"name": "n", "left": "a", "operator": "add"}),
        ),
        "missing",
    );
    Ok(())
}

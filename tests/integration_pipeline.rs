//! Integration tests for full pipeline runs
//!
//! These tests drive the public API end to end: base dataset in, final
//! dataset, receipts and diagnostics out.

use anyhow::Result;
use cleanroom::config::EngineConfig;
use cleanroom::pipeline::{
    InferredType, Orchestrator, PipelinePreview, PipelineSpec, PipelineState, Preprocessor, Step,
    analyze, execute_pipeline,
};
use polars::prelude::*;
use serde_json::json;

fn load_fixture(name: &str) -> Result<DataFrame> {
    Ok(LazyCsvReader::new(format!("testdata/{name}"))
        .with_has_header(true)
        .finish()?
        .collect()?)
}

fn people() -> Result<DataFrame> {
    Ok(df!(
        "a" => [Some(1.0), Some(1.0), Some(2.0), None],
        "b" => [Some("x"), Some("x"), Some("y"), Some(" N/A ")]
    )?)
}

#[test]
fn test_customer_fixture_end_to_end() -> Result<()> {
    let df = load_fixture("customers.csv")?;
    let spec = PipelineSpec::from_file("testdata/customers_pipeline.json")?;

    let outcome = execute_pipeline(&df, &spec.steps)?;
    assert_eq!(outcome.state, PipelineState::Done);
    assert_eq!(outcome.receipts.len(), spec.steps.len());
    assert!(outcome.receipts.iter().all(|r| r.success), "{:?}", outcome.receipts);

    let final_df = &outcome.dataset;
    assert_eq!(final_df.shape(), (5, 5));
    assert_eq!(outcome.receipts[1].rows_removed(), 1);
    assert_eq!(final_df.column("age")?.null_count(), 0);
    assert_eq!(final_df.column("spend")?.null_count(), 0);
    assert_eq!(final_df.column("signup_date")?.dtype(), &DataType::Date);
    assert_eq!(final_df.column("signup_date")?.null_count(), 1);
    assert_eq!(
        final_df.column("full_name")?.str()?.get(0),
        Some("ADA LOVELACE")
    );

    let diag = &outcome.diagnostics;
    assert_eq!(diag.row_count, 5);
    assert_eq!(
        diag.column("age").map(|c| c.inferred_type),
        Some(InferredType::Numeric)
    );
    assert_eq!(diag.duplicate_row_estimate, 0);
    Ok(())
}

#[test]
fn test_drop_duplicates_receipt() -> Result<()> {
    let df = df!("a" => [1, 1, 2], "b" => ["x", "x", "y"])?;
    let outcome = execute_pipeline(&df, &[Step::new("general_drop_duplicates")])?;

    assert_eq!(outcome.dataset.height(), 2);
    let receipt = &outcome.receipts[0];
    assert!(receipt.success);
    assert_eq!((receipt.rows_before, receipt.rows_after), (3, 2));
    Ok(())
}

#[test]
fn test_mean_imputation() -> Result<()> {
    let df = df!("a" => [Some(1), None, Some(3)])?;
    let steps = [Step::new("numeric_impute_by_method").with_param("method", "mean")];

    let outcome = execute_pipeline(&df, &steps)?;
    let values: Vec<Option<f64>> = outcome.dataset.column("a")?.f64()?.into_iter().collect();
    assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    Ok(())
}

#[test]
fn test_null_ratio_in_diagnostics() -> Result<()> {
    let df = df!("a" => [Some(1), None])?;
    let outcome = execute_pipeline(&df, &[])?;

    let a = outcome.diagnostics.column("a").expect("a is profiled");
    assert!((a.null_ratio - 0.5).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn test_empty_pipeline_is_prepare_plus_analyze() -> Result<()> {
    let df = people()?;
    let outcome = execute_pipeline(&df, &[])?;

    let prepared = Preprocessor::default().prepare(&df)?;
    assert!(outcome.dataset.equals_missing(&prepared));
    assert!(outcome.receipts.is_empty());
    assert_eq!(outcome.diagnostics, analyze(&prepared));
    assert_eq!(outcome.state, PipelineState::Done);
    Ok(())
}

#[test]
fn test_base_dataset_is_never_mutated() -> Result<()> {
    let df = people()?;
    let snapshot = df.clone();

    let steps = [
        Step::new("general_drop_duplicates"),
        Step::new("text_change_case")
            .with_param("column", "b")
            .with_param("case", "upper"),
        Step::new("general_drop_null_rows"),
    ];
    let outcome = execute_pipeline(&df, &steps)?;

    assert_eq!(outcome.dataset.height(), 2);
    assert!(df.equals_missing(&snapshot));
    assert_eq!(df.column("b")?.str()?.get(3), Some(" N/A "));
    Ok(())
}

#[test]
fn test_unknown_action_halts_with_previous_dataset() -> Result<()> {
    let df = people()?;
    let steps = [
        Step::new("general_drop_duplicates"),
        Step::new("os_system").with_param("cmd", "rm -rf /"),
        Step::new("general_drop_null_rows"),
    ];

    for config in [EngineConfig::default(), EngineConfig::lenient()] {
        let outcome = Orchestrator::new(config).execute(&df, &steps)?;

        assert!(outcome.halted());
        assert_eq!(outcome.state, PipelineState::Failed(1));
        assert_eq!(outcome.receipts.len(), 2);
        let last = outcome.receipts.last().expect("failing receipt");
        assert!(!last.success);
        assert_eq!(last.error_kind.as_deref(), Some("unknown_action"));

        let after_first = execute_pipeline(&df, &steps[..1])?;
        assert!(outcome.dataset.equals_missing(&after_first.dataset));
        assert_eq!(outcome.diagnostics, after_first.diagnostics);
    }
    Ok(())
}

#[test]
fn test_strict_stops_and_lenient_continues() -> Result<()> {
    let df = people()?;
    let steps = [
        Step::new("numeric_round").with_param("columns", json!(["a"])),
        Step::new("general_drop_duplicates"),
    ];

    let strict = Orchestrator::default().execute(&df, &steps)?;
    assert_eq!(strict.state, PipelineState::Failed(0));
    assert_eq!(strict.receipts.len(), 1);
    assert_eq!(strict.dataset.height(), 4);

    let lenient = Orchestrator::new(EngineConfig::lenient()).execute(&df, &steps)?;
    assert_eq!(lenient.state, PipelineState::Done);
    assert_eq!(lenient.receipts.len(), 2);
    assert!(!lenient.receipts[0].success);
    assert_eq!(lenient.receipts[0].error_kind.as_deref(), Some("invalid_params"));
    assert!(lenient.receipts[1].success);
    assert_eq!(lenient.dataset.height(), 3);
    Ok(())
}

#[test]
fn test_preview_serializes_run() -> Result<()> {
    let df = people()?;
    let spec = PipelineSpec::from_json(
        r#"[{"action": "general_drop_duplicates"}, {"action": "bogus"}]"#,
    )?;
    let outcome = execute_pipeline(&df, &spec.steps)?;

    let preview = PipelinePreview::build(&outcome, 2);
    let value: serde_json::Value = serde_json::from_str(&preview.to_json()?)?;
    assert_eq!(value["total_rows"], 3);
    assert_eq!(value["halted"], true);
    assert_eq!(value["preview"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["receipts"][1]["error_kind"], "unknown_action");
    assert_eq!(value["diagnostics"]["row_count"], 3);
    Ok(())
}

//! Row- and column-level structural actions.

use super::{Transformed, plural, require_dtype, runtime, select, with_columns};
use crate::error::StepError;
use crate::pipeline::params::{ParamReader, Params};
use polars::prelude::*;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

const DROP_DUPLICATES: &str = "general_drop_duplicates";
const DROP_COLUMNS: &str = "general_drop_columns";
const RENAME_COLUMNS: &str = "general_rename_columns";
const NORMALIZE_NAMES: &str = "general_normalize_column_names";
const DROP_NULL_ROWS: &str = "general_drop_null_rows";
const CALCULATED_COLUMN: &str = "general_create_calculated_column";

/// Remove repeated rows, keeping the first occurrence in original order.
///
/// `subset` limits the comparison to the listed columns.
pub fn drop_duplicates(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(DROP_DUPLICATES, params);
    let subset = match reader.opt_string_list("subset")? {
        Some(cols) if cols.is_empty() => return Err(reader.invalid("'subset' is empty")),
        Some(cols) => {
            reader.require_columns(df, &cols)?;
            Some(cols)
        }
        None => None,
    };

    let deduped = df
        .unique_stable(subset.as_deref(), UniqueKeepStrategy::First, None)
        .map_err(runtime(DROP_DUPLICATES))?;

    let removed = df.height() - deduped.height();
    Ok(Transformed::new(
        deduped,
        format!("Removed {}", plural(removed, "duplicate row")),
    ))
}

pub fn drop_columns(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(DROP_COLUMNS, params);
    let targets: HashSet<String> = reader.columns(df)?.into_iter().collect();

    let keep: Vec<Expr> = df
        .get_column_names()
        .into_iter()
        .filter(|name| !targets.contains(name.as_str()))
        .map(|name| col(name.clone()))
        .collect();

    if keep.is_empty() {
        return Err(reader.invalid("cannot drop every column"));
    }

    let result = select(df, keep).map_err(runtime(DROP_COLUMNS))?;
    Ok(Transformed::new(
        result,
        format!("Dropped {}", plural(targets.len(), "column")),
    ))
}

pub fn rename_columns(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(RENAME_COLUMNS, params);
    let mapping = reader.mapping("mapping")?;

    let sources: Vec<String> = mapping.iter().map(|(from, _)| from.clone()).collect();
    reader.require_columns(df, &sources)?;

    let renames: HashMap<&str, &str> = mapping
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();

    let final_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| {
            renames
                .get(name.as_str())
                .map_or_else(|| name.to_string(), |to| (*to).to_owned())
        })
        .collect();
    ensure_unique_names(&reader, &final_names)?;

    if let Some((from, _)) = mapping.iter().find(|(_, to)| to.trim().is_empty()) {
        return Err(reader.invalid(format!("new name for '{from}' is empty")));
    }

    let exprs = rename_exprs(df, &final_names);
    let result = select(df, exprs).map_err(runtime(RENAME_COLUMNS))?;
    Ok(Transformed::new(
        result,
        format!("Renamed {}", plural(mapping.len(), "column")),
    ))
}

/// Lowercase names, replace symbols with `_` and resolve collisions.
pub fn normalize_column_names(df: &DataFrame, _params: &Params) -> Result<Transformed, StepError> {
    let current: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    let normalized = sanitize_column_names(&current);

    let changed = current
        .iter()
        .zip(&normalized)
        .filter(|(old, new)| old != new)
        .count();

    let exprs = rename_exprs(df, &normalized);
    let result = select(df, exprs).map_err(runtime(NORMALIZE_NAMES))?;
    Ok(Transformed::new(
        result,
        format!(
            "Normalized {} of {}",
            changed,
            plural(current.len(), "column name")
        ),
    ))
}

/// Drop rows holding a null in any of `columns` (default: any column).
pub fn drop_null_rows(df: &DataFrame, params: &Params) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(DROP_NULL_ROWS, params);
    let columns = match reader.opt_columns(df)? {
        Some(cols) => cols,
        None => df
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    };

    let Some(predicate) = columns
        .iter()
        .map(|name| col(name.as_str()).is_not_null())
        .reduce(Expr::and)
    else {
        return Ok(Transformed::new(df.clone(), "No columns to check"));
    };

    let result = df
        .clone()
        .lazy()
        .filter(predicate)
        .collect()
        .map_err(runtime(DROP_NULL_ROWS))?;

    let removed = df.height() - result.height();
    Ok(Transformed::new(
        result,
        format!("Removed {} with missing values", plural(removed, "row")),
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
}

impl Operator {
    fn operand_dtype(self) -> DataType {
        match self {
            Self::Concat => DataType::String,
            _ => DataType::Float64,
        }
    }

    fn apply(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => when(rhs.clone().eq(lit(0.0)))
                .then(lit(NULL))
                .otherwise(lhs / rhs),
            Self::Concat => concat_str([lhs, rhs], "", false),
        }
    }
}

/// Add `name = left <operator> (right | value)`.
///
/// Arithmetic runs in `Float64`; dividing by zero yields null. `concat`
/// joins the text forms and yields null when either side is null.
pub fn create_calculated_column(
    df: &DataFrame,
    params: &Params,
) -> Result<Transformed, StepError> {
    let reader = ParamReader::new(CALCULATED_COLUMN, params);
    let name = reader.str("name")?;
    let left = reader.str("left")?.to_owned();
    let operator: Operator = reader.parse("operator")?;

    if name.trim().is_empty() {
        return Err(reader.invalid("'name' is empty"));
    }
    if df.column(name).is_ok() {
        return Err(reader.invalid(format!("column '{name}' already exists")));
    }
    reader.require_columns(df, std::slice::from_ref(&left))?;

    let right = match (reader.opt_str("right")?, params.get("value")) {
        (Some(_), Some(_)) => return Err(reader.invalid("give either 'right' or 'value', not both")),
        (Some(column), None) => {
            reader.require_columns(df, &[column.to_owned()])?;
            Operand::Column(column.to_owned())
        }
        (None, Some(serde_json::Value::Number(n))) => Operand::Number(
            n.as_f64()
                .ok_or_else(|| reader.invalid("'value' is not a finite number"))?,
        ),
        (None, Some(serde_json::Value::String(s))) if operator == Operator::Concat => {
            Operand::Text(s.clone())
        }
        (None, Some(other)) => {
            return Err(reader.invalid(format!("unsupported 'value': {other}")));
        }
        (None, None) => return Err(reader.invalid("missing 'right' or 'value'")),
    };

    if operator != Operator::Concat {
        let mut numeric_cols = vec![left.clone()];
        if let Operand::Column(c) = &right {
            numeric_cols.push(c.clone());
        }
        require_dtype(CALCULATED_COLUMN, df, &numeric_cols, "a numeric column", |dt| {
            dt.is_primitive_numeric()
        })?;
    }

    let dtype = operator.operand_dtype();
    let lhs = col(left.as_str()).cast(dtype.clone());
    let rhs = match right {
        Operand::Column(c) => col(c.as_str()).cast(dtype),
        Operand::Number(n) if operator == Operator::Concat => lit(n.to_string()),
        Operand::Number(n) => lit(n),
        Operand::Text(s) => lit(s),
    };

    let result = with_columns(df, vec![operator.apply(lhs, rhs).alias(name)])
        .map_err(runtime(CALCULATED_COLUMN))?;
    Ok(Transformed::new(
        result,
        format!("Created column '{name}' from '{left}'"),
    ))
}

enum Operand {
    Column(String),
    Number(f64),
    Text(String),
}

fn rename_exprs(df: &DataFrame, new_names: &[String]) -> Vec<Expr> {
    df.get_column_names()
        .into_iter()
        .zip(new_names)
        .map(|(old, new)| {
            if old.as_str() == new {
                col(old.clone())
            } else {
                col(old.clone()).alias(new.as_str())
            }
        })
        .collect()
}

fn ensure_unique_names(reader: &ParamReader<'_>, names: &[String]) -> Result<(), StepError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(reader.invalid(format!("more than one column would be named '{name}'")));
        }
    }
    Ok(())
}

pub fn sanitize_column_name(name: &str) -> String {
    let lowered: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();

    let mut collapsed = String::with_capacity(lowered.len());
    let mut last_was_underscore = false;
    for c in lowered.chars() {
        if c == '_' {
            if !last_was_underscore {
                collapsed.push(c);
            }
            last_was_underscore = true;
        } else {
            collapsed.push(c);
            last_was_underscore = false;
        }
    }

    let trimmed = collapsed.trim_matches('_');
    match trimmed.chars().next() {
        None => "col".to_owned(),
        Some(first) if first.is_ascii_digit() => format!("col_{trimmed}"),
        Some(_) => trimmed.to_owned(),
    }
}

/// Sanitize every name, suffixing `_1`, `_2`, ... on collisions.
pub fn sanitize_column_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| {
            let base = sanitize_column_name(name);
            let mut candidate = base.clone();
            let mut count = 0;
            while seen.contains(&candidate) {
                count += 1;
                candidate = format!("{base}_{count}");
            }
            seen.insert(candidate.clone());
            candidate
        })
        .collect()
}

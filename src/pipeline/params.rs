//! Typed access to step parameters.
//!
//! Parameters arrive as an untyped JSON object. Transforms read them through
//! [`ParamReader`], which turns every missing or mistyped value into an
//! `InvalidParams` error naming the action and the key.

use crate::error::StepError;
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Step parameters as decoded from the client payload.
pub type Params = serde_json::Map<String, Value>;

pub struct ParamReader<'a> {
    action: &'static str,
    params: &'a Params,
}

impl<'a> ParamReader<'a> {
    pub fn new(action: &'static str, params: &'a Params) -> Self {
        Self { action, params }
    }

    pub fn invalid(&self, message: impl Into<String>) -> StepError {
        StepError::invalid_params(self.action, message)
    }

    pub fn has(&self, key: &str) -> bool {
        self.params.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn str(&self, key: &str) -> Result<&'a str, StepError> {
        self.opt_str(key)?
            .ok_or_else(|| self.invalid(format!("missing '{key}'")))
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, StepError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(format!("'{key}' must be a string, got {other}"))),
        }
    }

    pub fn f64(&self, key: &str) -> Result<f64, StepError> {
        self.opt_f64(key)?
            .ok_or_else(|| self.invalid(format!("missing '{key}'")))
    }

    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>, StepError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{key}' is not a finite number"))),
            Some(other) => Err(self.invalid(format!("'{key}' must be a number, got {other}"))),
        }
    }

    pub fn opt_u32(&self, key: &str) -> Result<Option<u32>, StepError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(format!("'{key}' must be a non-negative integer"))),
            Some(other) => Err(self.invalid(format!(
                "'{key}' must be a non-negative integer, got {other}"
            ))),
        }
    }

    /// Deserialize a parameter into a typed value (usually a `snake_case` enum).
    pub fn parse<T: DeserializeOwned>(&self, key: &str) -> Result<T, StepError> {
        let value = self
            .params
            .get(key)
            .filter(|v| !v.is_null())
            .ok_or_else(|| self.invalid(format!("missing '{key}'")))?;

        serde_json::from_value(value.clone())
            .map_err(|e| self.invalid(format!("invalid '{key}' ({value}): {e}")))
    }

    pub fn opt_string_list(&self, key: &str) -> Result<Option<Vec<String>>, StepError> {
        match self.params.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_owned).ok_or_else(|| {
                        self.invalid(format!("'{key}' must only contain strings, got {item}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.invalid(format!(
                "'{key}' must be a list of strings, got {other}"
            ))),
        }
    }

    /// String-to-string mapping, in key order.
    pub fn mapping(&self, key: &str) -> Result<Vec<(String, String)>, StepError> {
        match self.params.get(key) {
            Some(Value::Object(map)) if !map.is_empty() => map
                .iter()
                .map(|(from, to)| {
                    to.as_str()
                        .map(|to| (from.clone(), to.to_owned()))
                        .ok_or_else(|| self.invalid(format!("'{key}.{from}' must be a string")))
                })
                .collect(),
            Some(Value::Object(_)) => Err(self.invalid(format!("'{key}' is empty"))),
            None | Some(Value::Null) => Err(self.invalid(format!("missing '{key}'"))),
            Some(other) => Err(self.invalid(format!("'{key}' must be an object, got {other}"))),
        }
    }

    /// Target columns, read from `columns` (list) or `column` (single name).
    ///
    /// Returns `None` when neither is given so callers can pick a default.
    /// Every named column must exist in `df`.
    pub fn opt_columns(&self, df: &DataFrame) -> Result<Option<Vec<String>>, StepError> {
        let columns = match (self.opt_string_list("columns")?, self.opt_str("column")?) {
            (Some(list), _) => list,
            (None, Some(single)) => vec![single.to_owned()],
            (None, None) => return Ok(None),
        };

        if columns.is_empty() {
            return Err(self.invalid("no columns given"));
        }
        self.require_columns(df, &columns)?;
        Ok(Some(columns))
    }

    /// Like [`Self::opt_columns`] but at least one column is mandatory.
    pub fn columns(&self, df: &DataFrame) -> Result<Vec<String>, StepError> {
        self.opt_columns(df)?
            .ok_or_else(|| self.invalid("missing 'columns'"))
    }

    pub fn require_columns(&self, df: &DataFrame, columns: &[String]) -> Result<(), StepError> {
        let missing: Vec<&str> = columns
            .iter()
            .filter(|name| df.column(name.as_str()).is_err())
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(self.invalid(format!("unknown column(s): {}", missing.join(", "))))
        }
    }
}

//! Text normalisation applied once before the first pipeline step.

use crate::config::EngineConfig;
use polars::prelude::*;

/// Trims string columns and turns null-like tokens into real nulls.
///
/// Tokens are matched case-insensitively against the trimmed value; the
/// empty string always counts as null. Non-string columns are left alone.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    null_tokens: Vec<String>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Preprocessor {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut null_tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();
        null_tokens.push(String::new());
        null_tokens.sort();
        null_tokens.dedup();
        Self { null_tokens }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(&config.null_tokens)
    }

    pub fn null_tokens(&self) -> &[String] {
        &self.null_tokens
    }

    /// Return a normalised copy of `df`.
    pub fn prepare(&self, df: &DataFrame) -> PolarsResult<DataFrame> {
        let tokens = Series::new("null_tokens".into(), self.null_tokens.as_slice());

        let exprs: Vec<Expr> = df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::String)
            .map(|c| {
                let trimmed = col(c.name().clone()).str().strip_chars(lit(NULL));
                when(
                    trimmed
                        .clone()
                        .str()
                        .to_lowercase()
                        .is_in(lit(tokens.clone())),
                )
                .then(lit(NULL).cast(DataType::String))
                .otherwise(trimmed)
                .alias(c.name().clone())
            })
            .collect();

        if exprs.is_empty() {
            return Ok(df.clone());
        }
        df.clone().lazy().with_columns(exprs).collect()
    }
}

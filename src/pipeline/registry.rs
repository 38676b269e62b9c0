//! The closed set of cleaning actions.
//!
//! [`ActionId`] is the whitelist: every public identifier maps to exactly one
//! transform through a `match`, so an identifier can never reach code outside
//! this table. Lookup is an exact, case-sensitive string comparison.

use super::actions::{TransformFn, general, numeric, text, types};
use crate::error::StepError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    GeneralDropDuplicates,
    GeneralDropColumns,
    GeneralRenameColumns,
    GeneralNormalizeColumnNames,
    GeneralDropNullRows,
    GeneralCreateCalculatedColumn,
    NumericImputeByMethod,
    NumericClipOutliers,
    NumericNormalize,
    NumericRound,
    TextChangeCase,
    TextRegexReplace,
    TextExtractNumbers,
    TypeConvertToDate,
    TypeConvertToNumeric,
    TypeConvertToText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    General,
    Numeric,
    Text,
    Type,
}

impl ActionId {
    pub const ALL: [Self; 16] = [
        Self::GeneralDropDuplicates,
        Self::GeneralDropColumns,
        Self::GeneralRenameColumns,
        Self::GeneralNormalizeColumnNames,
        Self::GeneralDropNullRows,
        Self::GeneralCreateCalculatedColumn,
        Self::NumericImputeByMethod,
        Self::NumericClipOutliers,
        Self::NumericNormalize,
        Self::NumericRound,
        Self::TextChangeCase,
        Self::TextRegexReplace,
        Self::TextExtractNumbers,
        Self::TypeConvertToDate,
        Self::TypeConvertToNumeric,
        Self::TypeConvertToText,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GeneralDropDuplicates => "general_drop_duplicates",
            Self::GeneralDropColumns => "general_drop_columns",
            Self::GeneralRenameColumns => "general_rename_columns",
            Self::GeneralNormalizeColumnNames => "general_normalize_column_names",
            Self::GeneralDropNullRows => "general_drop_null_rows",
            Self::GeneralCreateCalculatedColumn => "general_create_calculated_column",
            Self::NumericImputeByMethod => "numeric_impute_by_method",
            Self::NumericClipOutliers => "numeric_clip_outliers",
            Self::NumericNormalize => "numeric_normalize",
            Self::NumericRound => "numeric_round",
            Self::TextChangeCase => "text_change_case",
            Self::TextRegexReplace => "text_regex_replace",
            Self::TextExtractNumbers => "text_extract_numbers",
            Self::TypeConvertToDate => "type_convert_to_date",
            Self::TypeConvertToNumeric => "type_convert_to_numeric",
            Self::TypeConvertToText => "type_convert_to_text",
        }
    }

    pub fn category(self) -> ActionCategory {
        match self {
            Self::GeneralDropDuplicates
            | Self::GeneralDropColumns
            | Self::GeneralRenameColumns
            | Self::GeneralNormalizeColumnNames
            | Self::GeneralDropNullRows
            | Self::GeneralCreateCalculatedColumn => ActionCategory::General,
            Self::NumericImputeByMethod
            | Self::NumericClipOutliers
            | Self::NumericNormalize
            | Self::NumericRound => ActionCategory::Numeric,
            Self::TextChangeCase | Self::TextRegexReplace | Self::TextExtractNumbers => {
                ActionCategory::Text
            }
            Self::TypeConvertToDate | Self::TypeConvertToNumeric | Self::TypeConvertToText => {
                ActionCategory::Type
            }
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::GeneralDropDuplicates => "Remove repeated rows, keeping the first occurrence",
            Self::GeneralDropColumns => "Remove the listed columns",
            Self::GeneralRenameColumns => "Rename columns using an old-to-new mapping",
            Self::GeneralNormalizeColumnNames => "Lowercase column names and replace symbols with _",
            Self::GeneralDropNullRows => "Remove rows with a missing value",
            Self::GeneralCreateCalculatedColumn => "Add a column computed from two operands",
            Self::NumericImputeByMethod => "Fill missing numbers by mean, median, mode, zero or a constant",
            Self::NumericClipOutliers => "Clamp values to a quantile range",
            Self::NumericNormalize => "Rescale values with min-max or z-score",
            Self::NumericRound => "Round to a number of decimals",
            Self::TextChangeCase => "Convert text to lower or upper case",
            Self::TextRegexReplace => "Replace regular-expression matches",
            Self::TextExtractNumbers => "Pull the first number out of each text value",
            Self::TypeConvertToDate => "Parse text into dates",
            Self::TypeConvertToNumeric => "Convert values to numbers",
            Self::TypeConvertToText => "Convert values to text",
        }
    }

    /// The transform bound to this action.
    pub fn transform(self) -> TransformFn {
        match self {
            Self::GeneralDropDuplicates => general::drop_duplicates,
            Self::GeneralDropColumns => general::drop_columns,
            Self::GeneralRenameColumns => general::rename_columns,
            Self::GeneralNormalizeColumnNames => general::normalize_column_names,
            Self::GeneralDropNullRows => general::drop_null_rows,
            Self::GeneralCreateCalculatedColumn => general::create_calculated_column,
            Self::NumericImputeByMethod => numeric::impute_by_method,
            Self::NumericClipOutliers => numeric::clip_outliers,
            Self::NumericNormalize => numeric::normalize,
            Self::NumericRound => numeric::round,
            Self::TextChangeCase => text::change_case,
            Self::TextRegexReplace => text::regex_replace,
            Self::TextExtractNumbers => text::extract_numbers,
            Self::TypeConvertToDate => types::convert_to_date,
            Self::TypeConvertToNumeric => types::convert_to_numeric,
            Self::TypeConvertToText => types::convert_to_text,
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionId {
    type Err = StepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionRegistry::global().lookup(s)
    }
}

/// Public description of one registered action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo {
    pub id: ActionId,
    pub category: ActionCategory,
    pub description: &'static str,
}

/// Read-only identifier table, built once per process.
pub struct ActionRegistry {
    by_name: HashMap<&'static str, ActionId>,
}

static REGISTRY: LazyLock<ActionRegistry> = LazyLock::new(ActionRegistry::build);

impl ActionRegistry {
    fn build() -> Self {
        let by_name = ActionId::ALL
            .into_iter()
            .map(|id| (id.as_str(), id))
            .collect();
        Self { by_name }
    }

    pub fn global() -> &'static Self {
        &REGISTRY
    }

    /// Exact-match lookup of a public identifier.
    pub fn lookup(&self, name: &str) -> Result<ActionId, StepError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| StepError::UnknownAction(name.to_owned()))
    }

    /// Resolve a public identifier straight to its transform.
    pub fn resolve(&self, name: &str) -> Result<(ActionId, TransformFn), StepError> {
        let id = self.lookup(name)?;
        Ok((id, id.transform()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// All actions in catalogue order.
    pub fn list(&self) -> Vec<ActionInfo> {
        ActionId::ALL
            .into_iter()
            .map(|id| ActionInfo {
                id,
                category: id.category(),
                description: id.description(),
            })
            .collect()
    }
}

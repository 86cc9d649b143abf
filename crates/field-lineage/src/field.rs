use std::fmt;

use serde::{Deserialize, Serialize};

/// Datatype reported for fields whose provider record carries none.
pub const UNKNOWN_DATATYPE: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Parameter,
    CalculatedField,
    DefaultField,
}

impl FieldCategory {
    /// Category of a field owned by `datasource`, given whether it carries a formula.
    pub fn classify(datasource: &str, parameters_datasource: &str, has_calculation: bool) -> Self {
        if datasource == parameters_datasource {
            FieldCategory::Parameter
        } else if has_calculation {
            FieldCategory::CalculatedField
        } else {
            FieldCategory::DefaultField
        }
    }

    /// Tie-break rank used when one identifier appears several times (lower wins).
    pub fn dedup_rank(self) -> u8 {
        match self {
            FieldCategory::Parameter => 0,
            FieldCategory::CalculatedField => 1,
            FieldCategory::DefaultField => 2,
        }
    }

    /// Row order of the summary table (lower first).
    pub fn summary_rank(self) -> u8 {
        match self {
            FieldCategory::DefaultField => 0,
            FieldCategory::Parameter => 1,
            FieldCategory::CalculatedField => 2,
        }
    }

    /// Label used in the `Type` column of the summary table.
    pub fn summary_label(self) -> &'static str {
        match self {
            FieldCategory::Parameter => "Parameters",
            FieldCategory::CalculatedField => "Calculated_Field",
            FieldCategory::DefaultField => "Default_Field",
        }
    }
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary_label())
    }
}

/// A deduplicated workbook field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub datasource_name: String,
    pub datasource_caption: String,
    /// Formula text exactly as the provider reported it.
    pub calculation: Option<String>,
    /// Formula with identifiers replaced by field names; equals `calculation` when the
    /// substitution was refused.
    pub display_calculation: Option<String>,
    pub category: FieldCategory,
    pub worksheets: Vec<String>,
    pub datatype: String,
}

impl Field {
    pub fn is_used(&self) -> bool {
        !self.worksheets.is_empty()
    }

    pub fn is_calculated(&self) -> bool {
        self.category == FieldCategory::CalculatedField
    }

    /// Formula text that is scanned for references; `None` for blank formulas.
    pub fn scannable_calculation(&self) -> Option<&str> {
        self.calculation
            .as_deref()
            .filter(|calc| !calc.trim().is_empty())
    }

    pub fn is_bracketed(&self) -> bool {
        is_bracketed(&self.id)
    }
}

pub fn is_bracketed(id: &str) -> bool {
    id.starts_with('[')
}

/// Removes every `[` and `]` from `text`.
pub fn strip_brackets(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '[' | ']')).collect()
}

/// Keeps the first occurrence of each worksheet name.
pub(crate) fn dedup_worksheets(worksheets: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(worksheets.len());
    for sheet in worksheets {
        if sheet.is_empty() || out.iter().any(|s| s == sheet) {
            continue;
        }
        out.push(sheet.clone());
    }
    out
}

use serde::{Deserialize, Serialize};

/// Name of the data source that holds report-level parameters.
pub const DEFAULT_PARAMETERS_DATASOURCE: &str = "Parameters";

/// How malformed field records are handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Abort the run on the first malformed record.
    #[default]
    Batch,
    /// Skip malformed records and keep a warning for each one.
    Interactive,
}

/// How "field F is used in formula C" is decided.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// F's marker occurs anywhere inside C's normalized formula text.
    #[default]
    Substring,
    /// F's bracketed identifier equals one of the bracketed reference segments of C's formula.
    Reference,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageOptions {
    pub mode: OperatingMode,
    pub match_mode: MatchMode,
    /// Fields owned by this data source are categorized as parameters.
    pub parameters_datasource: String,
}

impl Default for LineageOptions {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            match_mode: MatchMode::default(),
            parameters_datasource: DEFAULT_PARAMETERS_DATASOURCE.to_string(),
        }
    }
}

impl LineageOptions {
    pub fn interactive() -> Self {
        Self {
            mode: OperatingMode::Interactive,
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

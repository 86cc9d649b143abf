use std::fmt;

use crate::codes::CodePool;

pub type LineageResult<T> = Result<T, LineageError>;

/// Pipeline stage a fatal error is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Parse,
    Extraction,
    Resolve,
    Allocation,
    Export,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Extraction => "extraction",
            Stage::Resolve => "resolve",
            Stage::Allocation => "allocation",
            Stage::Export => "export",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The document-model provider could not produce a field list at all.
#[derive(Debug, thiserror::Error)]
pub enum DocumentParseError {
    #[error("failed to read field document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed field document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid field document: {0}")]
    Invalid(String),
}

/// Required attribute that was absent (or blank) on a raw field record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingAttribute {
    Id,
    Name,
}

impl fmt::Display for MissingAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingAttribute::Id => "id",
            MissingAttribute::Name => "name",
        })
    }
}

/// A single raw field record is malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("field #{position} in data source {datasource} is missing its {missing}{}", describe_partial(.partial_id.as_deref(), .partial_name.as_deref()))]
pub struct FieldExtractionError {
    pub datasource: String,
    /// Zero-based position of the record within its data source.
    pub position: usize,
    pub missing: MissingAttribute,
    pub partial_id: Option<String>,
    pub partial_name: Option<String>,
}

impl FieldExtractionError {
    /// Best identifier available for the offending record.
    pub fn field_hint(&self) -> Option<&str> {
        self.partial_id.as_deref().or(self.partial_name.as_deref())
    }
}

fn describe_partial(id: Option<&str>, name: Option<&str>) -> String {
    match (id, name) {
        (Some(id), _) => format!(" (id {id})"),
        (None, Some(name)) => format!(" (name {name})"),
        (None, None) => String::new(),
    }
}

/// Friendly-name substitution refused to rewrite a formula.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubstitutionError {
    #[error("formula contains an undecodable character at byte {offset}")]
    UndecodableText { offset: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    #[error("parse stage failed: {0}")]
    DocumentParse(#[from] DocumentParseError),

    #[error("extraction stage failed: {0}")]
    FieldExtraction(#[from] FieldExtractionError),

    #[error(
        "allocation stage failed: {required} used {pool} fields exceed the {capacity} available short codes"
    )]
    IdentifierExhaustion {
        pool: CodePool,
        required: usize,
        capacity: usize,
    },

    #[error("export stage failed: edge {from} -> {to} references a code with no node")]
    DanglingEdge { from: String, to: String },
}

impl LineageError {
    pub fn stage(&self) -> Stage {
        match self {
            LineageError::DocumentParse(_) => Stage::Parse,
            LineageError::FieldExtraction(_) => Stage::Extraction,
            LineageError::IdentifierExhaustion { .. } => Stage::Allocation,
            LineageError::DanglingEdge { .. } => Stage::Export,
        }
    }

    /// Field identifier involved in the failure, when there is one.
    pub fn field_id(&self) -> Option<&str> {
        match self {
            LineageError::FieldExtraction(err) => err.field_hint(),
            _ => None,
        }
    }
}

/// Non-fatal condition recorded while a run continues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineageWarning {
    SkippedField(FieldExtractionError),
    Substitution {
        field_id: String,
        error: SubstitutionError,
    },
    MarkerCollision {
        field_id: String,
        owner_id: String,
        marker: String,
    },
}

impl LineageWarning {
    pub fn stage(&self) -> Stage {
        match self {
            LineageWarning::SkippedField(_) => Stage::Extraction,
            LineageWarning::Substitution { .. } | LineageWarning::MarkerCollision { .. } => {
                Stage::Resolve
            }
        }
    }
}

impl fmt::Display for LineageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageWarning::SkippedField(err) => write!(f, "skipping field: {err}"),
            LineageWarning::Substitution { field_id, error } => {
                write!(f, "kept raw formula for {field_id}: {error}")
            }
            LineageWarning::MarkerCollision {
                field_id,
                owner_id,
                marker,
            } => write!(
                f,
                "{field_id} normalizes to marker {marker} already owned by {owner_id}; it will not match any formula"
            ),
        }
    }
}

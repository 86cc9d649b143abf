//! Raw field records as handed over by a workbook document-model provider.
//!
//! Parsing the native workbook format (and unpacking packaged archives) happens outside this
//! crate. Providers implement [`FieldSource`]; [`JsonFieldSource`] reads the JSON interchange
//! form:
//!
//! ```json
//! {
//!   "datasources": [
//!     {
//!       "name": "federated.0x1",
//!       "caption": "Orders",
//!       "fields": [
//!         { "id": "[Sales]", "name": "Sales", "datatype": "real", "worksheets": ["Sheet1"] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DocumentParseError;

/// One field as reported by the provider. `id` and `name` are optional here so a malformed
/// record can be reported on its own instead of rejecting the whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFieldRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub calculation: Option<String>,
    #[serde(default)]
    pub datatype: Option<String>,
    #[serde(default)]
    pub worksheets: Vec<String>,
}

impl RawFieldRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_calculation(mut self, calculation: impl Into<String>) -> Self {
        self.calculation = Some(calculation.into());
        self
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn used_in<I, S>(mut self, worksheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.worksheets.extend(worksheets.into_iter().map(Into::into));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDatasource {
    pub name: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub fields: Vec<RawFieldRecord>,
}

impl RawDatasource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_field(mut self, field: RawFieldRecord) -> Self {
        self.fields.push(field);
        self
    }

    /// Caption shown to users; falls back to the internal name.
    pub fn display_caption(&self) -> &str {
        match self.caption.as_deref() {
            Some(caption) if !caption.trim().is_empty() => caption,
            _ => &self.name,
        }
    }
}

/// Provider of the workbook's field list, grouped by data source in document order.
pub trait FieldSource {
    fn datasources(&self) -> Result<Vec<RawDatasource>, DocumentParseError>;
}

impl FieldSource for Vec<RawDatasource> {
    fn datasources(&self) -> Result<Vec<RawDatasource>, DocumentParseError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Deserialize)]
struct FieldDocument {
    datasources: Vec<RawDatasource>,
}

/// [`FieldSource`] over the JSON interchange document.
#[derive(Clone, Debug)]
pub struct JsonFieldSource {
    text: String,
}

impl JsonFieldSource {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentParseError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| DocumentParseError::Invalid(format!("document is not UTF-8: {err}")))?;
        Ok(Self::from_text(text))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, DocumentParseError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn open(path: &Path) -> Result<Self, DocumentParseError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl FieldSource for JsonFieldSource {
    fn datasources(&self) -> Result<Vec<RawDatasource>, DocumentParseError> {
        let doc: FieldDocument = serde_json::from_str(&self.text)?;
        for ds in &doc.datasources {
            if ds.name.trim().is_empty() {
                return Err(DocumentParseError::Invalid(
                    "data source without a name".to_string(),
                ));
            }
        }
        Ok(doc.datasources)
    }
}

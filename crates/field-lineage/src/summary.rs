use serde::Serialize;

use crate::catalog::FieldCatalog;
use crate::field::{strip_brackets, Field};

pub const SUMMARY_COLUMNS: [&str; 8] = [
    "Field_Name",
    "DataType",
    "Type",
    "Calculation",
    "Field_ID",
    "Datasource",
    "Worksheets",
    "Used_In_Report",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Field_Name")]
    pub field_name: String,
    #[serde(rename = "DataType")]
    pub datatype: String,
    #[serde(rename = "Type")]
    pub kind: &'static str,
    #[serde(rename = "Calculation")]
    pub calculation: String,
    #[serde(rename = "Field_ID")]
    pub field_id: String,
    #[serde(rename = "Datasource")]
    pub datasource: String,
    #[serde(rename = "Worksheets")]
    pub worksheets: String,
    #[serde(rename = "Used_In_Report")]
    pub used_in_report: &'static str,
}

impl SummaryRow {
    pub fn from_field(field: &Field) -> Self {
        Self {
            field_name: strip_brackets(&field.name),
            datatype: field.datatype.clone(),
            kind: field.category.summary_label(),
            calculation: field.display_calculation.clone().unwrap_or_default(),
            field_id: field.id.clone(),
            datasource: field.datasource_caption.clone(),
            worksheets: field.worksheets.join(", "),
            used_in_report: if field.is_used() { "Yes" } else { "No" },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// One row per catalog field, default fields first, then parameters, then calculated
    /// fields; catalog order within each type.
    pub fn build(catalog: &FieldCatalog) -> Self {
        let mut fields: Vec<&Field> = catalog.iter().collect();
        fields.sort_by_key(|f| f.category.summary_rank());
        Self {
            rows: fields.into_iter().map(SummaryRow::from_field).collect(),
        }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

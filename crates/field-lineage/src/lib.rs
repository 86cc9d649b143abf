//! Field lineage for BI workbooks.
//!
//! Takes the raw field records of a workbook (grouped by data source), deduplicates them into a
//! [`FieldCatalog`], decides which fields each calculated field's formula references and
//! produces two outputs:
//! - a [`SummaryTable`] with one row per field
//! - a [`LineageGraph`] node/edge document for an external renderer
//!
//! Workbook parsing stays outside the crate; providers implement [`FieldSource`].

mod catalog;
mod codes;
mod error;
mod export;
mod field;
mod graph;
mod options;
mod pipeline;
mod record;
mod resolver;
mod summary;

pub use crate::catalog::FieldCatalog;
pub use crate::codes::{
    CodeAssignment, CodePool, CodeTable, IdentifierAllocator, ShortCode, CALCULATED_PREFIX,
    POOL_CAPACITY,
};
pub use crate::export::{tooltip, GraphEdge, GraphExporter, GraphNode, LineageGraph, NodeGroup};
pub use crate::field::{is_bracketed, strip_brackets, Field, FieldCategory, UNKNOWN_DATATYPE};
pub use crate::graph::{
    clean_label, DependencyEdge, DependencyGraph, DependencyGraphBuilder, LineageNode,
};
pub use crate::options::{
    LineageOptions, MatchMode, OperatingMode, DEFAULT_PARAMETERS_DATASOURCE,
};
pub use crate::pipeline::{run, LineageContext, LineageRun, RunStats};
pub use crate::record::{FieldSource, JsonFieldSource, RawDatasource, RawFieldRecord};
pub use crate::resolver::{
    marker_for, normalize_text, reference_segments, FriendlyNames, Marker, MarkerTable,
    ReferenceResolver, ScannedFormula, MARKER_DELIMITER,
};
pub use crate::summary::{SummaryRow, SummaryTable, SUMMARY_COLUMNS};

pub use crate::error::{
    DocumentParseError, FieldExtractionError, LineageError, LineageResult, LineageWarning,
    MissingAttribute, Stage, SubstitutionError,
};

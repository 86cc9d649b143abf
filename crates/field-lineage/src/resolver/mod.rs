mod friendly;
mod marker;
mod segments;

use std::collections::HashSet;

pub use friendly::FriendlyNames;
pub use marker::{marker_for, normalize_text, Marker, MarkerTable, MARKER_DELIMITER};
pub use segments::reference_segments;

use crate::error::LineageWarning;
use crate::field::{is_bracketed, Field};
use crate::options::MatchMode;

/// A calculated field's formula, prepared once for repeated reference tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScannedFormula {
    Normalized(String),
    References(HashSet<String>),
}

#[derive(Clone, Debug)]
pub struct ReferenceResolver {
    mode: MatchMode,
    markers: MarkerTable,
}

impl ReferenceResolver {
    pub fn new<'a>(
        fields: impl IntoIterator<Item = &'a Field>,
        mode: MatchMode,
        warnings: &mut Vec<LineageWarning>,
    ) -> Self {
        Self {
            mode,
            markers: MarkerTable::build(fields, warnings),
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.get(id)
    }

    pub fn scan(&self, formula: &str) -> ScannedFormula {
        match self.mode {
            MatchMode::Substring => ScannedFormula::Normalized(normalize_text(formula)),
            MatchMode::Reference => ScannedFormula::References(reference_segments(formula)),
        }
    }

    /// Whether the field identified by `id` is referenced by `formula`.
    ///
    /// Identifiers unknown to the marker table, or that lost a marker collision, never match.
    pub fn references(&self, id: &str, formula: &ScannedFormula) -> bool {
        let Some(marker) = self.markers.get(id) else {
            return false;
        };
        match formula {
            ScannedFormula::Normalized(text) => marker.occurs_in(text),
            ScannedFormula::References(segments) => {
                if !marker.is_matchable() {
                    return false;
                }
                if is_bracketed(id) {
                    segments.contains(id)
                } else {
                    segments.contains(&format!("[{id}]"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldCategory;

    fn field(id: &str) -> Field {
        Field {
            id: id.to_string(),
            name: id.to_string(),
            datasource_name: "ds".to_string(),
            datasource_caption: "ds".to_string(),
            calculation: None,
            display_calculation: None,
            category: FieldCategory::DefaultField,
            worksheets: Vec::new(),
            datatype: "string".to_string(),
        }
    }

    #[test]
    fn substring_mode_over_matches_inside_string_literals() {
        let fields = vec![field("[Sales]")];
        let mut warnings = Vec::new();
        let resolver = ReferenceResolver::new(&fields, MatchMode::Substring, &mut warnings);
        let scanned = resolver.scan("\"[Sales]\"");
        assert!(resolver.references("[Sales]", &scanned));
    }

    #[test]
    fn reference_mode_ignores_string_literals() {
        let fields = vec![field("[Sales]")];
        let mut warnings = Vec::new();
        let resolver = ReferenceResolver::new(&fields, MatchMode::Reference, &mut warnings);
        assert!(!resolver.references("[Sales]", &resolver.scan("\"[Sales]\"")));
        assert!(resolver.references("[Sales]", &resolver.scan("SUM([Sales])")));
    }

    #[test]
    fn reference_mode_wraps_unbracketed_identifiers() {
        let fields = vec![field("Rate")];
        let mut warnings = Vec::new();
        let resolver = ReferenceResolver::new(&fields, MatchMode::Reference, &mut warnings);
        assert!(resolver.references("Rate", &resolver.scan("[Rate] * 2")));
    }

    #[test]
    fn unknown_identifier_never_matches() {
        let fields = vec![field("[A]")];
        let mut warnings = Vec::new();
        let resolver = ReferenceResolver::new(&fields, MatchMode::Substring, &mut warnings);
        assert!(!resolver.references("[B]", &resolver.scan("[B]")));
    }
}

//! Marker form of identifiers and formula text.
//!
//! Normalization is character-wise:
//! - `[` and `]` become the delimiter `__`
//! - a literal `_` becomes `_.`, so identifier content can never spell a delimiter
//! - everything else is kept
//!
//! A bracketed identifier's marker is its normalized text (`[Sales]` -> `__Sales__`). An
//! unbracketed identifier is wrapped in the delimiter (`Sales` -> `__Sales__`), which lets it
//! match bracketed references in formulas.

use std::collections::HashMap;

use crate::error::LineageWarning;
use crate::field::{is_bracketed, Field};

pub const MARKER_DELIMITER: &str = "__";

/// Normalizes formula (or identifier) text into marker form.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '[' | ']' => out.push_str(MARKER_DELIMITER),
            '_' => out.push_str("_."),
            c => out.push(c),
        }
    }
    out
}

/// Natural marker of an identifier, before collision handling.
pub fn marker_for(id: &str) -> String {
    if is_bracketed(id) {
        normalize_text(id)
    } else {
        format!("{MARKER_DELIMITER}{}{MARKER_DELIMITER}", normalize_text(id))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Marker {
    text: String,
    matchable: bool,
}

impl Marker {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `false` for identifiers that lost a marker collision. Their text contains `[`, which
    /// normalized formula text never does, so they cannot occur in any formula.
    pub fn is_matchable(&self) -> bool {
        self.matchable
    }

    pub fn occurs_in(&self, normalized_formula: &str) -> bool {
        self.matchable && normalized_formula.contains(self.text.as_str())
    }
}

/// Injective identifier -> marker assignment over one catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerTable {
    by_id: HashMap<String, Marker>,
}

impl MarkerTable {
    /// Assigns markers to every distinct identifier of `fields`.
    ///
    /// Identifiers used on some worksheet claim their marker before unused ones. Within each
    /// group bracketed identifiers go first, then catalog order. An identifier whose marker is
    /// already owned gets an unmatchable one and a [`LineageWarning::MarkerCollision`].
    pub fn build<'a>(
        fields: impl IntoIterator<Item = &'a Field>,
        warnings: &mut Vec<LineageWarning>,
    ) -> Self {
        let mut ids: Vec<(&str, bool)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for field in fields {
            let id = field.id.as_str();
            match positions.get(id) {
                Some(&pos) => ids[pos].1 |= field.is_used(),
                None => {
                    positions.insert(id, ids.len());
                    ids.push((id, field.is_used()));
                }
            }
        }

        let mut by_id: HashMap<String, Marker> = HashMap::with_capacity(ids.len());
        let mut owners: HashMap<String, &str> = HashMap::with_capacity(ids.len());
        let mut claim_order: Vec<(usize, &str)> =
            ids.iter().enumerate().map(|(idx, &(id, _))| (idx, id)).collect();
        claim_order.sort_by_key(|&(idx, id)| (!ids[idx].1, !is_bracketed(id), idx));

        for (idx, id) in claim_order {
            let text = marker_for(id);
            let marker = match owners.get(&text) {
                None => {
                    owners.insert(text.clone(), id);
                    Marker {
                        text,
                        matchable: true,
                    }
                }
                Some(owner) => {
                    let warning = LineageWarning::MarkerCollision {
                        field_id: id.to_string(),
                        owner_id: owner.to_string(),
                        marker: text.clone(),
                    };
                    log::warn!("{warning}");
                    warnings.push(warning);
                    Marker {
                        text: format!("[!{idx}]{text}"),
                        matchable: false,
                    }
                }
            };
            by_id.insert(id.to_string(), marker);
        }

        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

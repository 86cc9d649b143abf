use std::collections::HashMap;

use crate::error::SubstitutionError;
use crate::field::strip_brackets;
use crate::record::RawDatasource;

/// Ordered mapping from bracket-stripped identifiers to field names. Feeds the summary table
/// only; the lineage graph is built from raw formula text.
///
/// Insertion order is the replacement order. Re-inserting a key keeps its original position
/// and overwrites the name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FriendlyNames {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl FriendlyNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every calculated record (from every data source, duplicates included).
    pub fn from_datasources(datasources: &[RawDatasource]) -> Self {
        let mut names = Self::new();
        for ds in datasources {
            for record in &ds.fields {
                let (Some(id), Some(name), Some(_)) = (
                    record.id.as_deref(),
                    record.name.as_deref(),
                    record.calculation.as_deref(),
                ) else {
                    continue;
                };
                names.insert(id, name);
            }
        }
        names
    }

    pub fn insert(&mut self, id: &str, name: &str) {
        let key = strip_brackets(id);
        if key.is_empty() {
            return;
        }
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = name.to_string(),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, name.to_string()));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Rewrites `formula` by replacing each key with its name, one key at a time in insertion
    /// order. Earlier replacements are visible to later keys.
    pub fn substitute(&self, formula: &str) -> Result<String, SubstitutionError> {
        if let Some(offset) = formula.find(['\u{FFFD}', '\0']) {
            return Err(SubstitutionError::UndecodableText { offset });
        }
        let mut out = formula.to_string();
        for (key, name) in self.iter() {
            if out.contains(key) {
                out = out.replace(key, name);
            }
        }
        Ok(out)
    }
}

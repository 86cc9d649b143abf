use std::collections::{HashMap, HashSet};

use unicode_normalization::UnicodeNormalization;

use crate::catalog::FieldCatalog;
use crate::codes::{CodePool, CodeTable, ShortCode};
use crate::field::{strip_brackets, Field};
use crate::resolver::{ReferenceResolver, ScannedFormula};

/// `from` is referenced inside the formula of `to`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: ShortCode,
    pub to: ShortCode,
}

impl DependencyEdge {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// A used field placed in the graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineageNode {
    pub code: ShortCode,
    pub field_index: usize,
    /// Cleaned display name, unique within the node's pool.
    pub label: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<DependencyEdge>,
}

#[derive(Clone, Copy, Debug)]
pub struct DependencyGraphBuilder<'a> {
    catalog: &'a FieldCatalog,
    codes: &'a CodeTable,
    resolver: &'a ReferenceResolver,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(
        catalog: &'a FieldCatalog,
        codes: &'a CodeTable,
        resolver: &'a ReferenceResolver,
    ) -> Self {
        Self {
            catalog,
            codes,
            resolver,
        }
    }

    pub fn build(&self) -> DependencyGraph {
        let nodes = self.nodes();
        let edges = self.edges();
        log::debug!("graph: {} nodes, {} edges", nodes.len(), edges.len());
        DependencyGraph { nodes, edges }
    }

    /// Nodes in code order: default pool first, then calculated, each in catalog order.
    pub fn nodes(&self) -> Vec<LineageNode> {
        let fields = self.catalog.fields();
        let mut nodes = Vec::with_capacity(self.codes.len());
        for pool in [CodePool::Default, CodePool::Calculated] {
            let mut labels = LabelSet::default();
            for assignment in self.codes.pool(pool) {
                let field = &fields[assignment.field_index];
                let mut base = clean_label(&field.name);
                if base.is_empty() {
                    base = assignment.code.to_string();
                }
                nodes.push(LineageNode {
                    code: assignment.code.clone(),
                    field_index: assignment.field_index,
                    label: labels.claim(base),
                });
            }
        }
        nodes
    }

    /// Every field in node order is tested against every used calculated field with a
    /// non-blank formula, in catalog order. Each ordered pair is visited once.
    pub fn edges(&self) -> Vec<DependencyEdge> {
        let fields = self.catalog.fields();
        let targets: Vec<(&ShortCode, ScannedFormula)> = self
            .codes
            .pool(CodePool::Calculated)
            .iter()
            .filter_map(|assignment| {
                let formula = fields[assignment.field_index].scannable_calculation()?;
                Some((&assignment.code, self.resolver.scan(formula)))
            })
            .collect();

        let mut edges = Vec::new();
        for assignment in self.codes.iter() {
            let source: &Field = &fields[assignment.field_index];
            for (target, formula) in &targets {
                if self.resolver.references(&source.id, formula) {
                    edges.push(DependencyEdge {
                        from: assignment.code.clone(),
                        to: (*target).clone(),
                    });
                }
            }
        }
        edges
    }
}

/// Display form of a field name: brackets removed, NFC normalized, only alphanumerics, `.`
/// and `_` kept, each whitespace character replaced by `_`.
pub fn clean_label(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in strip_brackets(name).nfc() {
        if ch.is_whitespace() {
            out.push('_');
        } else if ch.is_alphanumeric() || ch == '.' || ch == '_' {
            out.push(ch);
        }
    }
    out
}

/// Hands out unique labels: the first claim of a name gets it bare, later ones `Name1`,
/// `Name2`, ... skipping suffixes already taken.
#[derive(Debug, Default)]
struct LabelSet {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl LabelSet {
    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = self.next_suffix.get(&base).copied().unwrap_or(1);
        loop {
            let candidate = format!("{base}{n}");
            n += 1;
            if self.taken.insert(candidate.clone()) {
                self.next_suffix.insert(base, n);
                return candidate;
            }
        }
    }
}

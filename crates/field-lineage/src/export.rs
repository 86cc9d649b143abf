use std::collections::HashSet;

use serde::Serialize;

use crate::catalog::FieldCatalog;
use crate::codes::{CodePool, ShortCode};
use crate::error::{LineageError, LineageResult};
use crate::field::{Field, FieldCategory};
use crate::graph::DependencyGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeGroup {
    Default,
    Calculated,
}

impl From<CodePool> for NodeGroup {
    fn from(pool: CodePool) -> Self {
        match pool {
            CodePool::Default => NodeGroup::Default,
            CodePool::Calculated => NodeGroup::Calculated,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: ShortCode,
    pub label: String,
    pub group: NodeGroup,
    /// Tooltip text.
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: ShortCode,
    pub to: ShortCode,
    pub arrows: &'static str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LineageGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl LineageGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct GraphExporter;

impl GraphExporter {
    pub fn new() -> Self {
        Self
    }

    /// Builds the renderer document. Fails with [`LineageError::DanglingEdge`] if an edge names
    /// a code that has no node.
    pub fn export(
        &self,
        catalog: &FieldCatalog,
        graph: &DependencyGraph,
    ) -> LineageResult<LineageGraph> {
        let fields = catalog.fields();
        let nodes: Vec<GraphNode> = graph
            .nodes
            .iter()
            .map(|node| GraphNode {
                id: node.code.clone(),
                label: node.label.clone(),
                group: node.code.pool().into(),
                title: tooltip(&fields[node.field_index]),
            })
            .collect();

        let known: HashSet<&ShortCode> = nodes.iter().map(|n| &n.id).collect();
        let mut edges = Vec::with_capacity(graph.edges.len());
        for edge in &graph.edges {
            if !known.contains(&edge.from) || !known.contains(&edge.to) {
                return Err(LineageError::DanglingEdge {
                    from: edge.from.to_string(),
                    to: edge.to.to_string(),
                });
            }
            edges.push(GraphEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                arrows: "to",
            });
        }

        Ok(LineageGraph { nodes, edges })
    }
}

/// Tooltip of a node. Calculated fields show their formula as written, before any name
/// substitution.
pub fn tooltip(field: &Field) -> String {
    match field.category {
        FieldCategory::DefaultField => format!("Default Field: {}", field.name),
        FieldCategory::Parameter => format!("Parameter: {}", field.name),
        FieldCategory::CalculatedField => format!(
            "{}\n\nFormula:\n{}",
            field.name,
            field.calculation.as_deref().unwrap_or_default()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::IdentifierAllocator;
    use crate::graph::{DependencyEdge, DependencyGraphBuilder};
    use crate::options::{LineageOptions, MatchMode};
    use crate::record::{RawDatasource, RawFieldRecord};
    use crate::resolver::ReferenceResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn catalog_and_graph(ds: RawDatasource) -> (FieldCatalog, DependencyGraph) {
        let mut warnings = Vec::new();
        let catalog = FieldCatalog::build(&[ds], &LineageOptions::default(), &mut warnings).unwrap();
        let codes = IdentifierAllocator::new().allocate(&catalog).unwrap();
        let resolver = ReferenceResolver::new(&catalog, MatchMode::Substring, &mut warnings);
        let graph = DependencyGraphBuilder::new(&catalog, &codes, &resolver).build();
        (catalog, graph)
    }

    #[test]
    fn serializes_renderer_document() {
        let ds = RawDatasource::new("Orders")
            .with_field(RawFieldRecord::new("[Sales]", "Sales").used_in(["Sheet1"]))
            .with_field(
                RawFieldRecord::new("[Calculation_1]", "Double Sales")
                    .with_calculation("[Sales] * 2")
                    .used_in(["Sheet1"]),
            );
        let (catalog, graph) = catalog_and_graph(ds);
        let doc = GraphExporter::new().export(&catalog, &graph).unwrap();
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "nodes": [
                    {"id": "AA", "label": "Sales", "group": "default", "title": "Default Field: Sales"},
                    {
                        "id": "x___AA",
                        "label": "Double_Sales",
                        "group": "calculated",
                        "title": "Double Sales\n\nFormula:\n[Sales] * 2"
                    }
                ],
                "edges": [{"from": "AA", "to": "x___AA", "arrows": "to"}]
            })
        );
    }

    #[test]
    fn parameter_tooltip() {
        let ds = RawDatasource::new("Parameters").with_field(
            RawFieldRecord::new("[Parameter 1]", "Region")
                .with_calculation("\"East\"")
                .used_in(["Sheet1"]),
        );
        let (catalog, graph) = catalog_and_graph(ds);
        let doc = GraphExporter::new().export(&catalog, &graph).unwrap();
        assert_eq!(doc.nodes[0].group, NodeGroup::Default);
        assert_eq!(doc.nodes[0].title, "Parameter: Region");
    }

    #[test]
    fn dangling_edge_is_an_export_error() {
        let ds = RawDatasource::new("Orders")
            .with_field(RawFieldRecord::new("[Sales]", "Sales").used_in(["Sheet1"]));
        let (catalog, mut graph) = catalog_and_graph(ds);
        let missing = ShortCode::nth(CodePool::Calculated, 5).unwrap();
        graph.edges.push(DependencyEdge {
            from: graph.nodes[0].code.clone(),
            to: missing,
        });
        let err = GraphExporter::new().export(&catalog, &graph).unwrap_err();
        assert_eq!(err.stage(), crate::Stage::Export);
        assert!(err.to_string().contains("x___AF"), "{err}");
    }
}

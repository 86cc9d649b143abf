use crate::catalog::FieldCatalog;
use crate::codes::{CodePool, IdentifierAllocator};
use crate::error::{LineageResult, LineageWarning};
use crate::export::{GraphExporter, LineageGraph};
use crate::graph::DependencyGraphBuilder;
use crate::options::LineageOptions;
use crate::record::FieldSource;
use crate::resolver::ReferenceResolver;
use crate::summary::SummaryTable;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub datasources: usize,
    pub records: usize,
    pub fields: usize,
    pub default_nodes: usize,
    pub calculated_nodes: usize,
    pub edges: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineageRun {
    pub summary: SummaryTable,
    pub graph: LineageGraph,
    pub warnings: Vec<LineageWarning>,
    pub stats: RunStats,
}

/// Options and recorded warnings of a run. Holds no state between runs besides the options.
#[derive(Clone, Debug, Default)]
pub struct LineageContext {
    options: LineageOptions,
    warnings: Vec<LineageWarning>,
}

impl LineageContext {
    pub fn new(options: LineageOptions) -> Self {
        Self {
            options,
            warnings: Vec::new(),
        }
    }

    pub fn options(&self) -> &LineageOptions {
        &self.options
    }

    /// Warnings recorded by the latest run. After a successful run they have been moved into
    /// [`LineageRun::warnings`]; after a failed one they stay here.
    pub fn warnings(&self) -> &[LineageWarning] {
        &self.warnings
    }

    pub fn run(&mut self, source: &dyn FieldSource) -> LineageResult<LineageRun> {
        self.warnings.clear();

        let datasources = source.datasources()?;
        let records: usize = datasources.iter().map(|ds| ds.fields.len()).sum();
        log::debug!(
            "parse: {} data sources, {} field records",
            datasources.len(),
            records
        );

        let catalog = FieldCatalog::build(&datasources, &self.options, &mut self.warnings)?;
        let resolver =
            ReferenceResolver::new(&catalog, self.options.match_mode, &mut self.warnings);
        let codes = IdentifierAllocator::new().allocate(&catalog)?;
        let graph = DependencyGraphBuilder::new(&catalog, &codes, &resolver).build();
        let graph = GraphExporter::new().export(&catalog, &graph)?;
        let summary = SummaryTable::build(&catalog);

        let stats = RunStats {
            datasources: datasources.len(),
            records,
            fields: catalog.len(),
            default_nodes: codes.pool(CodePool::Default).len(),
            calculated_nodes: codes.pool(CodePool::Calculated).len(),
            edges: graph.edges.len(),
        };
        log::info!(
            "lineage: {} fields, {} nodes ({} calculated), {} edges, {} warnings",
            stats.fields,
            stats.default_nodes + stats.calculated_nodes,
            stats.calculated_nodes,
            stats.edges,
            self.warnings.len()
        );

        Ok(LineageRun {
            summary,
            graph,
            warnings: std::mem::take(&mut self.warnings),
            stats,
        })
    }
}

/// Runs the pipeline once with `options`.
pub fn run(source: &dyn FieldSource, options: &LineageOptions) -> LineageResult<LineageRun> {
    LineageContext::new(options.clone()).run(source)
}

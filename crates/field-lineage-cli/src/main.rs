use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use field_lineage::{
    JsonFieldSource, LineageContext, LineageGraph, LineageOptions, MatchMode, OperatingMode,
    SummaryTable, SUMMARY_COLUMNS,
};
use tracing_subscriber::EnvFilter;

/// Output file names are derived from at most this many characters of the base name.
const MAX_BASE_NAME_CHARS: usize = 30;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Batch,
    Interactive,
}

impl From<ModeArg> for OperatingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Batch => OperatingMode::Batch,
            ModeArg::Interactive => OperatingMode::Interactive,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MatchModeArg {
    Substring,
    Reference,
}

impl From<MatchModeArg> for MatchMode {
    fn from(mode: MatchModeArg) -> Self {
        match mode {
            MatchModeArg::Substring => MatchMode::Substring,
            MatchModeArg::Reference => MatchMode::Reference,
        }
    }
}

#[derive(Parser)]
#[command(about = "Write the field summary table and calculated-field lineage graph of a workbook field export.")]
struct Args {
    /// Field document (JSON) produced by a workbook document-model provider.
    input: PathBuf,

    /// Directory the output files are written to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Base name of the output files (default: the input file stem).
    #[arg(long, value_name = "BASE")]
    name: Option<String>,

    /// How malformed field records are handled. Overrides the config file.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// How formula references are detected. Overrides the config file.
    #[arg(long, value_enum)]
    match_mode: Option<MatchModeArg>,

    /// Data source whose fields are parameters. Overrides the config file.
    #[arg(long, value_name = "NAME")]
    parameters_datasource: Option<String>,

    /// JSON options file (`mode`, `match_mode`, `parameters_datasource`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not write the summary table.
    #[arg(long)]
    no_summary: bool,

    /// Do not write the lineage graph.
    #[arg(long, conflicts_with = "stdout")]
    no_graph: bool,

    /// Print the lineage graph document to stdout instead of writing it to a file.
    #[arg(long)]
    stdout: bool,

    /// Log at debug level (`RUST_LOG` takes precedence).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(args)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let options = load_options(&args)?;
    let source = JsonFieldSource::open(&args.input)
        .with_context(|| format!("read field document {}", args.input.display()))?;

    let mut ctx = LineageContext::new(options);
    let lineage = match ctx.run(&source) {
        Ok(lineage) => lineage,
        Err(err) => {
            if !ctx.warnings().is_empty() {
                log::warn!("{} warnings recorded before the failure", ctx.warnings().len());
            }
            return Err(anyhow::Error::new(err)
                .context(format!("build lineage for {}", args.input.display())));
        }
    };

    let base = match &args.name {
        Some(name) => name.clone(),
        None => default_base_name(&args.input),
    };

    if !args.no_summary || (!args.no_graph && !args.stdout) {
        std::fs::create_dir_all(&args.out_dir)
            .with_context(|| format!("create output directory {}", args.out_dir.display()))?;
    }

    if !args.no_summary {
        let path = args.out_dir.join(format!("{base}_Calculations_table.csv"));
        write_summary(&lineage.summary, &path)?;
        log::info!("wrote {} summary rows to {}", lineage.summary.len(), path.display());
    }

    if args.stdout {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &lineage.graph)?;
        handle.write_all(b"\n")?;
    } else if !args.no_graph {
        let path = args.out_dir.join(format!("{base}_lineage_graph.json"));
        write_graph(&lineage.graph, &path)?;
        log::info!(
            "wrote {} nodes and {} edges to {}",
            lineage.graph.nodes.len(),
            lineage.graph.edges.len(),
            path.display()
        );
    }

    Ok(())
}

fn load_options(args: &Args) -> Result<LineageOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read config file {}", path.display()))?;
            LineageOptions::from_json(&text)
                .with_context(|| format!("parse config file {}", path.display()))?
        }
        None => LineageOptions::default(),
    };
    if let Some(mode) = args.mode {
        options.mode = mode.into();
    }
    if let Some(match_mode) = args.match_mode {
        options.match_mode = match_mode.into();
    }
    if let Some(name) = &args.parameters_datasource {
        options.parameters_datasource = name.clone();
    }
    Ok(options)
}

fn default_base_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    stem.chars().take(MAX_BASE_NAME_CHARS).collect()
}

fn write_summary(table: &SummaryTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create summary table {}", path.display()))?;
    if table.is_empty() {
        writer.write_record(SUMMARY_COLUMNS)?;
    }
    for row in table.rows() {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("write summary table {}", path.display()))?;
    Ok(())
}

fn write_graph(graph: &LineageGraph, path: &Path) -> Result<()> {
    let json = graph.to_json_pretty()?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("write lineage graph {}", path.display()))?;
    Ok(())
}

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use netgraph::common;
use netgraph::execution::{self, InputFiles, RenderOptions};
use netgraph::export::ExportFormat;
use netgraph::mapping::ColumnMapping;

#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    #[clap(short, long, global = true)]
    log_level: Option<String>,
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct Input {
    /// Edge table (JSON array, JSON {nodes, edges} document or CSV)
    #[clap(short, long)]
    edges: PathBuf,
    /// Separate node table
    #[clap(short, long)]
    nodes: Option<PathBuf>,
    /// Column mapping YAML
    #[clap(short, long)]
    mapping: PathBuf,
    /// Proceed with datasets over the size warning threshold
    #[clap(long)]
    force: bool,
}

impl Input {
    fn files(&self) -> InputFiles {
        InputFiles {
            edges: self.edges.clone(),
            nodes: self.nodes.clone(),
            mapping: self.mapping.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    Init {
        #[clap(short, long)]
        mapping: PathBuf,
    },
    Render {
        #[clap(flatten)]
        input: Input,
        /// Anchor entity for the k-hop filter
        #[clap(long)]
        entity: Option<String>,
        #[clap(short, long, default_value = "1")]
        degree: u8,
        #[clap(long)]
        from: Option<String>,
        #[clap(long)]
        to: Option<String>,
        /// Node ids to expand after filtering, in order
        #[clap(long)]
        expand: Vec<String>,
        /// Defaults to the output file extension, then JSON
        #[clap(short, long, value_enum)]
        format: Option<ExportFormat>,
        /// Output file, `-` for stdout
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
    Degrees {
        #[clap(flatten)]
        input: Input,
    },
    Timeline {
        #[clap(flatten)]
        input: Input,
        #[clap(long)]
        from: Option<String>,
        #[clap(long)]
        to: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    setup_logging(&args.log_level);

    match args.command {
        Commands::Init { mapping } => {
            info!("Initializing mapping: {}", mapping.display());
            let default_mapping = ColumnMapping::new("source", "target");
            common::write_string_to_file(&mapping, &default_mapping.to_yaml()?)?;
        }
        Commands::Render {
            input,
            entity,
            degree,
            from,
            to,
            expand,
            format,
            output,
        } => {
            info!("Rendering {}", input.edges.display());
            let date_range = execution::parse_date_range(from.as_deref(), to.as_deref())?;
            let options = RenderOptions {
                input: input.files(),
                filters: execution::build_filters(entity.as_deref(), degree, date_range),
                expand,
                format: execution::resolve_format(format, output.as_deref())?,
                force: input.force,
            };
            let rendered = execution::execute_render(&options)?;
            execution::write_output(output.as_deref(), &rendered)?;
        }
        Commands::Degrees { input } => {
            let degrees = execution::execute_degrees(&input.files(), input.force)?;
            execution::write_output(None, &degrees)?;
        }
        Commands::Timeline { input, from, to } => {
            let date_range = execution::parse_date_range(from.as_deref(), to.as_deref())?;
            let bins = execution::execute_timeline(&input.files(), date_range, input.force)?;
            execution::write_output(None, &bins)?;
        }
    }

    Ok(())
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("handlebars=off,{}", log_level)))
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

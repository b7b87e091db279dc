use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "sector-progress",
    version,
    about = "Status breakdowns and indicator details from sector progress spreadsheets"
)]
pub struct Cli {
    /// Sector registry (TOML). Defaults to the built-in sector list.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory that relative sector file paths are resolved against.
    #[arg(long, global = true, env = "SECTOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configured sectors.
    Sectors,
    /// Metric counts and status breakdowns for one sector.
    Summary(SummaryArgs),
    /// Formatted details for one indicator.
    Detail(DetailArgs),
    /// Write the status table (CSV) and summary (JSON) for one sector.
    Export(ExportArgs),
    /// Menu-driven selection over one sector.
    Interactive(InteractiveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SummaryArgs {
    pub sector: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DetailArgs {
    pub sector: String,

    #[arg(long)]
    pub group: String,

    #[arg(long)]
    pub subgroup: Option<String>,

    #[arg(long)]
    pub item: Option<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    pub sector: String,

    #[arg(long, default_value = "reports")]
    pub out_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct InteractiveArgs {
    pub sector: String,
}

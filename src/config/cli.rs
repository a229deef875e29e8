use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "recruit-weekly")]
#[command(about = "Weekly recruitment reports from spreadsheets and wiki databases")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Config file of the selected subcommand, if it takes one.
    pub fn config_path(&self) -> Option<&str> {
        match &self.command {
            Command::Sync(args) => Some(&args.config.config),
            Command::Report(args) => Some(&args.config.config),
            Command::Annotate(args) => Some(&args.config.config),
            Command::Export(args) => Some(&args.config.config),
            Command::Weeks(_) => None,
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Pull applicants from every source and upsert weekly reports
    Sync(SyncArgs),
    /// Print the Saturday-Friday weeks of a month
    Weeks(WeeksArgs),
    /// Show stored weekly reports
    Report(ReportArgs),
    /// Attach a note to a stored weekly report
    Annotate(AnnotateArgs),
    /// Write stored weekly reports to a CSV file
    Export(ExportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ConfigArg {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "recruit-weekly.toml")]
    pub config: String,
}

#[derive(Debug, Clone, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Override the configured window year
    #[arg(long)]
    pub year: Option<i32>,

    /// Override the configured window months
    #[arg(long, value_delimiter = ',')]
    pub month: Vec<u32>,

    /// Aggregate without writing to the store
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct WeeksArgs {
    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: u32,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: Option<u32>,

    #[arg(long, value_delimiter = ',')]
    pub week: Vec<u32>,

    /// Restrict counts to one job category
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Report id, e.g. 2025-08-W02
    #[arg(long)]
    pub id: String,

    #[arg(long)]
    pub author: String,

    #[arg(long)]
    pub text: String,
}

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    #[arg(long)]
    pub year: i32,

    #[arg(long)]
    pub month: Option<u32>,

    #[arg(long, default_value = "weekly-report.csv")]
    pub out: String,
}

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "cmerge")]
#[command(
    about = "Collect, rename and reorder text/code files, then merge them into one output file"
)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress progress spinners and non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without contacting the backend
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Enable debug logging (CMERGE_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check which files would be accepted for merging
    Check(CheckArgs),

    /// Upload files and merge them into one output file
    Merge(MergeArgs),

    /// Interactive session: add, rename, reorder, preview and merge
    Session(SessionArgs),

    /// Initialize a cmerge.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Files to check
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Layout width in pixels used to pick the name budget
    #[arg(long, default_value = "1280")]
    pub width: u32,
}

#[derive(Debug, Parser)]
pub struct MergeArgs {
    /// Files to merge, in order
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output filename (defaults to output.default_filename from config)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Rename a file in the merged output (format: original=new)
    #[arg(long, value_name = "ORIGINAL=NEW")]
    pub rename: Vec<String>,

    /// Merge order as 1-based positions of FILES (e.g. 3,1,2)
    #[arg(long, value_delimiter = ',')]
    pub order: Vec<usize>,

    /// Directory to write the merged file into
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Debug, Parser)]
pub struct SessionArgs {
    /// Files to add when the session starts
    pub files: Vec<String>,

    /// Directory to write merged files into
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Layout width in pixels used to pick the name budget
    #[arg(long, default_value = "1280")]
    pub width: u32,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Debug, Clone, Args)]
pub struct BackendArgs {
    /// Merge backend base URL (overrides backend.base_url)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Request timeout in seconds (overrides backend.timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,

    /// Output directory for the completion file
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Write the completion script to stdout
    #[arg(long)]
    pub stdout: bool,
}

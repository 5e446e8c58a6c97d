use anyhow::Result;
use clap::Parser;
use code_merger::cli::{AppContext, Cli, Commands};
use code_merger::cli_ext::{check_cmd, merge_cmd, session_cmd};

fn main() -> Result<()> {
    let cli = Cli::parse();

    code_merger::infra::logging::init(cli.verbose, cli.no_color);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Check(args) => check_cmd::run(args, &ctx),
        Commands::Merge(args) => merge_cmd::run(args, &ctx),
        Commands::Session(args) => session_cmd::run(args, &ctx),
        Commands::Init(args) => code_merger::infra::config::init(args, &ctx),
        Commands::Completions(args) => code_merger::completion::run(args, &ctx),
    }
}

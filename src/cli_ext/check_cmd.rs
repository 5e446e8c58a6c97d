//! `cmerge check`: run the validator over local files.

use anyhow::Result;
use owo_colors::OwoColorize;
use tabled::{Table, Tabled};

use crate::cli::{AppContext, CheckArgs};
use crate::core::display::{LayoutTier, format_file_size, truncate};
use crate::core::validate::Validator;
use crate::infra::config::load_config;
use crate::infra::io::candidates_from_paths;

#[derive(Tabled)]
struct CheckRow {
    file: String,
    size: String,
    verdict: String,
}

pub fn run(args: CheckArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config().unwrap_or_default();
    let validator = Validator::new(&config.limits());
    let budget = LayoutTier::from_width(args.width).budget();

    let candidates = candidates_from_paths(&args.files)?;
    let mut accepted = 0usize;
    let rows: Vec<CheckRow> = candidates
        .iter()
        .map(|c| {
            let verdict = match validator.check(c) {
                Ok(()) => {
                    accepted += 1;
                    "ok".to_string()
                }
                Err(reason) => reason.to_string(),
            };
            CheckRow {
                file: truncate(&c.name, budget),
                size: format_file_size(c.size_bytes),
                verdict,
            }
        })
        .collect();

    if !ctx.quiet {
        println!("{}", Table::new(rows));
        let summary = format!("{accepted}/{} files accepted", candidates.len());
        if ctx.no_color {
            println!("{summary}");
        } else if accepted == candidates.len() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.yellow());
        }
    }

    if accepted == 0 {
        anyhow::bail!("No acceptable files to merge");
    }
    Ok(())
}

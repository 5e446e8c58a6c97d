//! `cmerge merge`: one-shot upload, rename, reorder and merge.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::warn;

use crate::cli::{AppContext, MergeArgs};
use crate::cli_ext::shared::{connect, output_path, print_rejections, spinner, write_output};
use crate::core::collection::FileId;
use crate::core::session::MergeSession;
use crate::infra::client::MergeBackend;
use crate::infra::config::load_config;
use crate::infra::io::candidates_from_paths;

pub fn run(args: MergeArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config().unwrap_or_default();
    let renames = parse_renames(&args.rename)?;
    let candidates = candidates_from_paths(&args.files)?;

    let backend = connect(&args.backend, &config)?;
    let mut session = MergeSession::new(backend, config.limits());

    // Positions of FILES that pass validation, in argument order
    let accepted_positions: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| session.validator().is_acceptable(c))
        .map(|(i, _)| i + 1)
        .collect();

    let report = if ctx.dry_run {
        session.add_local(candidates)?
    } else {
        let pb = spinner(ctx, "Uploading files...");
        let report = session.add_files(candidates);
        pb.finish_and_clear();
        report?
    };
    print_rejections(&report.rejected, ctx);
    if report.added.is_empty() {
        anyhow::bail!("No acceptable files to merge");
    }

    if !args.order.is_empty() {
        let observed = order_from_positions(&args.order, &accepted_positions, &report.added);
        session.reconcile_order(&observed);
    }

    apply_renames(&mut session, &renames, ctx)?;

    let output_name = args
        .output
        .clone()
        .unwrap_or_else(|| config.output.default_filename.clone());

    if ctx.dry_run {
        let request = session.merge_request(Some(&output_name))?;
        let json =
            serde_json::to_string_pretty(&request).context("Failed to serialize merge request")?;
        println!("{json}");
        return Ok(());
    }

    let pb = spinner(ctx, "Merging...");
    let merged = session.merge(Some(&output_name));
    pb.finish_and_clear();
    let merged = merged?;

    let path = output_path(args.dest.as_deref(), &config, &merged.request.output_filename);
    write_output(&path, &merged.bytes)?;

    if !ctx.quiet {
        let line = format!(
            "Merged {} files into {} ({} bytes)",
            merged.request.file_ids.len(),
            path.display(),
            merged.bytes.len()
        );
        if ctx.no_color {
            println!("{line}");
        } else {
            println!("{}", line.green());
        }
    }
    Ok(())
}

/// `ORIGINAL=NEW` pairs.
pub fn parse_renames(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| -> Result<(String, String)> {
            let (original, new) = pair
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("invalid rename '{pair}', expected ORIGINAL=NEW"))?;
            let (original, new) = (original.trim(), new.trim());
            if original.is_empty() || new.is_empty() {
                anyhow::bail!("invalid rename '{pair}', both names are required");
            }
            Ok((original.to_string(), new.to_string()))
        })
        .collect()
}

/// Map 1-based FILES positions to tracked ids. Positions of rejected or
/// missing files are skipped; reconciliation keeps the rest in place.
pub fn order_from_positions(
    positions: &[usize],
    accepted_positions: &[usize],
    added: &[FileId],
) -> Vec<FileId> {
    positions
        .iter()
        .filter_map(|pos| {
            let slot = accepted_positions.iter().position(|p| p == pos);
            if slot.is_none() {
                warn!(position = pos, "order position does not name an accepted file");
            }
            slot.and_then(|k| added.get(k).cloned())
        })
        .collect()
}

fn apply_renames<B: MergeBackend>(
    session: &mut MergeSession<B>,
    renames: &[(String, String)],
    ctx: &AppContext,
) -> Result<()> {
    for (original, new) in renames {
        let targets: Vec<FileId> = session
            .collection()
            .iter()
            .filter(|r| r.original_name() == original)
            .map(|r| r.id().to_string())
            .collect();

        if targets.is_empty() {
            warn!(%original, "rename target is not tracked");
            continue;
        }

        for id in targets {
            let outcome = session.rename(&id, new)?;
            if outcome.extension_restored && !ctx.quiet {
                eprintln!(
                    "{original}: extension cannot change, using {}",
                    outcome.display_name
                );
            }
        }
    }
    Ok(())
}

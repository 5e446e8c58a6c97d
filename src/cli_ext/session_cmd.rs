//! `cmerge session`: a line-oriented front end over a merge session.
//!
//! Each input line is one command. Files are referred to by their 1-based
//! position in the current order or by id. Changes are printed from the
//! collection's event channel, never from the command that caused them.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;

use anyhow::Result;
use itertools::Itertools;
use tabled::{Table, Tabled};
use tracing::debug;

use crate::cli::{AppContext, SessionArgs};
use crate::cli_ext::shared::{connect, output_path, print_rejections, write_output};
use crate::core::collection::{CollectionEvent, FileId};
use crate::core::display::{LayoutTier, format_file_size, truncate};
use crate::core::error::CoreError;
use crate::core::session::MergeSession;
use crate::infra::client::MergeBackend;
use crate::infra::config::{Config, load_config};
use crate::infra::io::candidates_from_paths;

const HELP: &str = "\
commands:
  add <path>...            add files
  list                     show tracked files in merge order
  rename <file> <name>     rename (extension is kept)
  revert <file>            restore the original name
  remove <file>            stop tracking a file
  order <file>...          set the merge order (unlisted files go last)
  preview <file>           show the start of a file
  merge [name]             merge into one output file
  help                     this text
  quit                     leave the session
<file> is a position from `list` or a file id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "#")]
    position: usize,
    id: String,
    name: String,
    original: String,
    size: String,
}

pub struct Repl<B> {
    session: MergeSession<B>,
    events: Receiver<CollectionEvent>,
    tier: LayoutTier,
    dest: Option<PathBuf>,
    config: Config,
    ctx: AppContext,
}

impl<B: MergeBackend> Repl<B> {
    pub fn new(
        mut session: MergeSession<B>,
        tier: LayoutTier,
        dest: Option<PathBuf>,
        config: Config,
        ctx: AppContext,
    ) -> Self {
        let events = session.subscribe();
        Self {
            session,
            events,
            tier,
            dest,
            config,
            ctx,
        }
    }

    pub fn session(&self) -> &MergeSession<B> {
        &self.session
    }

    /// Read commands until `quit` or end of input.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        for line in input.lines() {
            if self.execute(&line?, out)? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    /// Run one command. Core errors are printed; only output failures
    /// propagate.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(Flow::Continue);
        };
        let rest: Vec<&str> = words.collect();
        debug!(command, args = ?rest, "session command");

        let outcome = match command {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => {
                writeln!(out, "{HELP}")?;
                Ok(())
            }
            "add" => self.add(&rest, out),
            "list" | "ls" => self.list(out),
            "rename" => self.rename(&rest, out),
            "revert" => self.with_file(&rest, |s, id| s.revert(&id)),
            "remove" | "rm" => self.with_file(&rest, |s, id| {
                s.remove(&id);
                Ok(())
            }),
            "order" => self.order(&rest, out),
            "preview" => self.preview(&rest, out),
            "merge" => self.merge(&rest, out),
            other => {
                writeln!(out, "unknown command '{other}', try help")?;
                Ok(())
            }
        };

        if let Err(err) = outcome {
            match err.downcast_ref::<CoreError>() {
                Some(core) => writeln!(out, "error: {core}")?,
                None => writeln!(out, "error: {err:#}")?,
            }
        }
        self.drain_events(out)?;
        Ok(Flow::Continue)
    }

    fn add(&mut self, paths: &[&str], out: &mut impl Write) -> Result<()> {
        if paths.is_empty() {
            writeln!(out, "usage: add <path>...")?;
            return Ok(());
        }
        let owned: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        let candidates = candidates_from_paths(&owned)?;

        let report = if self.ctx.dry_run {
            self.session.add_local(candidates)?
        } else {
            self.session.add_files(candidates)?
        };
        for rejected in &report.rejected {
            writeln!(out, "skipped: {rejected}")?;
        }
        if report.synthesized > 0 {
            writeln!(out, "note: {} file(s) got local placeholder ids", report.synthesized)?;
        }
        Ok(())
    }

    fn list(&self, out: &mut impl Write) -> Result<()> {
        let collection = self.session.collection();
        if collection.is_empty() {
            writeln!(out, "no files")?;
            return Ok(());
        }

        let rows: Vec<ListRow> = collection
            .iter()
            .enumerate()
            .map(|(i, r)| ListRow {
                position: i + 1,
                id: r.id().to_string(),
                name: truncate(r.display_name(), self.tier.budget()),
                original: if r.is_renamed() {
                    truncate(r.original_name(), self.tier.secondary_budget())
                } else {
                    String::new()
                },
                size: format_file_size(r.size_bytes()),
            })
            .collect();
        writeln!(out, "{}", Table::new(rows))?;
        Ok(())
    }

    fn rename(&mut self, args: &[&str], out: &mut impl Write) -> Result<()> {
        let Some((target, name)) = args.split_first() else {
            writeln!(out, "usage: rename <file> <name>")?;
            return Ok(());
        };
        let id = self.resolve(target)?;
        self.session.rename(&id, &name.join(" "))?;
        Ok(())
    }

    fn order(&mut self, args: &[&str], out: &mut impl Write) -> Result<()> {
        let observed: Vec<FileId> = args
            .iter()
            .map(|r| self.resolve(r))
            .collect::<Result<_>>()?;
        if !self.session.reconcile_order(&observed) {
            writeln!(out, "order unchanged")?;
        }
        Ok(())
    }

    fn preview(&mut self, args: &[&str], out: &mut impl Write) -> Result<()> {
        let [target] = args else {
            writeln!(out, "usage: preview <file>")?;
            return Ok(());
        };
        let id = self.resolve(target)?;
        let preview = self.session.preview(&id)?;
        writeln!(out, "{}", preview.text)?;
        writeln!(
            out,
            "[{} of {} characters]",
            preview.total_chars.min(self.config.limits.max_preview_chars),
            preview.total_chars
        )?;
        Ok(())
    }

    fn merge(&mut self, args: &[&str], out: &mut impl Write) -> Result<()> {
        let name = if args.is_empty() {
            self.config.output.default_filename.clone()
        } else {
            args.join(" ")
        };

        if self.ctx.dry_run {
            let request = self.session.merge_request(Some(&name))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&request)?)?;
            return Ok(());
        }

        let merged = self.session.merge(Some(&name))?;
        let path = output_path(self.dest.as_deref(), &self.config, &merged.request.output_filename);
        write_output(&path, &merged.bytes)?;
        writeln!(
            out,
            "merged {} files into {} ({} bytes)",
            merged.request.file_ids.len(),
            path.display(),
            merged.bytes.len()
        )?;
        Ok(())
    }

    fn with_file(
        &mut self,
        args: &[&str],
        op: impl FnOnce(&mut MergeSession<B>, FileId) -> crate::core::error::Result<()>,
    ) -> Result<()> {
        let [target] = args else {
            anyhow::bail!("expected exactly one file");
        };
        let id = self.resolve(target)?;
        op(&mut self.session, id)?;
        Ok(())
    }

    /// A 1-based position in the current order, or an id.
    fn resolve(&self, reference: &str) -> Result<FileId> {
        let collection = self.session.collection();
        if collection.contains(reference) {
            return Ok(reference.to_string());
        }
        reference
            .parse::<usize>()
            .ok()
            .and_then(|pos| pos.checked_sub(1))
            .and_then(|idx| collection.iter().nth(idx))
            .map(|r| r.id().to_string())
            .ok_or_else(|| CoreError::UnknownFile(reference.to_string()).into())
    }

    fn drain_events(&self, out: &mut impl Write) -> Result<()> {
        let collection = self.session.collection();
        for event in self.events.try_iter() {
            let line = match event {
                CollectionEvent::Added { id } => {
                    let name = collection.get(&id).map(|r| r.display_name()).unwrap_or("?");
                    format!("+ {name} [{id}]")
                }
                CollectionEvent::Renamed {
                    id,
                    display_name,
                    extension_restored,
                } => {
                    let note = if extension_restored {
                        " (extension cannot change, original kept)"
                    } else {
                        ""
                    };
                    format!("~ {id} -> {display_name}{note}")
                }
                CollectionEvent::Reverted { id } => {
                    let name = collection.get(&id).map(|r| r.original_name()).unwrap_or("?");
                    format!("~ {id} restored to {name}")
                }
                CollectionEvent::Removed { id } => format!("- {id}"),
                CollectionEvent::Reordered { order } => {
                    let names = order
                        .iter()
                        .filter_map(|id| collection.get(id))
                        .map(|r| r.display_name())
                        .join(", ");
                    format!("order: {names}")
                }
            };
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}

pub fn run(args: SessionArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config().unwrap_or_default();
    let backend = connect(&args.backend, &config)?;
    let session = MergeSession::new(backend, config.limits());
    let mut repl = Repl::new(
        session,
        LayoutTier::from_width(args.width),
        args.dest.clone(),
        config,
        ctx.clone(),
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if !args.files.is_empty() {
        let candidates = candidates_from_paths(&args.files)?;
        let report = if ctx.dry_run {
            repl.session.add_local(candidates)?
        } else {
            repl.session.add_files(candidates)?
        };
        print_rejections(&report.rejected, ctx);
        repl.drain_events(&mut out)?;
    }

    if !ctx.quiet {
        writeln!(out, "type 'help' for commands")?;
    }
    let stdin = std::io::stdin();
    repl.run(stdin.lock(), &mut out)
}

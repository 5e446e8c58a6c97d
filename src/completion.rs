//! `cmerge completions`: shell completion scripts for the `cmerge` binary.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::{Generator, Shell as CompletionShell, generate};
use tracing::debug;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

const BIN_NAME: &str = "cmerge";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

/// Render the completion script for `shell` into `out`.
pub fn write_script(shell: CompletionShell, out: &mut impl Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
}

/// File the script lands in under `dir`, named the way the shell expects.
pub fn script_path(shell: CompletionShell, dir: PathBuf) -> PathBuf {
    dir.join(shell.file_name(BIN_NAME))
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    let shell: CompletionShell = args.shell.into();

    if args.stdout {
        write_script(shell, &mut std::io::stdout().lock());
        return Ok(());
    }

    let Some(dir) = args.out_dir else {
        anyhow::bail!("--out-dir is required unless --stdout is set");
    };
    let path = script_path(shell, dir);

    if ctx.dry_run {
        if !ctx.quiet {
            println!("Would write {shell} completions to {}", path.display());
        }
        return Ok(());
    }

    let mut script = Vec::new();
    write_script(shell, &mut script);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, &script)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), bytes = script.len(), "completion script written");

    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx(dry_run: bool) -> AppContext {
        AppContext {
            quiet: true,
            no_color: true,
            dry_run,
        }
    }

    #[test]
    fn test_script_names_every_subcommand() {
        let mut out = Vec::new();
        write_script(CompletionShell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();
        for sub in ["check", "merge", "session", "init", "completions"] {
            assert!(script.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn test_writes_into_out_dir() -> Result<()> {
        let tmp = TempDir::new()?;
        let dir = tmp.path().join("completions");
        let args = CompletionsArgs {
            shell: Shell::Zsh,
            out_dir: Some(dir.clone()),
            stdout: false,
        };
        run(args, &ctx(false))?;

        let path = script_path(CompletionShell::Zsh, dir);
        assert!(path.ends_with("_cmerge"));
        assert!(std::fs::read_to_string(path)?.contains("cmerge"));
        Ok(())
    }

    #[test]
    fn test_dry_run_writes_nothing() -> Result<()> {
        let tmp = TempDir::new()?;
        let dir = tmp.path().join("completions");
        let args = CompletionsArgs {
            shell: Shell::Fish,
            out_dir: Some(dir.clone()),
            stdout: false,
        };
        run(args, &ctx(true))?;
        assert!(!dir.exists());
        Ok(())
    }

    #[test]
    fn test_out_dir_required_without_stdout() {
        let args = CompletionsArgs {
            shell: Shell::Bash,
            out_dir: None,
            stdout: false,
        };
        assert!(run(args, &ctx(false)).is_err());
    }
}

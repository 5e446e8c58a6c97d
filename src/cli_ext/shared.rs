//! Helpers shared by the command handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use crate::cli::{AppContext, BackendArgs};
use crate::core::error::CoreError;
use crate::infra::client::HttpBackend;
use crate::infra::config::Config;

/// Spinner for a backend round trip; hidden in quiet mode.
pub fn spinner(ctx: &AppContext, message: &str) -> ProgressBar {
    if ctx.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// HTTP backend from config, with command-line overrides applied.
pub fn connect(args: &BackendArgs, config: &Config) -> Result<HttpBackend> {
    let base_url = args
        .server
        .as_deref()
        .unwrap_or(&config.backend.base_url);
    let timeout = args
        .timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.timeout());

    HttpBackend::new(base_url, timeout)
        .with_context(|| format!("Failed to set up backend client for {base_url}"))
}

/// Where a merged file lands: `--dest`, then `output.directory`, then cwd.
/// Only the final component of `output_filename` is used.
pub fn output_path(dest: Option<&Path>, config: &Config, output_filename: &str) -> PathBuf {
    let dir = dest
        .map(Path::to_path_buf)
        .or_else(|| config.output.directory.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = Path::new(output_filename)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| output_filename.into());
    dir.join(file_name)
}

pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn print_rejections(rejected: &[CoreError], ctx: &AppContext) {
    if ctx.quiet {
        return;
    }
    for err in rejected {
        let line = format!("skipped: {err}");
        if ctx.no_color {
            eprintln!("{line}");
        } else {
            eprintln!("{}", line.yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_strips_directories() {
        let cfg = Config::default();
        let p = output_path(Some(Path::new("out")), &cfg, "../../etc/merged.txt");
        assert_eq!(p, PathBuf::from("out/merged.txt"));
    }

    #[test]
    fn test_output_path_falls_back_to_config_directory() {
        let mut cfg = Config::default();
        cfg.output.directory = Some(PathBuf::from("build"));
        assert_eq!(output_path(None, &cfg, "all.md"), PathBuf::from("build/all.md"));
    }
}

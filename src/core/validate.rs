//! Candidate acceptance: extension allow-list plus size ceiling.

use tracing::debug;

use crate::core::collection::Candidate;
use crate::core::error::{CoreError, RejectReason};
use crate::core::names::extension;

/// 10 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const DEFAULT_MAX_PREVIEW_CHARS: usize = 500;

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".md", ".txt", ".yaml", ".yml", ".json", ".cpp", ".go", ".py", ".html", ".css", ".js", ".sh",
];

/// Names accepted regardless of extension (compared lowercase).
const SPECIAL_BASENAMES: &[&str] = &["dockerfile", "makefile"];

/// Read-only limits handed to the core by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Lowercase, dot-prefixed extensions
    pub supported_extensions: Vec<String>,
    pub max_file_size: u64,
    pub max_preview_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            supported_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_preview_chars: DEFAULT_MAX_PREVIEW_CHARS,
        }
    }
}

/// Stateless acceptance predicate over candidates.
#[derive(Debug, Clone)]
pub struct Validator {
    extensions: Vec<String>,
    max_file_size: u64,
}

impl Validator {
    pub fn new(limits: &Limits) -> Self {
        let extensions = limits
            .supported_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .collect();

        Self {
            extensions,
            max_file_size: limits.max_file_size,
        }
    }

    pub fn is_acceptable(&self, candidate: &Candidate) -> bool {
        self.check(candidate).is_ok()
    }

    /// Same as [`Validator::is_acceptable`] but says why a candidate failed.
    pub fn check(&self, candidate: &Candidate) -> Result<(), RejectReason> {
        if !self.is_supported_name(&candidate.name) {
            return Err(RejectReason::UnsupportedType);
        }
        if candidate.size_bytes > self.max_file_size {
            return Err(RejectReason::TooLarge {
                size: candidate.size_bytes,
                limit: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn is_supported_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        if SPECIAL_BASENAMES.contains(&lower.as_str()) || lower.contains("docker-compose") {
            return true;
        }

        let ext = extension(&lower);
        !ext.is_empty() && self.extensions.iter().any(|allowed| allowed == ext)
    }

    /// Split a batch into accepted candidates and rejections, keeping input order.
    pub fn partition(&self, candidates: Vec<Candidate>) -> (Vec<Candidate>, Vec<CoreError>) {
        let mut accepted = Vec::with_capacity(candidates.len());
        let mut rejected = Vec::new();

        for candidate in candidates {
            match self.check(&candidate) {
                Ok(()) => accepted.push(candidate),
                Err(reason) => {
                    debug!(name = %candidate.name, %reason, "candidate rejected");
                    rejected.push(CoreError::ValidationRejected {
                        name: candidate.name,
                        reason,
                    });
                }
            }
        }

        (accepted, rejected)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&Limits::default())
    }
}

/// `"MD"` and `".md"` both become `".md"`.
fn normalize_extension(ext: &str) -> String {
    let lower = ext.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}

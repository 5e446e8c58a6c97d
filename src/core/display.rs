//! Presentation-only name shortening and size labels.
//!
//! Nothing here touches collection state; callers pass a display name and
//! get a string back.

use crate::core::names::split_extension;

/// Inserted between the kept head and tail of a shortened base name.
pub const ELLIPSIS: &str = "...";

/// Character budget for a name, chosen by available layout width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTier {
    Compact,
    Medium,
    Wide,
    ExtraWide,
}

impl LayoutTier {
    pub fn from_width(px: u32) -> Self {
        match px {
            1280.. => LayoutTier::ExtraWide,
            1024.. => LayoutTier::Wide,
            768.. => LayoutTier::Medium,
            _ => LayoutTier::Compact,
        }
    }

    pub fn budget(self) -> usize {
        match self {
            LayoutTier::Compact => 12,
            LayoutTier::Medium => 20,
            LayoutTier::Wide => 26,
            LayoutTier::ExtraWide => 30,
        }
    }

    /// Smaller budget for the secondary (original name) label.
    pub fn secondary_budget(self) -> usize {
        (self.budget() * 2 / 3).max(8)
    }
}

/// Shorten `name` to at most `max_chars` characters, always keeping the
/// extension. The base keeps a head and a tail around [`ELLIPSIS`]. Only a
/// budget smaller than extension + ellipsis overflows: the result is then
/// first character + ellipsis + extension.
pub fn truncate(name: &str, max_chars: usize) -> String {
    let (base, ext) = split_extension(name);
    let base_len = base.chars().count();
    let ext_len = ext.chars().count();
    let marker_len = ELLIPSIS.chars().count();

    if base_len + ext_len <= max_chars {
        return name.to_string();
    }

    if max_chars < ext_len + marker_len {
        let first: String = base.chars().take(1).collect();
        return format!("{first}{ELLIPSIS}{ext}");
    }

    let room = max_chars - ext_len - marker_len;
    let head_len = room.div_ceil(2);
    let tail_len = room - head_len;
    let head: String = base.chars().take(head_len).collect();
    let tail: String = base.chars().skip(base_len - tail_len).collect();
    format!("{head}{ELLIPSIS}{tail}{ext}")
}

/// `1536` -> `"1.5 KB"`; binary units, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

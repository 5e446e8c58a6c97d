//! Clipped file previews.

pub const TRUNCATION_NOTICE: &str = "\n\n... [content truncated]";
pub const EMPTY_NOTICE: &str = "(file is empty)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub text: String,
    /// Characters in the full content
    pub total_chars: usize,
    pub truncated: bool,
}

impl Preview {
    /// Clip `content` to `max_chars` characters.
    pub fn clip(content: &str, max_chars: usize) -> Self {
        let total_chars = content.chars().count();
        if total_chars == 0 {
            return Self {
                text: EMPTY_NOTICE.to_string(),
                total_chars,
                truncated: false,
            };
        }

        if total_chars <= max_chars {
            return Self {
                text: content.to_string(),
                total_chars,
                truncated: false,
            };
        }

        let mut text: String = content.chars().take(max_chars).collect();
        text.push_str(TRUNCATION_NOTICE);
        Self {
            text,
            total_chars,
            truncated: true,
        }
    }
}

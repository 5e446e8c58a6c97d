//! Filename splitting shared by validation, renaming and display.
//!
//! The extension is everything from the last `.` onward, dot included.
//! A dot in the first position marks a hidden file, not an extension.

/// Split `name` into `(base, extension)`; the extension keeps its leading dot.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

/// Extension of `name` including the dot, or `""`.
pub fn extension(name: &str) -> &str {
    split_extension(name).1
}

/// Case-insensitive extension comparison.
pub fn same_extension(a: &str, b: &str) -> bool {
    extension(a).eq_ignore_ascii_case(extension(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("report.txt"), ("report", ".txt"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("Makefile"), ("Makefile", ""));
        assert_eq!(split_extension(".env"), (".env", ""));
        assert_eq!(split_extension("trailing."), ("trailing", "."));
    }

    #[test]
    fn test_same_extension_ignores_case() {
        assert!(same_extension("a.TXT", "b.txt"));
        assert!(!same_extension("a.md", "b.txt"));
        assert!(same_extension("Dockerfile", "Makefile"));
    }
}

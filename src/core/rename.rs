//! Original name -> latest display name.
//!
//! The collection keeps this in step with its records, so an entry exists
//! exactly while some tracked file with that original name is shown under a
//! different name.

use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameRegistry {
    entries: IndexMap<String, String>,
}

impl RenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `display` for `original`. Identity renames clear the entry.
    pub fn set(&mut self, original: &str, display: &str) {
        if original == display {
            self.unset(original);
        } else {
            self.entries.insert(original.to_string(), display.to_string());
        }
    }

    pub fn unset(&mut self, original: &str) -> Option<String> {
        self.entries.shift_remove(original)
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Active renames in first-renamed order.
    pub fn to_mapping(&self) -> IndexMap<String, String> {
        self.entries.clone()
    }
}

//! Merge request payload, built from the collection at merge time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::collection::{FileCollection, FileId};
use crate::core::error::{CoreError, Result};

/// Wire body for the backend merge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Concatenation order
    pub file_ids: Vec<FileId>,
    pub output_filename: String,
    /// Original name -> name to use in the merged output
    pub file_renames: IndexMap<String, String>,
}

impl MergeRequest {
    /// Project `collection` into a request. The output name is used as given;
    /// any default belongs to the caller.
    pub fn build(collection: &FileCollection, output_filename: Option<&str>) -> Result<Self> {
        let output_filename = match output_filename {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => return Err(CoreError::EmptyOutputName),
        };
        if collection.is_empty() {
            return Err(CoreError::EmptyCollection);
        }

        Ok(Self {
            file_ids: collection.snapshot_order(),
            output_filename,
            file_renames: collection.renames().to_mapping(),
        })
    }
}

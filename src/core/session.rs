//! A merge session: the file collection wired to a merge backend.
//!
//! The session is where collaborator replies meet the collection. Backend
//! failures come back as [`CoreError::Collaborator`] and never leave partial
//! state behind: a failed upload adds nothing, a failed merge keeps every file.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::core::collection::{
    Candidate, CollectionEvent, FileCollection, FileId, RenameOutcome,
};
use crate::core::error::{CoreError, Result};
use crate::core::merge::MergeRequest;
use crate::core::preview::Preview;
use crate::core::validate::{Limits, Validator};
use crate::infra::client::MergeBackend;

/// Outcome of adding a batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddReport {
    /// Ids of newly tracked files, in batch order
    pub added: Vec<FileId>,
    /// `ValidationRejected` for each dropped candidate
    pub rejected: Vec<CoreError>,
    /// How many ids were synthesized locally
    pub synthesized: usize,
}

/// Merged output together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutput {
    pub request: MergeRequest,
    pub bytes: Vec<u8>,
}

pub struct MergeSession<B> {
    backend: B,
    validator: Validator,
    limits: Limits,
    collection: FileCollection,
    // Advisory: avoids refetching a preview already shown this session
    previews: HashMap<FileId, Preview>,
    clock: fn() -> i64,
}

impl<B: MergeBackend> MergeSession<B> {
    pub fn new(backend: B, limits: Limits) -> Self {
        Self {
            backend,
            validator: Validator::new(&limits),
            limits,
            collection: FileCollection::new(),
            previews: HashMap::new(),
            clock: now_millis,
        }
    }

    /// Replace the millisecond clock used in placeholder ids.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn collection(&self) -> &FileCollection {
        &self.collection
    }

    pub fn subscribe(&mut self) -> Receiver<CollectionEvent> {
        self.collection.subscribe()
    }

    /// Validate, upload and track a batch. Rejected candidates are reported,
    /// not fatal; an upload failure adds nothing.
    #[instrument(skip_all, fields(count = candidates.len()))]
    pub fn add_files(&mut self, candidates: Vec<Candidate>) -> Result<AddReport> {
        let (accepted, rejected) = self.validator.partition(candidates);
        if accepted.is_empty() {
            warn!(rejected = rejected.len(), "nothing acceptable to upload");
            return Ok(AddReport {
                rejected,
                ..AddReport::default()
            });
        }

        let reply = self
            .backend
            .upload(&accepted)
            .map_err(|e| CoreError::collaborator("upload", format!("{e:#}")))?;

        let ts = (self.clock)();
        let ids = assign_ids(&reply, accepted.len(), ts);
        let mut report = self.track(accepted, ids, ts)?;
        report.rejected = rejected;
        info!(added = report.added.len(), synthesized = report.synthesized, "batch added");
        Ok(report)
    }

    /// Track a batch without contacting the backend; every id is local.
    pub fn add_local(&mut self, candidates: Vec<Candidate>) -> Result<AddReport> {
        let (accepted, rejected) = self.validator.partition(candidates);
        let ts = (self.clock)();
        let ids = assign_ids(&Value::Null, accepted.len(), ts);
        let mut report = self.track(accepted, ids, ts)?;
        report.rejected = rejected;
        Ok(report)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<RenameOutcome> {
        self.collection.rename(id, new_name)
    }

    pub fn revert(&mut self, id: &str) -> Result<()> {
        self.collection.revert(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        self.previews.remove(id);
        self.collection.remove(id).is_some()
    }

    pub fn reconcile_order(&mut self, observed: &[FileId]) -> bool {
        self.collection.reconcile_order(observed)
    }

    /// Clipped content for display. Cached per file once loaded.
    #[instrument(skip(self))]
    pub fn preview(&mut self, id: &str) -> Result<Preview> {
        if !self.collection.contains(id) {
            return Err(CoreError::UnknownFile(id.to_string()));
        }
        if let Some(cached) = self.previews.get(id) {
            debug!("preview cache hit");
            return Ok(cached.clone());
        }

        let content = self
            .backend
            .fetch_content(id)
            .map_err(|e| CoreError::collaborator("preview", format!("{e:#}")))?;
        let preview = Preview::clip(&content, self.limits.max_preview_chars);
        self.previews.insert(id.to_string(), preview.clone());
        Ok(preview)
    }

    pub fn merge_request(&self, output_filename: Option<&str>) -> Result<MergeRequest> {
        MergeRequest::build(&self.collection, output_filename)
    }

    /// Build the request and hand it to the backend. The collection is kept
    /// whether or not the merge succeeds.
    #[instrument(skip(self))]
    pub fn merge(&self, output_filename: Option<&str>) -> Result<MergeOutput> {
        let request = self.merge_request(output_filename)?;
        let bytes = self
            .backend
            .merge(&request)
            .map_err(|e| CoreError::collaborator("merge", format!("{e:#}")))?;
        info!(bytes = bytes.len(), "merge complete");
        Ok(MergeOutput { request, bytes })
    }

    fn track(
        &mut self,
        accepted: Vec<Candidate>,
        ids: Vec<AssignedId>,
        ts: i64,
    ) -> Result<AddReport> {
        let mut report = AddReport::default();

        for (index, (candidate, assigned)) in accepted.into_iter().zip(ids).enumerate() {
            let mut id = assigned.id;
            let mut attempt = 0;
            if assigned.synthesized {
                report.synthesized += 1;
            }

            loop {
                match self.collection.add(candidate.clone(), id.clone()) {
                    Ok(_) => break,
                    Err(CoreError::DuplicateId(taken)) => {
                        attempt += 1;
                        id = local_id(ts, index, attempt);
                        warn!(%taken, replacement = %id, "id collision, using a local id");
                        if attempt == 1 && !assigned.synthesized {
                            report.synthesized += 1;
                        }
                    }
                    Err(other) => return Err(other),
                }
            }
            report.added.push(id);
        }

        Ok(report)
    }
}

/// An id for one batch position, and whether it was made up locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedId {
    pub id: FileId,
    pub synthesized: bool,
}

/// Pair each of `count` uploaded files with an id from the upload reply.
///
/// Accepts `{"file_ids": [...]}` or a bare array; entries may be strings,
/// numbers or objects carrying `fileId`, `file_id` or `id`. Positions without
/// a usable id get `local-<ts>-<index>`.
pub fn assign_ids(reply: &Value, count: usize, ts: i64) -> Vec<AssignedId> {
    let entries = match reply {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.get("file_ids").and_then(Value::as_array),
        _ => None,
    };

    match entries {
        Some(items) if items.len() != count => {
            warn!(expected = count, got = items.len(), "upload reply id count mismatch");
        }
        None => warn!("upload reply carries no id list"),
        _ => {}
    }

    (0..count)
        .map(|index| {
            match entries
                .and_then(|items| items.get(index))
                .and_then(id_from_entry)
            {
                Some(id) => AssignedId { id, synthesized: false },
                None => AssignedId {
                    id: local_id(ts, index, 0),
                    synthesized: true,
                },
            }
        })
        .collect()
}

fn id_from_entry(entry: &Value) -> Option<FileId> {
    match entry {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => ["fileId", "file_id", "id"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(id_from_entry),
        _ => None,
    }
}

/// `local-<ts>-<index>`, suffixed with `-<attempt>` after a collision.
pub fn local_id(ts: i64, index: usize, attempt: usize) -> FileId {
    if attempt == 0 {
        format!("local-{ts}-{index}")
    } else {
        format!("local-{ts}-{index}-{attempt}")
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assign_ids_from_wrapped_reply() {
        let ids = assign_ids(&json!({"message": "ok", "file_ids": ["a", "b"]}), 2, 7);
        assert_eq!(
            ids,
            vec![
                AssignedId { id: "a".into(), synthesized: false },
                AssignedId { id: "b".into(), synthesized: false },
            ]
        );
    }

    #[test]
    fn test_assign_ids_short_reply_fills_tail() {
        let ids = assign_ids(&json!(["a"]), 3, 99);
        let got: Vec<_> = ids.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(got, ["a", "local-99-1", "local-99-2"]);
        assert!(ids[2].synthesized);
    }

    #[test]
    fn test_assign_ids_object_entries_and_garbage() {
        let ids = assign_ids(
            &json!([{"fileId": "x"}, {"file_id": "y"}, 42, null, ""]),
            5,
            1,
        );
        let got: Vec<_> = ids.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(got, ["x", "y", "42", "local-1-3", "local-1-4"]);
    }

    #[test]
    fn test_assign_ids_non_array_reply() {
        let ids = assign_ids(&json!({"message": "uploaded"}), 2, 5);
        assert!(ids.iter().all(|a| a.synthesized));
        assert_eq!(ids[0].id, "local-5-0");
        assert!(assign_ids(&Value::Null, 0, 5).is_empty());
    }

    #[test]
    fn test_local_id_suffix() {
        assert_eq!(local_id(10, 2, 0), "local-10-2");
        assert_eq!(local_id(10, 2, 3), "local-10-2-3");
    }
}

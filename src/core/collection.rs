//! Authoritative set of tracked files and their merge order.
//!
//! `FileCollection` owns three pieces of state that must move together:
//! the records keyed by id, the order (a duplicate-free sequence of the same
//! ids) and the rename registry keyed by original name. Every command checks
//! its preconditions before touching any of them, so a returned error means
//! nothing changed.
//!
//! Presentation code observes changes through [`FileCollection::subscribe`]
//! and never mutates records directly.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, trace};

use crate::core::error::{CoreError, Result};
use crate::core::names::{extension, split_extension};
use crate::core::rename::RenameRegistry;
use crate::core::reorder::{Reconciliation, reconcile};

/// Opaque id assigned by the upload backend or synthesized locally.
pub type FileId = String;

/// Where a file's bytes live before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentHandle {
    Path(PathBuf),
    Inline(Arc<[u8]>),
}

/// A file offered for adding, not yet tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub size_bytes: u64,
    pub content: ContentHandle,
}

impl Candidate {
    pub fn inline(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            content: ContentHandle::Inline(bytes.into()),
        }
    }

    /// Override the reported size (the validator only looks at this field).
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

/// Tracked metadata for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    id: FileId,
    original_name: String,
    display_name: String,
    size_bytes: u64,
    content: ContentHandle,
    // Sequence number of the last rename away from the original name
    renamed_seq: Option<u64>,
}

impl FileRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn content(&self) -> &ContentHandle {
        &self.content
    }

    pub fn is_renamed(&self) -> bool {
        self.display_name != self.original_name
    }
}

/// Result of a successful rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub display_name: String,
    /// The requested extension was missing or different and was corrected
    pub extension_restored: bool,
}

/// Notifications published after each state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvent {
    Added { id: FileId },
    Renamed { id: FileId, display_name: String, extension_restored: bool },
    Reverted { id: FileId },
    Removed { id: FileId },
    Reordered { order: Vec<FileId> },
}

#[derive(Debug, Default)]
pub struct FileCollection {
    records: HashMap<FileId, FileRecord>,
    order: Vec<FileId>,
    renames: RenameRegistry,
    rename_seq: u64,
    subscribers: Vec<Sender<CollectionEvent>>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a channel receiving every subsequent event. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<CollectionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn add(&mut self, candidate: Candidate, id: FileId) -> Result<&FileRecord> {
        if self.records.contains_key(&id) {
            return Err(CoreError::DuplicateId(id));
        }

        debug!(%id, name = %candidate.name, "tracking file");
        let record = FileRecord {
            id: id.clone(),
            original_name: candidate.name.clone(),
            display_name: candidate.name,
            size_bytes: candidate.size_bytes,
            content: candidate.content,
            renamed_seq: None,
        };
        self.records.insert(id.clone(), record);
        self.order.push(id.clone());
        self.emit(CollectionEvent::Added { id: id.clone() });

        debug_assert!(self.is_consistent());
        self.records
            .get(&id)
            .ok_or(CoreError::UnknownFile(id))
    }

    /// Rename keeping the current extension. A different or missing extension
    /// in `new_name` is replaced by the current one and reported back. A bare
    /// extension such as `.md` counts as an empty name when the file has one.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<RenameOutcome> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| CoreError::UnknownFile(id.to_string()))?;

        let requested = new_name.trim();
        let keep_ext = extension(&record.display_name);
        if requested.is_empty() || (!keep_ext.is_empty() && is_extension_only(requested)) {
            return Err(CoreError::EmptyDisplayName);
        }

        let (requested_base, requested_ext) = split_extension(requested);
        let (display_name, extension_restored) =
            if keep_ext.is_empty() || requested_ext.eq_ignore_ascii_case(keep_ext) {
                (requested.to_string(), false)
            } else if requested_ext.is_empty() {
                (format!("{requested}{keep_ext}"), true)
            } else {
                (format!("{requested_base}{keep_ext}"), true)
            };

        self.rename_seq += 1;
        let seq = self.rename_seq;
        let original = {
            let Some(record) = self.records.get_mut(id) else {
                return Err(CoreError::UnknownFile(id.to_string()));
            };
            record.display_name = display_name.clone();
            record.renamed_seq = record.is_renamed().then_some(seq);
            record.original_name.clone()
        };
        self.sync_rename(&original);

        debug!(%id, %display_name, extension_restored, "renamed");
        self.emit(CollectionEvent::Renamed {
            id: id.to_string(),
            display_name: display_name.clone(),
            extension_restored,
        });

        debug_assert!(self.is_consistent());
        Ok(RenameOutcome {
            display_name,
            extension_restored,
        })
    }

    /// Restore the original name and drop the rename entry.
    pub fn revert(&mut self, id: &str) -> Result<()> {
        let Some(record) = self.records.get_mut(id) else {
            return Err(CoreError::UnknownFile(id.to_string()));
        };
        record.display_name = record.original_name.clone();
        record.renamed_seq = None;
        let original = record.original_name.clone();
        self.sync_rename(&original);

        self.emit(CollectionEvent::Reverted { id: id.to_string() });
        debug_assert!(self.is_consistent());
        Ok(())
    }

    /// Stop tracking `id`. Absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<FileRecord> {
        let record = self.records.remove(id)?;
        self.order.retain(|o| o != id);
        self.sync_rename(&record.original_name);

        debug!(%id, "removed");
        self.emit(CollectionEvent::Removed { id: id.to_string() });
        debug_assert!(self.is_consistent());
        Some(record)
    }

    /// Adopt an order observed by the presentation layer. Returns whether the
    /// authoritative order changed; no event is published otherwise.
    pub fn reconcile_order(&mut self, observed: &[FileId]) -> bool {
        match reconcile(&self.order, observed) {
            Reconciliation::Unchanged => {
                trace!("observed order matches");
                false
            }
            Reconciliation::Changed(order) => {
                debug!(?order, "order changed");
                self.order = order.clone();
                self.emit(CollectionEvent::Reordered { order });
                debug_assert!(self.is_consistent());
                true
            }
        }
    }

    pub fn snapshot_order(&self) -> Vec<FileId> {
        self.order.clone()
    }

    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Records in merge order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn renames(&self) -> &RenameRegistry {
        &self.renames
    }

    /// Order and records form a bijection, and the rename registry mirrors
    /// the records.
    pub fn is_consistent(&self) -> bool {
        if self.order.len() != self.records.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.order.len());
        if !self
            .order
            .iter()
            .all(|id| self.records.contains_key(id) && seen.insert(id))
        {
            return false;
        }

        // Expected registry owner per original name: latest rename wins
        let mut owners: HashMap<&str, &FileRecord> = HashMap::new();
        for record in self.records.values().filter(|r| r.is_renamed()) {
            let owner = owners
                .entry(record.original_name.as_str())
                .or_insert(record);
            if record.renamed_seq > owner.renamed_seq {
                *owner = record;
            }
        }

        let mapping = self.renames.to_mapping();
        mapping.len() == owners.len()
            && mapping.iter().all(|(original, display)| {
                owners
                    .get(original.as_str())
                    .is_some_and(|r| &r.display_name == display)
            })
    }

    /// Recompute the registry entry for `original`. When several records share
    /// the original name, the most recently renamed one still differing wins.
    fn sync_rename(&mut self, original: &str) {
        let owner = self
            .records
            .values()
            .filter(|r| r.original_name == original && r.is_renamed())
            .max_by_key(|r| r.renamed_seq);

        match owner {
            Some(r) => {
                let display = r.display_name.clone();
                self.renames.set(original, &display);
            }
            None => {
                self.renames.unset(original);
            }
        }
    }

    fn emit(&mut self, event: CollectionEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// `.md`, `.`, `..`: nothing in front of the extension.
fn is_extension_only(name: &str) -> bool {
    match name.strip_prefix('.') {
        Some(rest) => !rest.contains('.') || rest.chars().all(|c| c == '.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(names: &[(&str, &str)]) -> FileCollection {
        let mut c = FileCollection::new();
        for (id, name) in names {
            c.add(Candidate::inline(*name, b"x".to_vec()), id.to_string())
                .unwrap();
        }
        c
    }

    #[test]
    fn test_add_appends_and_rejects_duplicate_id() {
        let mut c = collection(&[("a", "one.txt"), ("b", "two.md")]);
        assert_eq!(c.snapshot_order(), ["a", "b"]);

        let err = c
            .add(Candidate::inline("three.py", b"".to_vec()), "a".into())
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateId("a".into()));
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a").unwrap().display_name(), "one.txt");
    }

    #[test]
    fn test_rename_keeps_extension() {
        let mut c = collection(&[("a", "report.txt")]);

        let out = c.rename("a", "notes").unwrap();
        assert_eq!(out.display_name, "notes.txt");
        assert!(out.extension_restored);

        let out = c.rename("a", "notes.md").unwrap();
        assert_eq!(out.display_name, "notes.txt");
        assert!(out.extension_restored);

        let out = c.rename("a", "  final.TXT ").unwrap();
        assert_eq!(out.display_name, "final.TXT");
        assert!(!out.extension_restored);

        assert_eq!(c.renames().get("report.txt"), Some("final.TXT"));
    }

    #[test]
    fn test_rename_without_extension_is_free() {
        let mut c = collection(&[("a", "Dockerfile")]);
        let out = c.rename("a", "Containerfile").unwrap();
        assert_eq!(out.display_name, "Containerfile");
        assert!(!out.extension_restored);
    }

    #[test]
    fn test_rename_rejects_blank_and_unknown() {
        let mut c = collection(&[("a", "report.txt")]);
        assert_eq!(c.rename("a", "   "), Err(CoreError::EmptyDisplayName));
        assert_eq!(
            c.rename("zz", "x.txt"),
            Err(CoreError::UnknownFile("zz".into()))
        );
        assert!(c.renames().is_empty());
    }

    #[test]
    fn test_rename_to_bare_extension_is_empty() {
        let mut c = collection(&[("a", "report.txt"), ("b", "Makefile")]);
        assert_eq!(c.rename("a", ".txt"), Err(CoreError::EmptyDisplayName));
        assert_eq!(c.rename("a", " .md "), Err(CoreError::EmptyDisplayName));
        assert_eq!(c.rename("a", "."), Err(CoreError::EmptyDisplayName));
        assert_eq!(c.get("a").unwrap().display_name(), "report.txt");
        assert!(c.renames().is_empty());

        // Dotfiles keep working where there is no extension to protect
        assert_eq!(c.rename("b", ".env").unwrap().display_name, ".env");
        // A dotted base is more than an extension
        assert_eq!(c.rename("a", ".config.txt").unwrap().display_name, ".config.txt");
    }

    #[test]
    fn test_stale_registry_value_is_inconsistent() {
        let mut c = collection(&[("a", "report.txt")]);
        c.rename("a", "notes").unwrap();
        assert!(c.is_consistent());

        c.renames.set("report.txt", "stale.txt");
        assert!(!c.is_consistent());
    }

    #[test]
    fn test_rename_back_to_original_clears_registry() {
        let mut c = collection(&[("a", "report.txt")]);
        c.rename("a", "other.txt").unwrap();
        c.rename("a", "report.txt").unwrap();
        assert!(c.renames().is_empty());
        assert!(!c.get("a").unwrap().is_renamed());
    }

    #[test]
    fn test_revert_after_many_renames() {
        let mut c = collection(&[("a", "report.txt")]);
        c.rename("a", "one").unwrap();
        c.rename("a", "two").unwrap();
        c.revert("a").unwrap();

        assert_eq!(c.get("a").unwrap().display_name(), "report.txt");
        assert!(c.renames().to_mapping().is_empty());
        assert_eq!(c.revert("missing"), Err(CoreError::UnknownFile("missing".into())));
    }

    #[test]
    fn test_remove_is_idempotent_and_drops_rename() {
        let mut c = collection(&[("a", "x.txt"), ("b", "y.txt")]);
        c.rename("a", "z").unwrap();

        assert!(c.remove("a").is_some());
        assert!(c.remove("a").is_none());
        assert_eq!(c.snapshot_order(), ["b"]);
        assert!(c.renames().is_empty());
        assert!(c.is_consistent());
    }

    #[test]
    fn test_shared_original_name_registry_follows_latest_rename() {
        let mut c = collection(&[("a", "main.go"), ("b", "main.go")]);
        c.rename("a", "server").unwrap();
        c.rename("b", "client").unwrap();
        assert_eq!(c.renames().get("main.go"), Some("client.go"));

        c.remove("b");
        assert_eq!(c.renames().get("main.go"), Some("server.go"));

        c.revert("a").unwrap();
        assert!(c.renames().is_empty());
    }

    #[test]
    fn test_events_are_published() {
        let mut c = FileCollection::new();
        let rx = c.subscribe();

        c.add(Candidate::inline("a.txt", b"".to_vec()), "1".into())
            .unwrap();
        c.add(Candidate::inline("b.txt", b"".to_vec()), "2".into())
            .unwrap();
        c.rename("1", "c").unwrap();
        assert!(!c.reconcile_order(&["1".into(), "2".into()]));
        assert!(c.reconcile_order(&["2".into(), "1".into()]));
        c.remove("2");

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                CollectionEvent::Added { id: "1".into() },
                CollectionEvent::Added { id: "2".into() },
                CollectionEvent::Renamed {
                    id: "1".into(),
                    display_name: "c.txt".into(),
                    extension_restored: true
                },
                CollectionEvent::Reordered { order: vec!["2".into(), "1".into()] },
                CollectionEvent::Removed { id: "2".into() },
            ]
        );
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut c = FileCollection::new();
        drop(c.subscribe());
        c.add(Candidate::inline("a.txt", b"".to_vec()), "1".into())
            .unwrap();
        assert!(c.subscribers.is_empty());
    }

    #[test]
    fn test_iter_follows_order() {
        let mut c = collection(&[("a", "1.txt"), ("b", "2.txt"), ("c", "3.txt")]);
        c.reconcile_order(&["c".into(), "a".into()]);
        let names: Vec<_> = c.iter().map(|r| r.display_name()).collect();
        assert_eq!(names, ["3.txt", "1.txt", "2.txt"]);
    }
}

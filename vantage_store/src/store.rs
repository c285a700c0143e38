// Copyright 2026 the Vantage Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;

use thiserror::Error;
use tracing::{debug, error, warn};
use vantage_host::{Host, HostError};

use crate::document::{DATA_BLOCK_NAME, StoreDocument};
use crate::mirror::ViewMirror;
use crate::record::{RecordField, ViewRecord};

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The persisted document exists but cannot be parsed. Reads degrade
    /// to an empty document; mutations fail with this error until the
    /// user confirms the destructive recovery.
    #[error("view storage is corrupted; recovery overwrites it with an empty document")]
    Corrupted,
    /// A view index was out of range for the current document.
    #[error("view index {0} is out of range")]
    OutOfRange(usize),
    /// The host rejected a blob write.
    #[error(transparent)]
    Host(#[from] HostError),
    /// The document failed to encode.
    #[error("failed to encode view storage: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Access to the persisted saved-view document.
///
/// Holds no cached copy of the document: every operation reads the blob,
/// and every mutation writes the whole document back. The only state here
/// is the mirror-sync re-entrancy flag.
#[derive(Debug)]
pub struct ViewStore {
    block_name: String,
    syncing: Cell<bool>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    /// A store backed by the default blob name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_block_name(DATA_BLOCK_NAME)
    }

    /// A store backed by a custom blob name.
    #[must_use]
    pub fn with_block_name(name: &str) -> Self {
        Self {
            block_name: name.to_owned(),
            syncing: Cell::new(false),
        }
    }

    /// Whether a mass mirror resync is in progress. Per-field UI edit
    /// callbacks check this and skip their write-back while set.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.syncing.get()
    }

    /// Load the document, or an error when the blob is unparsable.
    pub fn load_document(&self, host: &dyn Host) -> Result<StoreDocument, StorageError> {
        let Some(text) = host.read_data_blob(&self.block_name) else {
            return Ok(StoreDocument::default());
        };
        if text.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        serde_json::from_str(&text).map_err(|err| {
            error!(%err, "saved-view document is unparsable");
            StorageError::Corrupted
        })
    }

    /// Load the document, degrading corruption to an empty default.
    #[must_use]
    pub fn document_or_default(&self, host: &dyn Host) -> StoreDocument {
        self.load_document(host).unwrap_or_default()
    }

    fn save_document(&self, host: &mut dyn Host, doc: &StoreDocument) -> Result<(), StorageError> {
        let text = serde_json::to_string(doc)?;
        host.write_data_blob(&self.block_name, &text)?;
        Ok(())
    }

    /// All saved views, in navigation order. Never fails; a corrupted
    /// document reads as empty.
    #[must_use]
    pub fn list(&self, host: &dyn Host) -> Vec<ViewRecord> {
        self.document_or_default(host).saved_views
    }

    /// One saved view by index.
    #[must_use]
    pub fn get(&self, host: &dyn Host, index: usize) -> Option<ViewRecord> {
        self.document_or_default(host).saved_views.into_iter().nth(index)
    }

    /// Number of saved views.
    #[must_use]
    pub fn len(&self, host: &dyn Host) -> usize {
        self.document_or_default(host).saved_views.len()
    }

    /// Whether no views are saved.
    #[must_use]
    pub fn is_empty(&self, host: &dyn Host) -> bool {
        self.len(host) == 0
    }

    /// Append a record, returning its index.
    pub fn add(&self, host: &mut dyn Host, record: ViewRecord) -> Result<usize, StorageError> {
        let mut doc = self.load_document(host)?;
        doc.saved_views.push(record);
        let index = doc.saved_views.len() - 1;
        self.save_document(host, &doc)?;
        Ok(index)
    }

    /// Replace the record at `index`.
    pub fn update(
        &self,
        host: &mut dyn Host,
        index: usize,
        record: ViewRecord,
    ) -> Result<(), StorageError> {
        let mut doc = self.load_document(host)?;
        let slot = doc
            .saved_views
            .get_mut(index)
            .ok_or(StorageError::OutOfRange(index))?;
        *slot = record;
        self.save_document(host, &doc)
    }

    /// Remove the record at `index`.
    pub fn delete(&self, host: &mut dyn Host, index: usize) -> Result<(), StorageError> {
        let mut doc = self.load_document(host)?;
        if index >= doc.saved_views.len() {
            return Err(StorageError::OutOfRange(index));
        }
        doc.saved_views.remove(index);
        self.save_document(host, &doc)
    }

    /// Swap two records (UI reorder step).
    pub fn reorder(&self, host: &mut dyn Host, from: usize, to: usize) -> Result<(), StorageError> {
        let mut doc = self.load_document(host)?;
        let len = doc.saved_views.len();
        if from >= len {
            return Err(StorageError::OutOfRange(from));
        }
        if to >= len {
            return Err(StorageError::OutOfRange(to));
        }
        doc.saved_views.swap(from, to);
        self.save_document(host, &doc)
    }

    /// Write a batch of thumbnail handles in one load/save cycle. Indexes
    /// past the end of the document are skipped; bulk regeneration must
    /// not fail because a view was deleted mid-run.
    pub fn set_thumbnails(
        &self,
        host: &mut dyn Host,
        updates: &[(usize, Option<u64>)],
    ) -> Result<(), StorageError> {
        let mut doc = self.load_document(host)?;
        for (index, thumbnail) in updates {
            if let Some(record) = doc.saved_views.get_mut(*index) {
                record.thumbnail = *thumbnail;
            }
        }
        self.save_document(host, &doc)
    }

    /// Next default-name ordinal. Increments and persists the counter.
    pub fn next_ordinal(&self, host: &mut dyn Host) -> Result<u64, StorageError> {
        let mut doc = self.load_document(host)?;
        let next = doc.next_view_number;
        doc.next_view_number += 1;
        self.save_document(host, &doc)?;
        Ok(next)
    }

    /// Write one UI-edited field of a record back to the document.
    /// Suppressed (returns `Ok(false)`) while a mass resync is running.
    pub fn set_field(
        &self,
        host: &mut dyn Host,
        index: usize,
        field: &RecordField,
    ) -> Result<bool, StorageError> {
        if self.syncing.get() {
            return Ok(false);
        }
        let mut doc = self.load_document(host)?;
        let record = doc
            .saved_views
            .get_mut(index)
            .ok_or(StorageError::OutOfRange(index))?;
        field.apply_to(record);
        self.save_document(host, &doc)?;
        Ok(true)
    }

    /// Rebuild every mirror from the canonical list, with per-field
    /// write-back suppressed for the duration.
    pub fn sync_mirrors(&self, host: &dyn Host, mirrors: &mut [ViewMirror]) {
        let records = self.list(host);
        self.syncing.set(true);
        for mirror in mirrors.iter_mut() {
            mirror.rebuild(&records);
        }
        self.syncing.set(false);
    }

    /// Overwrite the blob with a fresh empty document. This is the
    /// destructive corruption recovery; callers confirm with the user
    /// first.
    pub fn reset_storage(&self, host: &mut dyn Host) -> Result<(), StorageError> {
        warn!("resetting saved-view storage to an empty document");
        self.save_document(host, &StoreDocument::default())
    }

    /// One-shot migration from the legacy per-scene format. Runs only
    /// when the canonical document has no views; recomputes the naming
    /// counter from the highest "View N" suffix migrated. Returns the
    /// number of records migrated.
    pub fn migrate_legacy(&self, host: &mut dyn Host) -> Result<usize, StorageError> {
        let mut doc = self.load_document(host)?;
        if !doc.saved_views.is_empty() {
            return Ok(0);
        }
        let payloads = host.legacy_view_payloads();
        if payloads.is_empty() {
            return Ok(0);
        }

        let mut highest = 0u64;
        for payload in payloads {
            match serde_json::from_value::<ViewRecord>(payload) {
                Ok(record) => {
                    if let Some(n) = default_name_ordinal(&record.name) {
                        highest = highest.max(n);
                    }
                    doc.saved_views.push(record);
                }
                Err(err) => warn!(%err, "skipping unreadable legacy view record"),
            }
        }
        doc.next_view_number = doc.next_view_number.max(highest + 1);
        let migrated = doc.saved_views.len();
        self.save_document(host, &doc)?;
        host.clear_legacy_views();
        debug!(migrated, "migrated legacy view records");
        Ok(migrated)
    }
}

/// Numeric suffix of a default "View N" name.
fn default_name_ordinal(name: &str) -> Option<u64> {
    name.strip_prefix("View ")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vantage_host::MockHost;
    use vantage_pose::ViewPose;

    fn record(name: &str) -> ViewRecord {
        ViewRecord::from_pose(name, 1, &ViewPose::default())
    }

    #[test]
    fn add_list_round_trip() {
        let mut host = MockHost::new();
        let store = ViewStore::new();
        assert!(store.list(&host).is_empty());

        let index = store.add(&mut host, record("View 1")).unwrap();
        assert_eq!(index, 0);
        let views = store.list(&host);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "View 1");
    }

    #[test]
    fn corrupted_blob_reads_empty_and_blocks_mutation() {
        let mut host = MockHost::new();
        let store = ViewStore::new();
        host.write_data_blob(DATA_BLOCK_NAME, "{not json").unwrap();

        assert!(store.list(&host).is_empty());
        let err = store.add(&mut host, record("V"));
        assert!(matches!(err, Err(StorageError::Corrupted)), "got {err:?}");

        store.reset_storage(&mut host).unwrap();
        store.add(&mut host, record("V")).unwrap();
        assert_eq!(store.list(&host).len(), 1);
    }

    #[test]
    fn reorder_swaps() {
        let mut host = MockHost::new();
        let store = ViewStore::new();
        store.add(&mut host, record("A")).unwrap();
        store.add(&mut host, record("B")).unwrap();
        store.add(&mut host, record("C")).unwrap();

        store.reorder(&mut host, 0, 2).unwrap();
        let names: Vec<String> = store.list(&host).into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["C", "B", "A"]);

        let err = store.reorder(&mut host, 0, 9);
        assert!(matches!(err, Err(StorageError::OutOfRange(9))));
    }

    #[test]
    fn ordinal_is_monotonic_and_persisted() {
        let mut host = MockHost::new();
        let store = ViewStore::new();
        assert_eq!(store.next_ordinal(&mut host).unwrap(), 1);
        assert_eq!(store.next_ordinal(&mut host).unwrap(), 2);

        // A second store instance sees the persisted counter.
        let other = ViewStore::new();
        assert_eq!(other.next_ordinal(&mut host).unwrap(), 3);
    }

    #[test]
    fn migration_converts_legacy_records_once() {
        let mut host = MockHost::new();
        let store = ViewStore::new();
        host.push_legacy_view(json!({"name": "View 3", "distance": 4.0}));
        host.push_legacy_view(json!({"name": "Hero shot"}));

        assert_eq!(store.migrate_legacy(&mut host).unwrap(), 2);
        let doc = store.load_document(&host).unwrap();
        assert_eq!(doc.saved_views.len(), 2);
        assert_eq!(doc.next_view_number, 4);
        assert!(host.legacy_view_payloads().is_empty());

        // Non-empty canonical document: migration is a no-op.
        host.push_legacy_view(json!({"name": "View 9"}));
        assert_eq!(store.migrate_legacy(&mut host).unwrap(), 0);
    }

    #[test]
    fn set_field_suppressed_during_sync() {
        let mut host = MockHost::new();
        let store = ViewStore::new();
        store.add(&mut host, record("A")).unwrap();

        store.syncing.set(true);
        let written = store
            .set_field(&mut host, 0, &RecordField::Name("B".to_owned()))
            .unwrap();
        assert!(!written);
        store.syncing.set(false);

        let written = store
            .set_field(&mut host, 0, &RecordField::Name("B".to_owned()))
            .unwrap();
        assert!(written);
        assert_eq!(store.get(&host, 0).unwrap().name, "B");
    }
}

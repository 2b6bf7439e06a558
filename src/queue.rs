//! The image queue: every loaded file from load to export.
//!
//! A [`QueueStore`] owns an ordered list of [`QueuedImage`]s. Each entry has a
//! stable [`ImageId`], its source bytes, tags, editable metadata, a
//! user-overridable output base name, and an [`ImageState`].
//!
//! ## State machine
//!
//! ```text
//! Pending ──► Processing ──► Completed(result)
//!    ▲             │
//!    │             ▼
//!    └──────── Error(reason)
//! ```
//!
//! `Completed` carries its [`ProcessedOutput`], so an entry can never be seen
//! as completed without a result. `Error → Pending` is the retry edge taken by
//! a new batch run. Any other move is a [`TransitionError`].
//!
//! ## Buffers
//!
//! Every entry holds a lease on the store's buffer ledger for its source bytes,
//! and a second one once it has a result. Leases are released when the entry
//! is dropped: on [`QueueStore::remove_image`], [`QueueStore::clear_all`], or
//! when the store itself goes away. [`QueueStore::live_buffers`] reports the
//! count, so tests can check that nothing is leaked across a long session.
//!
//! Edits (tags, metadata, output name) never change the state.

use crate::metadata::{ImageMetadata, MetadataPatch};
use crate::naming::strip_extension;
use crate::taxonomy::TagList;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Opaque identity of a queued image, unique within its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{:06}", self.0)
    }
}

/// A file handed to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a file from disk, naming it after its final path component.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Result of a successful compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedOutput {
    /// `<outputFilename><tagSuffix>.<ext>`
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ProcessedOutput {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageState {
    Pending,
    Processing,
    Completed(ProcessedOutput),
    Error(String),
}

impl ImageState {
    pub fn status(&self) -> ImageStatus {
        match self {
            ImageState::Pending => ImageStatus::Pending,
            ImageState::Processing => ImageStatus::Processing,
            ImageState::Completed(_) => ImageStatus::Completed,
            ImageState::Error(_) => ImageStatus::Error,
        }
    }
}

/// Payload-free view of an [`ImageState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ImageStatus {
    fn can_move_to(self, next: ImageStatus) -> bool {
        use ImageStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Processing, Completed) | (Processing, Error) | (Error, Pending)
        )
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImageStatus::Pending => "pending",
            ImageStatus::Processing => "processing",
            ImageStatus::Completed => "completed",
            ImageStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("image {id} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub id: ImageId,
    pub from: ImageStatus,
    pub to: ImageStatus,
}

/// One live buffer registered with a store's ledger.
#[derive(Debug)]
struct Lease(Arc<AtomicUsize>);

impl Lease {
    fn acquire(ledger: &Arc<AtomicUsize>) -> Self {
        ledger.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(ledger))
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct QueuedImage {
    id: ImageId,
    source: SourceFile,
    state: ImageState,
    tags: TagList,
    metadata: ImageMetadata,
    output_filename: String,
    _preview: Lease,
    result_lease: Option<Lease>,
}

impl QueuedImage {
    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn source_name(&self) -> &str {
        &self.source.name
    }

    pub fn source_bytes(&self) -> &[u8] {
        &self.source.bytes
    }

    pub fn source_size(&self) -> usize {
        self.source.size()
    }

    pub fn state(&self) -> &ImageState {
        &self.state
    }

    pub fn status(&self) -> ImageStatus {
        self.state.status()
    }

    pub fn tags(&self) -> &TagList {
        &self.tags
    }

    pub fn metadata(&self) -> &ImageMetadata {
        &self.metadata
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    /// The result, present exactly when the image is completed.
    pub fn result(&self) -> Option<&ProcessedOutput> {
        match &self.state {
            ImageState::Completed(output) => Some(output),
            _ => None,
        }
    }
}

/// Ordered collection of queued images.
#[derive(Debug, Default)]
pub struct QueueStore {
    entries: Vec<QueuedImage>,
    next_id: u64,
    ledger: Arc<AtomicUsize>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pending entry per file, in input order.
    pub fn add_images(&mut self, files: impl IntoIterator<Item = SourceFile>) -> Vec<ImageId> {
        let mut ids = Vec::new();
        for source in files {
            self.next_id += 1;
            let id = ImageId(self.next_id);
            let metadata = ImageMetadata::for_file(&source.name);
            let output_filename = strip_extension(&source.name).to_string();
            log::debug!("Queued {} as {}", source.name, id);
            self.entries.push(QueuedImage {
                id,
                source,
                state: ImageState::Pending,
                tags: TagList::new(),
                metadata,
                output_filename,
                _preview: Lease::acquire(&self.ledger),
                result_lease: None,
            });
            ids.push(id);
        }
        ids
    }

    /// Returns `false` when the id is unknown.
    pub fn remove_image(&mut self, id: ImageId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear_all(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn get(&self, id: ImageId) -> Option<&QueuedImage> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedImage> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<ImageId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Completed entries with their results, in queue order.
    pub fn completed(&self) -> impl Iterator<Item = (&QueuedImage, &ProcessedOutput)> {
        self.entries
            .iter()
            .filter_map(|e| e.result().map(|output| (e, output)))
    }

    pub fn count_with_status(&self, status: ImageStatus) -> usize {
        self.entries.iter().filter(|e| e.status() == status).count()
    }

    /// Source and result buffers currently held by entries of this store.
    pub fn live_buffers(&self) -> usize {
        self.ledger.load(Ordering::SeqCst)
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Replace an entry's tags wholesale. Duplicates and blanks are dropped.
    pub fn update_tags<S: AsRef<str>>(&mut self, id: ImageId, tags: &[S]) -> bool {
        self.edit(id, |e| e.tags = tags.iter().collect())
    }

    /// Add a tag if absent, remove it if present.
    pub fn toggle_tag(&mut self, id: ImageId, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.edit(id, |e| {
            if !e.tags.remove(tag) {
                e.tags.add(tag);
            }
        })
    }

    /// Returns `true` only if the tag was newly added.
    pub fn add_tag(&mut self, id: ImageId, tag: &str) -> bool {
        match self.entry_mut(id) {
            Some(e) => e.tags.add(tag),
            None => false,
        }
    }

    pub fn update_metadata(&mut self, id: ImageId, patch: MetadataPatch) -> bool {
        self.edit(id, |e| e.metadata.apply(patch))
    }

    pub fn update_output_filename(&mut self, id: ImageId, name: &str) -> bool {
        self.edit(id, |e| e.output_filename = name.to_string())
    }

    /// Union `tags` into every entry, whatever its state.
    pub fn batch_add_tags<S: AsRef<str>>(&mut self, tags: &[S]) {
        for entry in &mut self.entries {
            entry.tags.merge(tags.iter().map(|t| t.as_ref()));
        }
    }

    pub fn clear_all_tags(&mut self) {
        for entry in &mut self.entries {
            entry.tags = TagList::new();
        }
    }

    // ------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------

    /// Move an entry to `next`, attaching any result in the same step.
    ///
    /// Returns `Ok(false)` when the id is unknown.
    pub fn set_state(&mut self, id: ImageId, next: ImageState) -> Result<bool, TransitionError> {
        let ledger = Arc::clone(&self.ledger);
        let Some(entry) = self.entry_mut(id) else {
            return Ok(false);
        };

        let from = entry.status();
        let to = next.status();
        if !from.can_move_to(to) {
            return Err(TransitionError { id, from, to });
        }

        entry.result_lease = match &next {
            ImageState::Completed(_) => Some(Lease::acquire(&ledger)),
            _ => None,
        };
        entry.state = next;
        Ok(true)
    }

    fn position(&self, id: ImageId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn entry_mut(&mut self, id: ImageId) -> Option<&mut QueuedImage> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    fn edit(&mut self, id: ImageId, apply: impl FnOnce(&mut QueuedImage)) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                apply(entry);
                true
            }
            None => false,
        }
    }
}

//! One editing session: settings, queue, processing and export wired together.
//!
//! [`Session`] is what a front end talks to. It owns the
//! [`SettingsService`] and the [`QueueStore`], borrows a [`Compressor`], and
//! adds the rules that span more than one component:
//!
//! - tags added to an image by hand are merged into the global vocabulary
//!   (persisted), so they are offered next time
//! - loading nothing, or processing an empty queue, is an input error
//! - processing always reads the current settings, or a per-run override
//!   that is never persisted
//! - export describes the completed files as they are, so images finished
//!   before a format change keep their extension and are still uploaded
//!
//! Dropping the session releases every queued buffer.

use crate::export::{ExportBundle, ExportError, Exporter};
use crate::imaging::Compressor;
use crate::process::{BatchSummary, ProcessEvent, ProcessingEngine};
use crate::queue::{ImageId, QueueStore, SourceFile, TransitionError};
use crate::settings::{ProcessingSettings, SettingsService};
use crate::storage::{KeyValueStore, StorageError};
use chrono::NaiveDate;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No images selected")]
    NoImages,
    #[error("Settings storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error("{0}")]
    Transition(#[from] TransitionError),
    #[error("{0}")]
    Export(#[from] ExportError),
}

pub struct Session<'c, S: KeyValueStore> {
    settings: SettingsService<S>,
    queue: QueueStore,
    compressor: &'c dyn Compressor,
    exporter: Exporter,
    processing_override: Option<ProcessingSettings>,
}

impl<'c, S: KeyValueStore> Session<'c, S> {
    pub fn new(settings: SettingsService<S>, compressor: &'c dyn Compressor) -> Self {
        Self {
            settings,
            queue: QueueStore::new(),
            compressor,
            exporter: Exporter::new(),
            processing_override: None,
        }
    }

    pub fn with_exporter(mut self, exporter: Exporter) -> Self {
        self.exporter = exporter;
        self
    }

    /// Use `value` for this session's processing and export only.
    pub fn override_processing(&mut self, value: ProcessingSettings) {
        self.processing_override = Some(value);
    }

    /// The processing settings in effect.
    pub fn processing(&self) -> &ProcessingSettings {
        self.processing_override
            .as_ref()
            .unwrap_or_else(|| self.settings.processing())
    }

    pub fn settings(&self) -> &SettingsService<S> {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsService<S> {
        &mut self.settings
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut QueueStore {
        &mut self.queue
    }

    /// Queue `files`. An empty selection is rejected.
    pub fn load_files(
        &mut self,
        files: impl IntoIterator<Item = SourceFile>,
    ) -> Result<Vec<ImageId>, SessionError> {
        let ids = self.queue.add_images(files);
        if ids.is_empty() {
            return Err(SessionError::NoImages);
        }
        log::info!("Queue ({} images)", self.queue.len());
        Ok(ids)
    }

    fn remember_tag(&mut self, tag: &str) -> Result<(), SessionError> {
        if self.settings.add_vocabulary_tag(tag)? {
            log::debug!("Added '{}' to the tag vocabulary", tag.trim());
        }
        Ok(())
    }

    /// Add an ad-hoc tag to one image and to the vocabulary.
    pub fn add_tag(&mut self, id: ImageId, tag: &str) -> Result<bool, SessionError> {
        let tag = tag.trim();
        if tag.is_empty() || self.queue.get(id).is_none() {
            return Ok(false);
        }
        let added = self.queue.add_tag(id, tag);
        self.remember_tag(tag)?;
        Ok(added)
    }

    /// Toggle a tag on one image; a tag switched on joins the vocabulary.
    pub fn toggle_tag(&mut self, id: ImageId, tag: &str) -> Result<bool, SessionError> {
        if !self.queue.toggle_tag(id, tag) {
            return Ok(false);
        }
        let now_set = self
            .queue
            .get(id)
            .is_some_and(|e| e.tags().contains(tag.trim()));
        if now_set {
            self.remember_tag(tag)?;
        }
        Ok(true)
    }

    /// Add `tags` to every queued image and to the vocabulary.
    pub fn batch_add_tags<T: AsRef<str>>(&mut self, tags: &[T]) -> Result<(), SessionError> {
        self.queue.batch_add_tags(tags);
        for tag in tags {
            self.remember_tag(tag.as_ref())?;
        }
        Ok(())
    }

    /// Drop every queued image. Returns how many were removed.
    pub fn clear_queue(&mut self) -> usize {
        let removed = self.queue.clear_all();
        log::info!("Queue cleared.");
        removed
    }

    /// Process every image that is not yet completed.
    pub fn process_all(
        &mut self,
        progress: Option<Sender<ProcessEvent>>,
    ) -> Result<BatchSummary, SessionError> {
        if self.queue.is_empty() {
            return Err(SessionError::NoImages);
        }
        let mut engine = ProcessingEngine::new(self.compressor);
        if let Some(tx) = progress {
            engine = engine.with_progress(tx);
        }
        let processing = *self.processing();
        Ok(engine.process_all(&mut self.queue, &processing)?)
    }

    /// Bundle every completed image, naming the archive after `date`.
    pub fn export(&self, date: NaiveDate) -> Result<ExportBundle, SessionError> {
        Ok(self
            .exporter
            .export(&self.queue, self.settings.ssh(), date)?)
    }
}

//! Processing engine: turns pending queue entries into compressed results.
//!
//! ## Single image
//!
//! [`ProcessingEngine::process_image`] only acts on a `Pending` entry; any
//! other state (or an unknown id) is a no-op. The entry moves to `Processing`,
//! the [`Compressor`] is called with the source bytes and the current
//! [`ProcessingSettings`], and the entry ends as either:
//!
//! - `Completed`, with result bytes and the derived file name
//!   (`<outputFilename>[ [tag tag]].<ext>`) attached in the same transition;
//!   a name another completed entry already holds gets a ` (n)` counter
//! - `Error`, with the compressor's message
//!
//! ## Batch
//!
//! [`ProcessingEngine::process_all`] targets every entry that is not already
//! `Completed`. Entries in `Error` are put back to `Pending` first, so they
//! are retried. Entries are processed strictly one after another, and a failed
//! entry never stops the batch. A [`ProcessEvent::BatchFinished`] summary is
//! always sent at the end, failures or not.
//!
//! ## Progress
//!
//! Events go through an optional `mpsc` sender; the CLI prints them from a
//! separate thread using [`crate::output::format_process_event`].

use crate::imaging::{CompressRequest, Compressor};
use crate::naming::{output_file_name, unique_file_name};
use crate::queue::{ImageId, ImageState, ImageStatus, ProcessedOutput, QueueStore, TransitionError};
use crate::settings::ProcessingSettings;
use std::sync::mpsc::Sender;

/// Progress notices emitted while processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        id: ImageId,
        source_name: String,
        /// 1-based position within the batch.
        index: usize,
        total: usize,
    },
    Completed {
        id: ImageId,
        source_name: String,
        file_name: String,
        original_size: usize,
        output_size: usize,
    },
    Failed {
        id: ImageId,
        source_name: String,
        reason: String,
    },
    BatchFinished(BatchSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
}

pub struct ProcessingEngine<'a> {
    compressor: &'a dyn Compressor,
    progress: Option<Sender<ProcessEvent>>,
}

impl<'a> ProcessingEngine<'a> {
    pub fn new(compressor: &'a dyn Compressor) -> Self {
        Self {
            compressor,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Sender<ProcessEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn emit(&self, event: ProcessEvent) {
        if let Some(tx) = &self.progress {
            // A dropped receiver only means nobody is listening
            tx.send(event).ok();
        }
    }

    /// Process one entry. Returns its final status, or `None` if the entry is
    /// missing or not pending.
    pub fn process_image(
        &self,
        queue: &mut QueueStore,
        id: ImageId,
        settings: &ProcessingSettings,
    ) -> Result<Option<ImageStatus>, TransitionError> {
        match queue.get(id) {
            Some(entry) if entry.status() == ImageStatus::Pending => {}
            Some(entry) => {
                log::debug!("Skipping {} ({})", id, entry.status());
                return Ok(None);
            }
            None => return Ok(None),
        }

        queue.set_state(id, ImageState::Processing)?;

        let Some(entry) = queue.get(id) else {
            return Ok(None);
        };
        let source_name = entry.source_name().to_string();
        let original_size = entry.source_size();
        let request = CompressRequest::new(entry.source_bytes(), settings);
        let file_name = unique_file_name(
            output_file_name(
                entry.output_filename(),
                entry.tags().as_slice(),
                settings.format,
            ),
            queue.completed().map(|(_, output)| output.file_name.as_str()),
        );
        let compressed = self.compressor.compress(&request);

        match compressed {
            Ok(bytes) => {
                let output_size = bytes.len();
                log::debug!(
                    "{} -> {} ({} -> {} bytes)",
                    source_name,
                    file_name,
                    original_size,
                    output_size
                );
                queue.set_state(
                    id,
                    ImageState::Completed(ProcessedOutput {
                        file_name: file_name.clone(),
                        bytes,
                    }),
                )?;
                self.emit(ProcessEvent::Completed {
                    id,
                    source_name,
                    file_name,
                    original_size,
                    output_size,
                });
                Ok(Some(ImageStatus::Completed))
            }
            Err(e) => {
                let reason = e.to_string();
                log::warn!("Failed to process {}: {}", source_name, reason);
                queue.set_state(id, ImageState::Error(reason.clone()))?;
                self.emit(ProcessEvent::Failed {
                    id,
                    source_name,
                    reason,
                });
                Ok(Some(ImageStatus::Error))
            }
        }
    }

    /// Process every entry that is not yet completed, one at a time.
    pub fn process_all(
        &self,
        queue: &mut QueueStore,
        settings: &ProcessingSettings,
    ) -> Result<BatchSummary, TransitionError> {
        let targets: Vec<ImageId> = queue
            .iter()
            .filter(|e| e.status() != ImageStatus::Completed)
            .map(|e| e.id())
            .collect();

        for id in &targets {
            if queue.get(*id).map(|e| e.status()) == Some(ImageStatus::Error) {
                queue.set_state(*id, ImageState::Pending)?;
            }
        }

        log::info!("Processing {} image(s) as {}", targets.len(), settings.format);

        let total = targets.len();
        let mut summary = BatchSummary::default();
        for (i, id) in targets.into_iter().enumerate() {
            if let Some(entry) = queue.get(id) {
                self.emit(ProcessEvent::Started {
                    id,
                    source_name: entry.source_name().to_string(),
                    index: i + 1,
                    total,
                });
            }
            match self.process_image(queue, id, settings)? {
                Some(ImageStatus::Completed) => summary.completed += 1,
                Some(ImageStatus::Error) => summary.failed += 1,
                _ => continue,
            }
            summary.attempted += 1;
        }

        log::info!(
            "Processed {} image(s): {} completed, {} failed",
            summary.attempted,
            summary.completed,
            summary.failed
        );
        self.emit(ProcessEvent::BatchFinished(summary));
        Ok(summary)
    }
}

//! Settings model and its persistence.
//!
//! Four independent settings categories, each persisted as JSON under its own
//! fixed key in a [`KeyValueStore`]:
//!
//! | Key | Value | Default |
//! |---|---|---|
//! | `wp-optimiser.processing` | [`ProcessingSettings`] | `maxWidth=1200, quality=0.8, format=webp` |
//! | `wp-optimiser.ssh` | [`SshSettings`] | all empty, port unset |
//! | `wp-optimiser.global-tags` | [`TagVocabulary`] | `Mobile, Desktop, Product, Lifestyle, Banner` |
//! | `wp-optimiser.tag-settings` | [`TagSettings`] | seeded from the vocabulary key if present, else empty |
//!
//! ## No validation
//!
//! Settings accept anything that has the right shape. A quality of `1.5` is
//! stored and handed to the compressor unchanged; the compressor is the one
//! that refuses it, per image, at processing time.
//!
//! ## Plaintext password
//!
//! [`SshSettings::password`] is stored in plaintext, and the export bundle
//! copies it into `ssh-config.txt`, where the exported scripts read it for
//! `sshpass`.
//!
//! ## Migration
//!
//! Older releases kept only the global tag list. When the tag-settings key is
//! missing but the global-tag key exists, the WordPress tag list is seeded
//! from it.

use crate::storage::{KeyValueStore, StorageError};
use crate::taxonomy::{TagList, TagSettings};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PROCESSING_KEY: &str = "wp-optimiser.processing";
pub const SSH_KEY: &str = "wp-optimiser.ssh";
pub const GLOBAL_TAGS_KEY: &str = "wp-optimiser.global-tags";
pub const TAG_SETTINGS_KEY: &str = "wp-optimiser.tag-settings";

/// Vocabulary shipped with a fresh install.
pub const DEFAULT_TAGS: &[&str] = &["Mobile", "Desktop", "Product", "Lifestyle", "Banner"];

/// Port used when the SSH settings leave it unset.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// The global tag vocabulary offered for per-image and batch tagging.
pub type TagVocabulary = TagList;

/// Default vocabulary.
pub fn default_vocabulary() -> TagVocabulary {
    DEFAULT_TAGS.iter().collect()
}

// ============================================================================
// Processing settings
// ============================================================================

/// Output encoding. Determines both the encoder and the file extension used
/// in the queue, the CSV and the scripts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webp,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Canonical file extension (no dot).
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::Webp),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(format!("unknown output format {other:?} (expected webp, jpeg or png)")),
        }
    }
}

/// Parameters shared by every image in a processing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessingSettings {
    /// Longest edge, in pixels, after resizing.
    pub max_width: u32,
    /// Encoder quality in (0, 1].
    pub quality: f32,
    pub format: OutputFormat,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_width: 1200,
            quality: 0.8,
            format: OutputFormat::Webp,
        }
    }
}

// ============================================================================
// SSH settings
// ============================================================================

/// Connection details for the generated upload/import scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshSettings {
    pub host: String,
    /// `0` means unset; exports fall back to [`DEFAULT_SSH_PORT`].
    pub port: u16,
    pub username: String,
    pub password: String,
    /// WordPress root directory on the server.
    #[serde(alias = "wpPath")]
    pub remote_path: String,
}

impl SshSettings {
    /// Host, username and remote path are all non-empty.
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.remote_dir().is_empty()
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn effective_port(&self) -> u16 {
        if self.port == 0 {
            DEFAULT_SSH_PORT
        } else {
            self.port
        }
    }

    /// `user@host`
    pub fn target(&self) -> String {
        format!("{}@{}", self.username.trim(), self.host.trim())
    }

    /// The WordPress directory as every script uses it, trimmed.
    pub fn remote_dir(&self) -> &str {
        self.remote_path.trim()
    }

    /// `user@host:<remote dir>/`, the scp destination.
    pub fn upload_target(&self) -> String {
        format!("{}:{}/", self.target(), self.remote_dir())
    }
}

// ============================================================================
// Settings service
// ============================================================================

/// Explicit settings holder with load/save against an injected store.
///
/// Each `update_*` replaces one category wholesale and persists it
/// immediately. Reads never touch storage after [`SettingsService::load`].
#[derive(Debug)]
pub struct SettingsService<S: KeyValueStore> {
    store: S,
    processing: ProcessingSettings,
    ssh: SshSettings,
    vocabulary: TagVocabulary,
    tag_settings: TagSettings,
}

impl<S: KeyValueStore> SettingsService<S> {
    /// Load every category, falling back to defaults for missing or
    /// unreadable values. Only storage I/O failures are errors.
    pub fn load(store: S) -> Result<Self, StorageError> {
        let processing = load_or_default(&store, PROCESSING_KEY, ProcessingSettings::default)?;
        let ssh = load_or_default(&store, SSH_KEY, SshSettings::default)?;
        let stored_vocabulary: Option<TagVocabulary> = load_value(&store, GLOBAL_TAGS_KEY)?;
        let tag_settings = match load_value::<TagSettings>(&store, TAG_SETTINGS_KEY)? {
            Some(settings) => settings,
            None => match &stored_vocabulary {
                Some(legacy) => {
                    log::info!(
                        "Seeding tag settings from legacy {} ({} tags)",
                        GLOBAL_TAGS_KEY,
                        legacy.len()
                    );
                    TagSettings::from_legacy(legacy)
                }
                None => TagSettings::default(),
            },
        };
        let vocabulary = stored_vocabulary.unwrap_or_else(default_vocabulary);

        Ok(Self {
            store,
            processing,
            ssh,
            vocabulary,
            tag_settings,
        })
    }

    pub fn processing(&self) -> &ProcessingSettings {
        &self.processing
    }

    pub fn ssh(&self) -> &SshSettings {
        &self.ssh
    }

    pub fn vocabulary(&self) -> &TagVocabulary {
        &self.vocabulary
    }

    pub fn tag_settings(&self) -> &TagSettings {
        &self.tag_settings
    }

    pub fn update_processing(&mut self, value: ProcessingSettings) -> Result<(), StorageError> {
        self.processing = value;
        save_value(&mut self.store, PROCESSING_KEY, &self.processing)
    }

    pub fn update_ssh(&mut self, value: SshSettings) -> Result<(), StorageError> {
        self.ssh = value;
        save_value(&mut self.store, SSH_KEY, &self.ssh)
    }

    pub fn update_vocabulary(&mut self, value: TagVocabulary) -> Result<(), StorageError> {
        self.vocabulary = value;
        save_value(&mut self.store, GLOBAL_TAGS_KEY, &self.vocabulary)
    }

    pub fn update_tag_settings(&mut self, value: TagSettings) -> Result<(), StorageError> {
        self.tag_settings = value;
        save_value(&mut self.store, TAG_SETTINGS_KEY, &self.tag_settings)
    }

    /// Add a tag to the vocabulary; persists only when it was new.
    pub fn add_vocabulary_tag(&mut self, tag: &str) -> Result<bool, StorageError> {
        let mut vocabulary = self.vocabulary.clone();
        if !vocabulary.add(tag) {
            return Ok(false);
        }
        self.update_vocabulary(vocabulary)?;
        Ok(true)
    }

    /// Remove a tag from the vocabulary; absent tags leave it unchanged.
    pub fn remove_vocabulary_tag(&mut self, tag: &str) -> Result<bool, StorageError> {
        let mut vocabulary = self.vocabulary.clone();
        if !vocabulary.remove(tag) {
            return Ok(false);
        }
        self.update_vocabulary(vocabulary)?;
        Ok(true)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

fn load_value<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            log::warn!("Ignoring unreadable value for {key}: {e}");
            Ok(None)
        }
    }
}

fn load_or_default<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
    default: impl FnOnce() -> T,
) -> Result<T, StorageError> {
    Ok(load_value(store, key)?.unwrap_or_else(default))
}

fn save_value<T: Serialize>(
    store: &mut impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use solfa_domain::{Config, ConfigPatch};
use tracing::{debug, info, instrument, warn};

use crate::error::QuizError;

/// Single durable key the preferences are stored under.
pub const CONFIG_KEY: &str = "notes-app-config";

pub trait ConfigBackend {
    fn read(&self) -> Result<Option<String>, QuizError>;
    fn write(&mut self, data: &str) -> Result<(), QuizError>;
}

impl<T: ConfigBackend + ?Sized> ConfigBackend for Box<T> {
    fn read(&self) -> Result<Option<String>, QuizError> {
        (**self).read()
    }

    fn write(&mut self, data: &str) -> Result<(), QuizError> {
        (**self).write(data)
    }
}

/// JSON file in the user's configuration directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Option<Self> {
        let base = dirs::config_dir()?;
        Some(Self::new(
            base.join("solfa").join(format!("{CONFIG_KEY}.json")),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigBackend for FileBackend {
    fn read(&self) -> Result<Option<String>, QuizError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(QuizError::storage(&self.path, err)),
        }
    }

    fn write(&mut self, data: &str) -> Result<(), QuizError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| QuizError::storage(parent, err))?;
        }
        std::fs::write(&self.path, data).map_err(|err| QuizError::storage(&self.path, err))
    }
}

/// Keeps the record in memory; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Option<String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl ConfigBackend for MemoryBackend {
    fn read(&self) -> Result<Option<String>, QuizError> {
        Ok(self.data.clone())
    }

    fn write(&mut self, data: &str) -> Result<(), QuizError> {
        self.data = Some(data.to_string());
        Ok(())
    }
}

/// Current preferences plus the boundary they are loaded from and saved to.
pub struct ConfigStore<B> {
    backend: B,
    config: Config,
}

impl<B: ConfigBackend> ConfigStore<B> {
    /// Reads the persisted record onto defaults. Fields that do not parse
    /// keep their default; an unreadable record yields plain defaults.
    #[instrument(skip(backend))]
    pub fn load(backend: B) -> Self {
        let config = match backend.read() {
            Ok(Some(text)) => merge_record(&text).unwrap_or_default(),
            Ok(None) => {
                info!("no persisted preferences, using defaults");
                Config::default()
            }
            Err(err) => {
                warn!(%err, "could not read preferences, using defaults");
                Config::default()
            }
        };
        Self { backend, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Merges `patch` and persists the result. Values are stored as given.
    #[instrument(skip(self))]
    pub fn update(&mut self, patch: &ConfigPatch) -> Result<&Config, QuizError> {
        if patch.is_empty() {
            return Ok(&self.config);
        }
        self.config.merge(patch);
        let json = serde_json::to_string(&self.config)?;
        self.backend.write(&json)?;
        debug!(config = ?self.config, "persisted preferences");
        Ok(&self.config)
    }
}

fn merge_record(text: &str) -> Option<Config> {
    let fields = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => {
            warn!("persisted preferences are not an object, using defaults");
            return None;
        }
        Err(err) => {
            warn!(%err, "persisted preferences are malformed, using defaults");
            return None;
        }
    };
    let mut config = Config::default();
    for (key, value) in fields {
        let mut single = Map::new();
        single.insert(key.clone(), value);
        match serde_json::from_value::<ConfigPatch>(Value::Object(single)) {
            Ok(patch) => config.merge(&patch),
            Err(err) => warn!(field = %key, %err, "ignoring malformed preference"),
        }
    }
    debug!(?config, "loaded preferences");
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solfa_domain::{Clef, Mode, Notation};

    #[test]
    fn fresh_install_uses_defaults() {
        let store = ConfigStore::load(MemoryBackend::new());
        assert_eq!(store.config(), &Config::default());
        assert!(store.backend().contents().is_none());
    }

    #[test]
    fn malformed_record_falls_back_to_defaults() {
        for bad in ["{not json", "[1,2,3]", r#"{"clef":"alto"}"#, r#"{"notesToShow":-1}"#] {
            let store = ConfigStore::load(MemoryBackend::with_contents(bad));
            assert_eq!(store.config(), &Config::default(), "input {bad}");
        }
    }

    #[test]
    fn bad_field_keeps_the_valid_ones() {
        let record = r#"{"clef":"bass","notation":"english","notesToShow":300}"#;
        let store = ConfigStore::load(MemoryBackend::with_contents(record));
        let config = store.config();
        assert_eq!(config.clef, Clef::Bass);
        assert_eq!(config.notation, Notation::English);
        assert_eq!(config.notes_to_show, Config::default().notes_to_show);
    }

    #[test]
    fn partial_record_merges_onto_defaults() {
        let store = ConfigStore::load(MemoryBackend::with_contents(
            r#"{"clef":"bass","notation":"english"}"#,
        ));
        assert_eq!(store.config().clef, Clef::Bass);
        assert_eq!(store.config().notation, Notation::English);
        assert_eq!(store.config().mode, Mode::Practice);
        assert!(store.config().sound_enabled);
    }

    #[test]
    fn update_persists_merged_config() {
        let mut store = ConfigStore::load(MemoryBackend::new());
        store.update(&ConfigPatch::mode(Mode::Flashcards)).unwrap();
        store.update(&ConfigPatch::notes_to_show(3)).unwrap();
        let persisted: Config =
            serde_json::from_str(store.backend().contents().unwrap()).unwrap();
        assert_eq!(persisted.mode, Mode::Flashcards);
        assert_eq!(persisted.notes_to_show, 3);
    }

    #[test]
    fn out_of_range_counts_are_stored_as_given() {
        let mut store = ConfigStore::load(MemoryBackend::new());
        store.update(&ConfigPatch::notes_to_show(12)).unwrap();
        assert_eq!(store.config().notes_to_show, 12);
        assert_eq!(store.config().round_len(), 3);
    }

    #[test]
    fn empty_patch_is_idempotent() {
        let original = r#"{ "clef": "bass", "notesToShow": 2 }"#;
        let mut store = ConfigStore::load(MemoryBackend::with_contents(original));
        let before = store.config().clone();
        store.update(&ConfigPatch::default()).unwrap();
        assert_eq!(store.config(), &before);
        assert_eq!(store.backend().contents(), Some(original));
    }

    #[test]
    fn file_backend_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(format!("{CONFIG_KEY}.json"));
        let mut store = ConfigStore::load(FileBackend::new(&path));
        assert_eq!(store.config(), &Config::default());
        store.update(&ConfigPatch::sound_enabled(false)).unwrap();

        let reloaded = ConfigStore::load(FileBackend::new(&path));
        assert!(!reloaded.config().sound_enabled);
        assert_eq!(reloaded.backend().path(), path.as_path());
    }

    #[test]
    fn boxed_backends_behave_like_their_inner_backend() {
        let backend: Box<dyn ConfigBackend> = Box::new(MemoryBackend::new());
        let mut store = ConfigStore::load(backend);
        store.update(&ConfigPatch::clef(Clef::Bass)).unwrap();
        let stored = store.backend().read().unwrap().unwrap();
        assert!(stored.contains(r#""clef":"bass""#));
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let store = ConfigStore::load(FileBackend::new(dir.path()));
        assert_eq!(store.config(), &Config::default());
    }
}

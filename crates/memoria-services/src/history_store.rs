//! JSON files as the history store

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use memoria_core::{HistoryStore, MemoriaError, Step, VoiceId};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed history in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to encode history: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("No data directory available")]
    NoDataDir,
}

impl From<StoreError> for MemoriaError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(io) => MemoriaError::Io(io),
            other => MemoriaError::Persistence(other.to_string()),
        }
    }
}

/// One `<voice>.json` file per voice, each an array like `["C4", "rest"]`
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    dir: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<data_dir>/memoria/history`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("memoria").join("history"))
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::default_dir().map(Self::new).ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, voice: VoiceId) -> PathBuf {
        self.dir.join(format!("{voice}.json"))
    }

    /// A missing file is an empty history
    pub fn read(&self, voice: VoiceId) -> Result<Vec<Step>, StoreError> {
        let path = self.path_for(voice);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&contents).map_err(|source| StoreError::Parse { path, source })
    }

    /// Written to a sibling temp file, then renamed into place
    pub fn write(&self, voice: VoiceId, history: &[Step]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(history).map_err(StoreError::Encode)?;
        let path = self.path_for(voice);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(voice = %voice, entries = history.len(), path = %path.display(), "History written");
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load_history(&mut self, voice: VoiceId) -> memoria_core::Result<Vec<Step>> {
        Ok(self.read(voice)?)
    }

    fn save_history(&mut self, voice: VoiceId, history: &[Step]) -> memoria_core::Result<()> {
        Ok(self.write(voice, history)?)
    }
}

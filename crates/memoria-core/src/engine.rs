//! Seams to the outside world: sound output and history persistence

use std::collections::HashMap;

use crate::error::Result;
use crate::history::Step;
use crate::note::Note;
use crate::voice::VoiceId;

/// Receives note triggers. Synthesis lives entirely behind this trait.
pub trait SoundEngine {
    /// Sound `notes` together for `duration` seconds starting at `time`
    /// (seconds since the transport started).
    fn trigger_note(&mut self, voice: VoiceId, notes: &[Note], duration: f64, time: f64);
}

/// Loads and saves per-voice histories
pub trait HistoryStore {
    fn load_history(&mut self, voice: VoiceId) -> Result<Vec<Step>>;
    fn save_history(&mut self, voice: VoiceId, history: &[Step]) -> Result<()>;
}

/// Store used when persistence is disabled: nothing loads, saves are dropped
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl HistoryStore for NoPersistence {
    fn load_history(&mut self, _voice: VoiceId) -> Result<Vec<Step>> {
        Ok(Vec::new())
    }

    fn save_history(&mut self, _voice: VoiceId, _history: &[Step]) -> Result<()> {
        Ok(())
    }
}

/// In-process store, mainly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    histories: HashMap<VoiceId, Vec<Step>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, voice: VoiceId, history: Vec<Step>) {
        self.histories.insert(voice, history);
    }

    pub fn get(&self, voice: VoiceId) -> Option<&[Step]> {
        self.histories.get(&voice).map(Vec::as_slice)
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load_history(&mut self, voice: VoiceId) -> Result<Vec<Step>> {
        Ok(self.histories.get(&voice).cloned().unwrap_or_default())
    }

    fn save_history(&mut self, voice: VoiceId, history: &[Step]) -> Result<()> {
        self.histories.insert(voice, history.to_vec());
        Ok(())
    }
}

impl<T: SoundEngine + ?Sized> SoundEngine for Box<T> {
    fn trigger_note(&mut self, voice: VoiceId, notes: &[Note], duration: f64, time: f64) {
        (**self).trigger_note(voice, notes, duration, time);
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn load_history(&mut self, voice: VoiceId) -> Result<Vec<Step>> {
        (**self).load_history(voice)
    }

    fn save_history(&mut self, voice: VoiceId, history: &[Step]) -> Result<()> {
        (**self).save_history(voice, history)
    }
}

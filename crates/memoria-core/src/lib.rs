//! memoria-core: Domain types for the memoria sequencer

pub mod config;
pub mod engine;
mod error;
pub mod gesture;
pub mod history;
pub mod note;
pub mod pattern;
pub mod scale;
pub mod selector;
pub mod sequencer;
pub mod transport;
pub mod voice;

pub use config::SequencerConfig;
pub use engine::{HistoryStore, MemoryHistoryStore, NoPersistence, SoundEngine};
pub use error::{MemoriaError, Result};
pub use gesture::{Gesture, GestureAction, GestureMapper};
pub use history::{Step, VoiceHistory};
pub use note::Note;
pub use pattern::{PatternBank, PatternSlot, PoolSource};
pub use scale::{Scale, ScaleMode};
pub use sequencer::Sequencer;
pub use transport::{Interval, Subdivision, TaskId, Tempo, Tick, TransportScheduler, TransportState, PPQ};
pub use voice::{VoiceConfig, VoiceId, VoiceState};

//! memoria-services: Persistence, sound output and the real-time runtime

pub mod history_store;
pub mod runtime;
pub mod sound;

pub use history_store::{JsonHistoryStore, StoreError};
pub use runtime::{RuntimeCommand, RuntimeError, RuntimeHandle, RuntimeOptions, SequencerRuntime};
pub use sound::{ChannelSoundEngine, LoggingSoundEngine, NoteTrigger};

//! Voice identities and per-voice settings

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::note::Note;
use crate::pattern::PoolSource;
use crate::transport::Subdivision;

/// Unique identifier for voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceId {
    Melody,
    Chord,
    Bass,
    Percussion,
    Pad,
}

impl VoiceId {
    pub const ALL: [VoiceId; 5] = [
        VoiceId::Melody,
        VoiceId::Chord,
        VoiceId::Bass,
        VoiceId::Percussion,
        VoiceId::Pad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Melody => "melody",
            Self::Chord => "chord",
            Self::Bass => "bass",
            Self::Percussion => "percussion",
            Self::Pad => "pad",
        }
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-voice lifecycle.
///
/// `Idle -> Scheduled -> Selecting -> Dispatching -> Recording -> Scheduled`,
/// back to `Idle` on teardown. A tick runs to completion inside one call, so
/// `Selecting`, `Dispatching` and `Recording` are transient: between calls a
/// voice is only ever observed as `Idle` or `Scheduled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Scheduled,
    Selecting,
    Dispatching,
    Recording,
}

/// Static settings for one voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub id: VoiceId,
    /// Repeat interval
    pub every: Subdivision,
    /// Length of each triggered note
    pub duration: Subdivision,
    pub pool: PoolSource,
    /// Semitone offsets sounded together with the chosen note
    #[serde(default)]
    pub intervals: Vec<i32>,
    /// Hit probability for gated voices; `None` always plays
    #[serde(default)]
    pub gate: Option<f64>,
}

impl VoiceConfig {
    pub fn new(id: VoiceId, every: Subdivision, duration: Subdivision, pool: PoolSource) -> Self {
        Self {
            id,
            every,
            duration,
            pool,
            intervals: Vec::new(),
            gate: None,
        }
    }

    pub fn with_intervals(mut self, intervals: &[i32]) -> Self {
        self.intervals = intervals.to_vec();
        self
    }

    pub fn with_gate(mut self, probability: f64) -> Self {
        self.gate = Some(probability);
        self
    }

    /// The chosen note followed by its derived notes
    pub fn voicing(&self, root: Note) -> Vec<Note> {
        std::iter::once(root)
            .chain(self.intervals.iter().map(|&i| root.transpose(i)))
            .collect()
    }
}

fn notes(midi: &[u8]) -> Vec<Note> {
    midi.iter().filter_map(|&m| Note::from_midi(m).ok()).collect()
}

/// The five-voice ambient patch
pub fn default_voices() -> Vec<VoiceConfig> {
    use Subdivision::*;

    vec![
        VoiceConfig::new(VoiceId::Melody, Quarter, Eighth, PoolSource::Scale { octave: 0 }),
        VoiceConfig::new(VoiceId::Chord, Whole, Whole, PoolSource::Scale { octave: 0 })
            .with_intervals(&[4, 7]),
        // C2 D2 E2 G2 A2
        VoiceConfig::new(VoiceId::Bass, Half, Quarter, PoolSource::Fixed(notes(&[36, 38, 40, 43, 45]))),
        VoiceConfig::new(VoiceId::Percussion, Eighth, Eighth, PoolSource::Fixed(notes(&[36])))
            .with_gate(0.5),
        VoiceConfig::new(VoiceId::Pad, Half, Half, PoolSource::Scale { octave: -1 })
            .with_intervals(&[4])
            .with_gate(0.5),
    ]
}

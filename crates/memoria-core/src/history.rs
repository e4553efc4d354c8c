//! Bounded per-voice memory of recent choices

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MemoriaError, Result};
use crate::note::Note;

const REST_NAME: &str = "rest";

/// One history entry: a sounded note, or an explicit "no event" marker left
/// by a gated voice that missed its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Step {
    Rest,
    Note(Note),
}

impl Step {
    pub fn note(&self) -> Option<&Note> {
        match self {
            Self::Note(n) => Some(n),
            Self::Rest => None,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rest => f.write_str(REST_NAME),
            Self::Note(n) => write!(f, "{n}"),
        }
    }
}

impl TryFrom<String> for Step {
    type Error = MemoriaError;

    fn try_from(value: String) -> Result<Self> {
        if value == REST_NAME {
            return Ok(Self::Rest);
        }
        Note::parse(&value).map(Self::Note)
    }
}

impl From<Step> for String {
    fn from(step: Step) -> Self {
        step.to_string()
    }
}

impl From<Note> for Step {
    fn from(note: Note) -> Self {
        Self::Note(note)
    }
}

/// FIFO of the last `max` entries, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceHistory<V> {
    entries: VecDeque<V>,
    max: usize,
}

impl<V> VoiceHistory<V> {
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max + 1),
            max,
        }
    }

    /// Rebuild from stored entries, keeping only the newest `max`
    pub fn from_entries(entries: impl IntoIterator<Item = V>, max: usize) -> Self {
        let mut history = Self::new(max);
        for entry in entries {
            history.record(entry);
        }
        history
    }

    /// Append at the tail, evicting the head once over capacity
    pub fn record(&mut self, value: V) {
        self.entries.push_back(value);
        if self.entries.len() > self.max {
            self.entries.pop_front();
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &V> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V: Clone> VoiceHistory<V> {
    pub fn to_vec(&self) -> Vec<V> {
        self.entries.iter().cloned().collect()
    }
}

impl VoiceHistory<Step> {
    /// Notes only; rests carry no selection weight
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.entries.iter().filter_map(Step::note)
    }

    pub fn rest_count(&self) -> usize {
        self.entries.iter().filter(|s| s.is_rest()).count()
    }
}

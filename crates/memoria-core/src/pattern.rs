//! Pattern bank: the candidate pool each voice selects from

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MemoriaError, Result};
use crate::note::Note;
use crate::scale::Scale;
use crate::voice::VoiceId;

/// Draw `length` notes uniformly, with replacement, from `scale`
pub fn regenerate(scale: &[Note], length: usize, rng: &mut Rng) -> Result<Vec<Note>> {
    if scale.is_empty() {
        return Err(MemoriaError::InvalidArgument("cannot draw a pool from an empty scale".into()));
    }
    if length == 0 {
        return Err(MemoriaError::InvalidArgument("pool length must be positive".into()));
    }
    Ok((0..length).map(|_| scale[rng.usize(..scale.len())]).collect())
}

/// Where a voice's pool is drawn from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolSource {
    /// The active scale shifted by whole octaves; redrawn on every scale swap
    Scale { octave: i8 },
    /// A fixed candidate list, drawn once per session
    Fixed(Vec<Note>),
}

impl PoolSource {
    pub fn follows_scale(&self) -> bool {
        matches!(self, Self::Scale { .. })
    }

    fn candidates(&self, scale: &Scale) -> Vec<Note> {
        match self {
            Self::Scale { octave } => scale.octave_shifted(*octave),
            Self::Fixed(notes) => notes.clone(),
        }
    }
}

/// A single voice's slot in the bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSlot {
    pub voice: VoiceId,
    pub source: PoolSource,
    /// Current candidate pool
    pub notes: Vec<Note>,
}

/// Pool slots for every voice of a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternBank {
    slots: Vec<PatternSlot>,
    /// Number of notes drawn per pool
    length: usize,
}

impl PatternBank {
    /// Draw an initial pool for every `(voice, source)` pair
    pub fn new(
        sources: impl IntoIterator<Item = (VoiceId, PoolSource)>,
        scale: &Scale,
        length: usize,
        rng: &mut Rng,
    ) -> Result<Self> {
        let slots = sources
            .into_iter()
            .map(|(voice, source)| {
                let notes = regenerate(&source.candidates(scale), length, rng)?;
                Ok(PatternSlot { voice, source, notes })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { slots, length })
    }

    pub fn slots(&self) -> &[PatternSlot] {
        &self.slots
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Current pool for a voice (empty if the voice has no slot)
    pub fn pool(&self, voice: VoiceId) -> &[Note] {
        self.slot(voice).map(|s| s.notes.as_slice()).unwrap_or_default()
    }

    fn slot(&self, voice: VoiceId) -> Option<&PatternSlot> {
        self.slots.iter().find(|s| s.voice == voice)
    }

    fn slot_mut(&mut self, voice: VoiceId) -> Option<&mut PatternSlot> {
        self.slots.iter_mut().find(|s| s.voice == voice)
    }

    /// Redraw every scale-derived pool. Fixed pools are left alone.
    pub fn regenerate_from_scale(&mut self, scale: &Scale, rng: &mut Rng) -> Result<()> {
        for slot in self.slots.iter_mut().filter(|s| s.source.follows_scale()) {
            slot.notes = regenerate(&slot.source.candidates(scale), self.length, rng)?;
        }
        debug!(notes = scale.len(), "Regenerated scale-derived pools");
        Ok(())
    }

    /// Replace a voice's pool wholesale. Returns false if the voice has no slot.
    pub fn replace_pool(&mut self, voice: VoiceId, notes: Vec<Note>) -> bool {
        let Some(slot) = self.slot_mut(voice) else {
            return false;
        };
        slot.notes = notes;
        true
    }

    /// Shift every note of a voice's pool, clamped to the MIDI range
    pub fn transpose(&mut self, voice: VoiceId, semitones: i32) -> bool {
        let Some(slot) = self.slot_mut(voice) else {
            return false;
        };
        for note in &mut slot.notes {
            *note = note.transpose(semitones);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::parse_notes;
    use crate::scale::ScaleMode;

    fn c_pentatonic() -> Scale {
        Scale::from_mode(Note::MIDDLE_C, ScaleMode::Pentatonic)
    }

    #[test]
    fn test_regenerate_length_and_membership() {
        let mut rng = Rng::with_seed(5);
        let scale = c_pentatonic();
        for length in [1, 8, 16, 33] {
            let pool = regenerate(scale.notes(), length, &mut rng).unwrap();
            assert_eq!(pool.len(), length);
            assert!(pool.iter().all(|n| scale.contains(*n)));
        }
    }

    #[test]
    fn test_regenerate_rejects_empty_input() {
        let mut rng = Rng::with_seed(5);
        assert!(matches!(regenerate(&[], 8, &mut rng), Err(MemoriaError::InvalidArgument(_))));
        assert!(regenerate(c_pentatonic().notes(), 0, &mut rng).is_err());
    }

    #[test]
    fn test_bank_sources() {
        let mut rng = Rng::with_seed(11);
        let bass = parse_notes(&["C2", "D2"]).unwrap();
        let bank = PatternBank::new(
            [
                (VoiceId::Melody, PoolSource::Scale { octave: 0 }),
                (VoiceId::Pad, PoolSource::Scale { octave: -1 }),
                (VoiceId::Bass, PoolSource::Fixed(bass.clone())),
            ],
            &c_pentatonic(),
            8,
            &mut rng,
        )
        .unwrap();

        let scale = c_pentatonic();
        let lowered = Scale::new(scale.octave_shifted(-1)).unwrap();
        assert!(bank.pool(VoiceId::Melody).iter().all(|n| scale.contains(*n)));
        assert!(bank.pool(VoiceId::Pad).iter().all(|n| lowered.contains(*n)));
        assert!(bank.pool(VoiceId::Bass).iter().all(|n| bass.contains(n)));
        assert!(bank.pool(VoiceId::Chord).is_empty());
    }

    #[test]
    fn test_scale_swap_regenerates_only_scale_pools() {
        let mut rng = Rng::with_seed(3);
        let bass = parse_notes(&["C2", "D2", "E2"]).unwrap();
        let mut bank = PatternBank::new(
            [
                (VoiceId::Melody, PoolSource::Scale { octave: 0 }),
                (VoiceId::Bass, PoolSource::Fixed(bass)),
            ],
            &c_pentatonic(),
            8,
            &mut rng,
        )
        .unwrap();
        let bass_before = bank.pool(VoiceId::Bass).to_vec();

        let blues = Scale::from_mode(Note::parse("F4").unwrap(), ScaleMode::Blues);
        bank.regenerate_from_scale(&blues, &mut rng).unwrap();

        assert_eq!(bank.pool(VoiceId::Melody).len(), 8);
        assert!(bank.pool(VoiceId::Melody).iter().all(|n| blues.contains(*n)));
        assert_eq!(bank.pool(VoiceId::Bass), bass_before.as_slice());
    }

    #[test]
    fn test_transpose_and_replace() {
        let mut rng = Rng::with_seed(9);
        let mut bank = PatternBank::new(
            [(VoiceId::Melody, PoolSource::Fixed(vec![Note::MIDDLE_C]))],
            &c_pentatonic(),
            4,
            &mut rng,
        )
        .unwrap();

        assert!(bank.transpose(VoiceId::Melody, 1));
        assert!(bank.pool(VoiceId::Melody).iter().all(|n| n.name() == "C#4"));
        assert!(!bank.transpose(VoiceId::Bass, 1));

        assert!(bank.replace_pool(VoiceId::Melody, vec![]));
        assert!(bank.pool(VoiceId::Melody).is_empty());
    }
}

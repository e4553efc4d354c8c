//! Scales the pattern bank draws its pools from

use serde::{Deserialize, Serialize};

use crate::error::{MemoriaError, Result};
use crate::note::Note;

// ============================================================================
// Scale Modes
// ============================================================================

/// Scale/mode interval tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleMode {
    Major,
    Minor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Pentatonic,
    /// Major pentatonic with a lowered third (C D Eb G A)
    Kumoi,
    Blues,
}

impl ScaleMode {
    /// Get scale intervals (semitones from root)
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 2, 4, 5, 7, 9, 11],
            Self::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Self::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Self::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Self::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Self::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Self::Pentatonic => &[0, 2, 4, 7, 9],
            Self::Kumoi => &[0, 2, 3, 7, 9],
            Self::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
            Self::Dorian => "Dorian",
            Self::Phrygian => "Phrygian",
            Self::Lydian => "Lydian",
            Self::Mixolydian => "Mixolydian",
            Self::Pentatonic => "Pentatonic",
            Self::Kumoi => "Kumoi",
            Self::Blues => "Blues",
        }
    }
}

// ============================================================================
// Scale
// ============================================================================

/// An ordered set of allowed notes.
///
/// Scales are swapped wholesale; nothing edits one in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Note>", into = "Vec<Note>")]
pub struct Scale {
    notes: Vec<Note>,
}

impl Scale {
    /// Build from explicit notes. Duplicates are dropped, order is kept.
    pub fn new(notes: Vec<Note>) -> Result<Self> {
        if notes.is_empty() {
            return Err(MemoriaError::InvalidArgument("scale has no notes".into()));
        }
        Ok(Self { notes: dedup(notes) })
    }

    /// Scale notes in one octave starting at `root`. Degrees clamped at the
    /// top of the MIDI range collapse into one note.
    pub fn from_mode(root: Note, mode: ScaleMode) -> Self {
        let notes = mode
            .intervals()
            .iter()
            .map(|&interval| root.transpose(interval as i32));
        Self { notes: dedup(notes) }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, note: Note) -> bool {
        self.notes.contains(&note)
    }

    /// Same scale shifted by whole octaves
    pub fn octave_shifted(&self, octaves: i8) -> Vec<Note> {
        dedup(self.notes.iter().map(|n| n.transpose(octaves as i32 * 12)))
    }
}

impl TryFrom<Vec<Note>> for Scale {
    type Error = MemoriaError;

    fn try_from(notes: Vec<Note>) -> Result<Self> {
        Self::new(notes)
    }
}

impl From<Scale> for Vec<Note> {
    fn from(scale: Scale) -> Self {
        scale.notes
    }
}

/// Drop repeated notes, keeping first occurrences in order
fn dedup(notes: impl IntoIterator<Item = Note>) -> Vec<Note> {
    let mut unique: Vec<Note> = Vec::new();
    for note in notes {
        if !unique.contains(&note) {
            unique.push(note);
        }
    }
    unique
}

/// The four scales the ambient patch cycles through, rooted at C4
pub fn default_rotation() -> Vec<Scale> {
    [ScaleMode::Pentatonic, ScaleMode::Kumoi, ScaleMode::Major, ScaleMode::Minor]
        .into_iter()
        .map(|mode| Scale::from_mode(Note::MIDDLE_C, mode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::parse_notes;

    #[test]
    fn test_from_mode_matches_names() {
        let kumoi = Scale::from_mode(Note::MIDDLE_C, ScaleMode::Kumoi);
        assert_eq!(kumoi.notes(), parse_notes(&["C4", "D4", "Eb4", "G4", "A4"]).unwrap());

        let minor = Scale::from_mode(Note::MIDDLE_C, ScaleMode::Minor);
        assert_eq!(
            minor.notes(),
            parse_notes(&["C4", "D4", "Eb4", "F4", "G4", "Ab4", "Bb4"]).unwrap()
        );
    }

    #[test]
    fn test_default_rotation() {
        let scales = default_rotation();
        assert_eq!(scales.len(), 4);
        assert_eq!(scales[0].len(), 5);
        assert_eq!(scales[2].len(), 7);
        assert!(scales.iter().all(|s| s.contains(Note::MIDDLE_C)));
    }

    #[test]
    fn test_new_rejects_empty_and_dedups() {
        assert!(Scale::new(vec![]).is_err());
        let notes = parse_notes(&["C4", "E4", "C4"]).unwrap();
        let scale = Scale::new(notes).unwrap();
        assert_eq!(scale.len(), 2);
    }

    #[test]
    fn test_clamped_degrees_collapse() {
        let high = Note::from_midi(125).unwrap();
        let major = Scale::from_mode(high, ScaleMode::Major);
        let midi: Vec<u8> = major.notes().iter().map(|n| n.midi()).collect();
        assert_eq!(midi, vec![125, 127]);

        let c9 = Scale::from_mode(Note::parse("C9").unwrap(), ScaleMode::Pentatonic);
        assert_eq!(c9.len(), 4);
        assert_eq!(c9.octave_shifted(1), vec![Note::from_midi(127).unwrap()]);
    }

    #[test]
    fn test_octave_shifted() {
        let scale = Scale::from_mode(Note::MIDDLE_C, ScaleMode::Pentatonic);
        let down = scale.octave_shifted(-1);
        assert_eq!(down[0].name(), "C3");
        assert_eq!(down[4].name(), "A3");
    }
}

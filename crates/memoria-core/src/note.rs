//! Note values shared by every voice

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MemoriaError, Result};

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// A pitch as a MIDI note number (0-127).
///
/// Parsed from and printed as scientific pitch names, with C4 = 60. Flats are
/// accepted on input; output always uses sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note(u8);

impl Note {
    pub const MIDDLE_C: Note = Note(60);

    /// Create from a MIDI number, rejecting values above 127
    pub fn from_midi(midi: u8) -> Result<Self> {
        if midi > 127 {
            return Err(MemoriaError::InvalidNote(format!("MIDI number {midi} out of range")));
        }
        Ok(Self(midi))
    }

    pub fn midi(self) -> u8 {
        self.0
    }

    /// Parse a name like `C4`, `Eb4`, `F#3` or `A-1`
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || MemoriaError::InvalidNote(name.to_string());
        let mut chars = name.trim().chars();

        let letter = chars.next().ok_or_else(invalid)?;
        let base: i32 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave_str.parse().map_err(|_| invalid())?;
        let midi = (octave + 1) * 12 + base + accidental;
        if !(0..=127).contains(&midi) {
            return Err(invalid());
        }
        Ok(Self(midi as u8))
    }

    pub fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    pub fn name(self) -> String {
        format!("{}{}", SHARP_NAMES[self.pitch_class() as usize], self.octave())
    }

    /// Shift by semitones, clamped to the MIDI range
    pub fn transpose(self, semitones: i32) -> Self {
        Self((self.0 as i32 + semitones).clamp(0, 127) as u8)
    }

    /// Frequency in Hz (A4 = 440)
    pub fn frequency(self) -> f64 {
        440.0 * 2f64.powf((self.0 as f64 - 69.0) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Note {
    type Err = MemoriaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Note {
    type Error = MemoriaError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Note> for String {
    fn from(note: Note) -> Self {
        note.name()
    }
}

/// Parse a list of note names
pub fn parse_notes(names: &[&str]) -> Result<Vec<Note>> {
    names.iter().map(|n| Note::parse(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(Note::parse("C4").unwrap().midi(), 60);
        assert_eq!(Note::parse("Eb4").unwrap().midi(), 63);
        assert_eq!(Note::parse("D#4").unwrap().midi(), 63);
        assert_eq!(Note::parse("C2").unwrap().midi(), 36);
        assert_eq!(Note::parse("A-1").unwrap().midi(), 9);
        assert_eq!(Note::parse("G9").unwrap().midi(), 127);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Note::parse("").is_err());
        assert!(Note::parse("H4").is_err());
        assert!(Note::parse("C").is_err());
        assert!(Note::parse("G#9").is_err());
        assert!(matches!(Note::parse("Cx4"), Err(MemoriaError::InvalidNote(_))));
    }

    #[test]
    fn test_name_uses_sharps() {
        let eb = Note::parse("Eb4").unwrap();
        assert_eq!(eb.name(), "D#4");
        assert_eq!(Note::MIDDLE_C.to_string(), "C4");
    }

    #[test]
    fn test_transpose_clamps() {
        let c4 = Note::MIDDLE_C;
        assert_eq!(c4.transpose(1).name(), "C#4");
        assert_eq!(c4.transpose(-12).name(), "C3");
        assert_eq!(Note::from_midi(126).unwrap().transpose(5).midi(), 127);
        assert_eq!(Note::from_midi(2).unwrap().transpose(-5).midi(), 0);
    }

    #[test]
    fn test_frequency() {
        let a4 = Note::parse("A4").unwrap();
        assert!((a4.frequency() - 440.0).abs() < 1e-9);
        let a3 = Note::parse("A3").unwrap();
        assert!((a3.frequency() - 220.0).abs() < 1e-9);
    }

    #[test]
    fn test_string_round_trip() {
        let note = Note::parse("Bb3").unwrap();
        let name = String::from(note);
        assert_eq!(name, "A#3");
        assert_eq!(Note::try_from(name).unwrap(), note);
    }
}

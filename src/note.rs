//! Musical note numbers and their pitch-class names

use crate::{MidiError, Result};
use std::fmt;

/// Pitch-class names within an octave, sharps only
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A MIDI note number in the range 0-127
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Note(u8);

impl Note {
    /// Creates a note from a raw MIDI note number
    pub fn from_number(number: u8) -> Result<Self> {
        if number > 127 {
            return Err(MidiError::Range(format!(
                "note number {} out of range 0-127",
                number
            )));
        }
        Ok(Note(number))
    }

    /// Creates a note from a pitch class (0-11) and octave
    pub fn from_pitch_class_octave(pitch_class: u8, octave: u8) -> Result<Self> {
        if pitch_class > 11 {
            return Err(MidiError::Range(format!(
                "pitch class {} out of range 0-11",
                pitch_class
            )));
        }
        let number = octave as u16 * 12 + pitch_class as u16;
        if number > 127 {
            return Err(MidiError::Range(format!(
                "pitch class {} in octave {} exceeds note 127",
                pitch_class, octave
            )));
        }
        Ok(Note(number as u8))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn octave(&self) -> u8 {
        self.0 / 12
    }

    pub fn pitch_class(&self) -> u8 {
        self.0 % 12
    }

    /// Pitch-class name, e.g. "C#" for note 61
    pub fn name(&self) -> &'static str {
        PITCH_CLASS_NAMES[self.pitch_class() as usize]
    }

    /// Name plus octave, e.g. "C5" for note 60
    pub fn display_name(&self) -> String {
        format!("{}{}", self.name(), self.octave())
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

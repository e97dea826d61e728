use std::error::Error;
use std::fmt;

/// Custom error type for MIDI operations
#[derive(Debug)]
pub enum MidiError {
    /// A parameter value is outside its valid range
    Range(String),
    /// Error on the underlying byte transport
    Transport(String),
    /// The port or transport has been closed
    Closed,
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::Range(msg) => write!(f, "MIDI range error: {}", msg),
            MidiError::Transport(msg) => write!(f, "MIDI transport error: {}", msg),
            MidiError::Closed => write!(f, "MIDI port closed"),
        }
    }
}

impl Error for MidiError {}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

//! MIDI message types for the serial wire protocol
//!
//! This module provides the core message model, including:
//! - [`Message`] and [`MessageKind`] covering channel voice, channel mode,
//!   system common, system exclusive and real-time messages
//! - Validated constructors for application code
//! - Wire encoding ([`Message::to_bytes`]) and the stream decoder
//!   ([`Decoder`]) used by the port's receive loop

mod decode;
mod encode;

pub use decode::Decoder;

use crate::note::Note;
use crate::{MidiError, Result};
use std::time::{Duration, Instant};

/// Channel-wide mode commands, wire-encoded as Control Change
/// controllers 120-127
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    AllSoundOff,
    ResetControllers,
    LocalControl,
    AllNotesOff,
    OmniOff,
    OmniOn,
    MonoMode,
    PolyMode,
}

impl ChannelMode {
    /// The Control Change controller number carrying this mode on the wire
    pub fn controller(&self) -> u8 {
        match self {
            ChannelMode::AllSoundOff => 120,
            ChannelMode::ResetControllers => 121,
            ChannelMode::LocalControl => 122,
            ChannelMode::AllNotesOff => 123,
            ChannelMode::OmniOff => 124,
            ChannelMode::OmniOn => 125,
            ChannelMode::MonoMode => 126,
            ChannelMode::PolyMode => 127,
        }
    }

    pub fn from_controller(controller: u8) -> Option<Self> {
        match controller {
            120 => Some(ChannelMode::AllSoundOff),
            121 => Some(ChannelMode::ResetControllers),
            122 => Some(ChannelMode::LocalControl),
            123 => Some(ChannelMode::AllNotesOff),
            124 => Some(ChannelMode::OmniOff),
            125 => Some(ChannelMode::OmniOn),
            126 => Some(ChannelMode::MonoMode),
            127 => Some(ChannelMode::PolyMode),
            _ => None,
        }
    }
}

/// System exclusive vendor identifier: either a single nonzero byte or a
/// three-byte sequence whose first byte is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorId {
    Short(u8),
    Extended(u8, u8),
}

impl VendorId {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        match *bytes {
            [id] if id != 0 && id < 0x80 => Ok(VendorId::Short(id)),
            [0, a, b] if a < 0x80 && b < 0x80 => Ok(VendorId::Extended(a, b)),
            _ => Err(MidiError::Range(format!(
                "invalid sysex vendor id {:02X?}",
                bytes
            ))),
        }
    }

    /// The wire bytes of this identifier, as they follow the sysex status
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            VendorId::Short(id) => vec![id],
            VendorId::Extended(a, b) => vec![0, a, b],
        }
    }
}

/// One decoded or encodable MIDI event
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    // Channel voice
    NoteOff { channel: u8, note: Note, velocity: u8 },
    NoteOn { channel: u8, note: Note, velocity: u8 },
    PolyAftertouch { channel: u8, note: Note, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PitchBend { channel: u8, value: i16 },
    // Channel mode, a reserved slice of the Control Change space
    ChannelMode { channel: u8, mode: ChannelMode, value: u8 },
    // System common
    SysexBegin { vendor: VendorId },
    QuarterFrame { piece: u8, value: u8 },
    SongPosition { beats: u16 },
    SongSelect { song: u8 },
    TuneRequest,
    // System exclusive payload, synthesized by the decoder
    SysexData { data: Vec<u8> },
    SysexEnd,
    // Real-time
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    Reset,
}

impl MessageKind {
    /// Whether this is a single-byte real-time message, legal at any
    /// position in the byte stream
    pub fn is_realtime(&self) -> bool {
        matches!(
            self,
            MessageKind::TimingClock
                | MessageKind::Start
                | MessageKind::Continue
                | MessageKind::Stop
                | MessageKind::ActiveSensing
                | MessageKind::Reset
        )
    }
}

/// A MIDI message with its delivery timestamp
///
/// The timestamp defaults to construction time. A producer may move it into
/// the future before handing the message to [`Port::send`], scheduling it
/// for delayed delivery.
///
/// [`Port::send`]: crate::port::Port::send
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub timestamp: Instant,
    pub kind: MessageKind,
}

fn check_channel(channel: u8) -> Result<()> {
    if channel < 1 || channel > 16 {
        return Err(MidiError::Range(format!(
            "channel {} out of range 1-16",
            channel
        )));
    }
    Ok(())
}

fn check_data_byte(what: &str, value: u8) -> Result<()> {
    if value > 127 {
        return Err(MidiError::Range(format!(
            "{} {} out of range 0-127",
            what, value
        )));
    }
    Ok(())
}

impl Message {
    /// Wraps a message kind with a construction-time timestamp
    pub fn new(kind: MessageKind) -> Self {
        Message {
            timestamp: Instant::now(),
            kind,
        }
    }

    /// Returns the message rescheduled to the given instant
    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Returns the message rescheduled `delay` after now
    pub fn after(self, delay: Duration) -> Self {
        self.at(Instant::now() + delay)
    }

    pub fn note_on(channel: u8, note: Note, velocity: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("velocity", velocity)?;
        Ok(Message::new(MessageKind::NoteOn {
            channel,
            note,
            velocity,
        }))
    }

    pub fn note_off(channel: u8, note: Note, velocity: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("velocity", velocity)?;
        Ok(Message::new(MessageKind::NoteOff {
            channel,
            note,
            velocity,
        }))
    }

    pub fn poly_aftertouch(channel: u8, note: Note, pressure: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("pressure", pressure)?;
        Ok(Message::new(MessageKind::PolyAftertouch {
            channel,
            note,
            pressure,
        }))
    }

    pub fn control_change(channel: u8, controller: u8, value: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("controller", controller)?;
        check_data_byte("value", value)?;
        if let Some(mode) = ChannelMode::from_controller(controller) {
            return Ok(Message::new(MessageKind::ChannelMode {
                channel,
                mode,
                value,
            }));
        }
        Ok(Message::new(MessageKind::ControlChange {
            channel,
            controller,
            value,
        }))
    }

    pub fn program_change(channel: u8, program: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("program", program)?;
        Ok(Message::new(MessageKind::ProgramChange { channel, program }))
    }

    pub fn channel_pressure(channel: u8, pressure: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("pressure", pressure)?;
        Ok(Message::new(MessageKind::ChannelPressure { channel, pressure }))
    }

    pub fn pitch_bend(channel: u8, value: i16) -> Result<Self> {
        check_channel(channel)?;
        if value < -8192 || value > 8191 {
            return Err(MidiError::Range(format!(
                "pitch bend {} out of range -8192..8191",
                value
            )));
        }
        Ok(Message::new(MessageKind::PitchBend { channel, value }))
    }

    pub fn channel_mode(channel: u8, mode: ChannelMode, value: u8) -> Result<Self> {
        check_channel(channel)?;
        check_data_byte("value", value)?;
        Ok(Message::new(MessageKind::ChannelMode {
            channel,
            mode,
            value,
        }))
    }

    pub fn sysex_begin(vendor: &[u8]) -> Result<Self> {
        let vendor = VendorId::from_bytes(vendor)?;
        Ok(Message::new(MessageKind::SysexBegin { vendor }))
    }

    pub fn sysex_data(data: Vec<u8>) -> Result<Self> {
        if let Some(byte) = data.iter().find(|b| **b > 127) {
            return Err(MidiError::Range(format!(
                "sysex data byte {:#04X} has the status bit set",
                byte
            )));
        }
        Ok(Message::new(MessageKind::SysexData { data }))
    }

    pub fn sysex_end() -> Self {
        Message::new(MessageKind::SysexEnd)
    }

    pub fn quarter_frame(piece: u8, value: u8) -> Result<Self> {
        if piece > 0x0F || value > 0x0F {
            return Err(MidiError::Range(format!(
                "quarter frame piece {} / value {} out of nibble range",
                piece, value
            )));
        }
        Ok(Message::new(MessageKind::QuarterFrame { piece, value }))
    }

    pub fn song_position(beats: u16) -> Result<Self> {
        if beats > 0x3FFF {
            return Err(MidiError::Range(format!(
                "song position {} out of range 0-16383",
                beats
            )));
        }
        Ok(Message::new(MessageKind::SongPosition { beats }))
    }

    pub fn song_select(song: u8) -> Result<Self> {
        check_data_byte("song", song)?;
        Ok(Message::new(MessageKind::SongSelect { song }))
    }

    pub fn tune_request() -> Self {
        Message::new(MessageKind::TuneRequest)
    }

    pub fn timing_clock() -> Self {
        Message::new(MessageKind::TimingClock)
    }

    pub fn start() -> Self {
        Message::new(MessageKind::Start)
    }

    pub fn continue_playing() -> Self {
        Message::new(MessageKind::Continue)
    }

    pub fn stop() -> Self {
        Message::new(MessageKind::Stop)
    }

    pub fn active_sensing() -> Self {
        Message::new(MessageKind::ActiveSensing)
    }

    pub fn reset() -> Self {
        Message::new(MessageKind::Reset)
    }
}

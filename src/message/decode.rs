//! Stateful decoder turning a raw byte stream into messages
//!
//! One [`Decoder`] instance per byte source. Each call to
//! [`Decoder::read_message`] pulls bytes until a complete message is
//! available, carrying running status, partially read parameters and sysex
//! dump progress across calls so that real-time bytes can be surfaced the
//! moment they arrive.

use super::{ChannelMode, Message, MessageKind, VendorId};
use crate::note::Note;
use crate::transport::ByteSource;
use crate::Result;
use log::warn;

/// Upper bound on one synthesized sysex payload chunk, so an arbitrarily
/// long dump cannot grow a single buffer without bound
const SYSEX_CHUNK_LIMIT: usize = 4096;

enum DecodeState {
    /// Expecting a status byte, or a data byte under running status
    AwaitingStatus,
    /// Collecting the parameter bytes of a channel or system common message
    AwaitingParams { status: u8, first: Option<u8> },
    /// Collecting the 1- or 3-byte vendor identifier after a sysex status
    AwaitingVendor { bytes: Vec<u8> },
    /// Inside a sysex dump, accumulating payload bytes
    InSysex { buffer: Vec<u8> },
    /// Dump terminator handled while payload was pending; the synthesized
    /// end marker still has to be emitted
    SysexDrained,
}

/// Streaming MIDI wire decoder
pub struct Decoder {
    state: DecodeState,
    running_status: Option<u8>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            state: DecodeState::AwaitingStatus,
            running_status: None,
        }
    }

    /// Whether the decoder is currently inside a sysex dump
    pub fn in_sysex(&self) -> bool {
        matches!(
            self.state,
            DecodeState::AwaitingVendor { .. }
                | DecodeState::InSysex { .. }
                | DecodeState::SysexDrained
        )
    }

    /// Reads bytes from `source` until one complete message is decoded
    ///
    /// Malformed input is discarded with a diagnostic and decoding
    /// resynchronizes at the next status byte; only transport failures
    /// surface as errors.
    pub fn read_message<S: ByteSource>(&mut self, source: &mut S) -> Result<Message> {
        loop {
            if let DecodeState::SysexDrained = self.state {
                self.state = DecodeState::AwaitingStatus;
                return Ok(Message::sysex_end());
            }

            if let DecodeState::InSysex { .. } = self.state {
                if let Some(msg) = self.advance_sysex(source)? {
                    return Ok(msg);
                }
                continue;
            }

            let byte = source.read_byte()?;
            if byte >= 0xF8 {
                match realtime_message(byte) {
                    Some(msg) => return Ok(msg),
                    None => {
                        warn!("discarding undefined status byte {:#04X}", byte);
                        continue;
                    }
                }
            }

            if let Some(msg) = self.handle_byte(byte)? {
                return Ok(msg);
            }
        }
    }

    /// Advances a sysex dump by one byte, using lookahead so that a status
    /// byte other than the dump terminator is left for the next message
    fn advance_sysex<S: ByteSource>(&mut self, source: &mut S) -> Result<Option<Message>> {
        let next = source.peek_byte()?;

        if next >= 0xF8 {
            source.read_byte()?;
            let msg = realtime_message(next);
            if msg.is_none() {
                warn!("discarding undefined status byte {:#04X} inside sysex", next);
            }
            return Ok(msg);
        }

        if next >= 0x80 {
            // The dump ends here. Only the dedicated terminator is
            // consumed; any other status byte starts the next message.
            if next == 0xF7 {
                source.read_byte()?;
            }
            // Flush pending payload first; the end marker follows on the
            // next call.
            if let Some(chunk) = self.take_sysex_buffer() {
                self.state = DecodeState::SysexDrained;
                return Ok(Some(chunk));
            }
            self.state = DecodeState::AwaitingStatus;
            return Ok(Some(Message::sysex_end()));
        }

        source.read_byte()?;
        if let DecodeState::InSysex { buffer } = &mut self.state {
            buffer.push(next);
            if buffer.len() >= SYSEX_CHUNK_LIMIT {
                return Ok(self.take_sysex_buffer());
            }
        }
        Ok(None)
    }

    fn take_sysex_buffer(&mut self) -> Option<Message> {
        if let DecodeState::InSysex { buffer } = &mut self.state {
            if !buffer.is_empty() {
                let data = std::mem::take(buffer);
                return Some(Message::new(MessageKind::SysexData { data }));
            }
        }
        None
    }

    /// Feeds one non-real-time byte through the message state machine
    fn handle_byte(&mut self, byte: u8) -> Result<Option<Message>> {
        match std::mem::replace(&mut self.state, DecodeState::AwaitingStatus) {
            DecodeState::AwaitingStatus => self.handle_status_or_data(byte),
            DecodeState::AwaitingParams { status, first } => {
                if byte >= 0x80 {
                    warn!(
                        "discarding incomplete message (status {:#04X}), resyncing on {:#04X}",
                        status, byte
                    );
                    return self.handle_status_or_data(byte);
                }
                match (param_count(status), first) {
                    (1, _) => Ok(Some(complete_message(status, byte, 0)?)),
                    (_, None) => {
                        self.state = DecodeState::AwaitingParams {
                            status,
                            first: Some(byte),
                        };
                        Ok(None)
                    }
                    (_, Some(first)) => Ok(Some(complete_message(status, first, byte)?)),
                }
            }
            DecodeState::AwaitingVendor { mut bytes } => {
                if byte >= 0x80 {
                    warn!(
                        "discarding sysex with truncated vendor id, resyncing on {:#04X}",
                        byte
                    );
                    return self.handle_status_or_data(byte);
                }
                bytes.push(byte);
                let done = match bytes[0] {
                    0 => bytes.len() == 3,
                    _ => true,
                };
                if done {
                    let vendor = VendorId::from_bytes(&bytes)?;
                    self.state = DecodeState::InSysex { buffer: Vec::new() };
                    Ok(Some(Message::new(MessageKind::SysexBegin { vendor })))
                } else {
                    self.state = DecodeState::AwaitingVendor { bytes };
                    Ok(None)
                }
            }
            // InSysex and SysexDrained are handled before bytes get here
            other => {
                self.state = other;
                Ok(None)
            }
        }
    }

    fn handle_status_or_data(&mut self, byte: u8) -> Result<Option<Message>> {
        if byte < 0x80 {
            // Data byte without a fresh status: running status repeats the
            // last channel status byte, anything else is noise.
            return match self.running_status {
                Some(status) => {
                    if param_count(status) == 1 {
                        Ok(Some(complete_message(status, byte, 0)?))
                    } else {
                        self.state = DecodeState::AwaitingParams {
                            status,
                            first: Some(byte),
                        };
                        Ok(None)
                    }
                }
                None => {
                    warn!("discarding data byte {:#04X} with no running status", byte);
                    Ok(None)
                }
            };
        }

        if byte < 0xF0 {
            self.running_status = Some(byte);
            self.state = DecodeState::AwaitingParams {
                status: byte,
                first: None,
            };
            return Ok(None);
        }

        // System common statuses end any running status sequence.
        self.running_status = None;
        match byte {
            0xF0 => {
                self.state = DecodeState::AwaitingVendor { bytes: Vec::new() };
                Ok(None)
            }
            0xF1 | 0xF2 | 0xF3 => {
                self.state = DecodeState::AwaitingParams {
                    status: byte,
                    first: None,
                };
                Ok(None)
            }
            0xF6 => Ok(Some(Message::tune_request())),
            _ => {
                // 0xF4/0xF5 are undefined and a bare 0xF7 has no dump to end.
                warn!("discarding unrecognized status byte {:#04X}", byte);
                Ok(None)
            }
        }
    }
}

/// Parameter bytes following each status byte
fn param_count(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        0xF0 => match status {
            0xF1 | 0xF3 => 1,
            _ => 2,
        },
        _ => 2,
    }
}

fn realtime_message(byte: u8) -> Option<Message> {
    match byte {
        0xF8 => Some(Message::timing_clock()),
        0xFA => Some(Message::start()),
        0xFB => Some(Message::continue_playing()),
        0xFC => Some(Message::stop()),
        0xFE => Some(Message::active_sensing()),
        0xFF => Some(Message::reset()),
        _ => None,
    }
}

/// Builds the decoded message once all parameter bytes are in
fn complete_message(status: u8, p1: u8, p2: u8) -> Result<Message> {
    let channel = (status & 0x0F) + 1;
    let kind = match status & 0xF0 {
        0x80 => MessageKind::NoteOff {
            channel,
            note: Note::from_number(p1)?,
            velocity: p2,
        },
        // Note On at velocity zero is the wire idiom for Note Off
        0x90 if p2 == 0 => MessageKind::NoteOff {
            channel,
            note: Note::from_number(p1)?,
            velocity: 0,
        },
        0x90 => MessageKind::NoteOn {
            channel,
            note: Note::from_number(p1)?,
            velocity: p2,
        },
        0xA0 => MessageKind::PolyAftertouch {
            channel,
            note: Note::from_number(p1)?,
            pressure: p2,
        },
        0xB0 => match ChannelMode::from_controller(p1) {
            Some(mode) => MessageKind::ChannelMode {
                channel,
                mode,
                value: p2,
            },
            None => MessageKind::ControlChange {
                channel,
                controller: p1,
                value: p2,
            },
        },
        0xC0 => MessageKind::ProgramChange {
            channel,
            program: p1,
        },
        0xD0 => MessageKind::ChannelPressure {
            channel,
            pressure: p1,
        },
        0xE0 => MessageKind::PitchBend {
            channel,
            value: (((p2 as u16) << 7) | p1 as u16) as i16 - 8192,
        },
        _ => match status {
            0xF1 => MessageKind::QuarterFrame {
                piece: p1 >> 4,
                value: p1 & 0x0F,
            },
            0xF2 => MessageKind::SongPosition {
                beats: ((p2 as u16) << 7) | p1 as u16,
            },
            0xF3 => MessageKind::SongSelect { song: p1 },
            _ => unreachable!("status {:#04X} has no completion", status),
        },
    };
    Ok(Message::new(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_counts() {
        assert_eq!(param_count(0x90), 2);
        assert_eq!(param_count(0xC5), 1);
        assert_eq!(param_count(0xD0), 1);
        assert_eq!(param_count(0xE7), 2);
        assert_eq!(param_count(0xF1), 1);
        assert_eq!(param_count(0xF2), 2);
        assert_eq!(param_count(0xF3), 1);
    }

    #[test]
    fn test_pitch_bend_reconstruction() {
        let msg = complete_message(0xE0, 0x00, 0x00).unwrap();
        assert_eq!(
            msg.kind,
            MessageKind::PitchBend {
                channel: 1,
                value: -8192
            }
        );

        let msg = complete_message(0xE0, 0x7F, 0x7F).unwrap();
        assert_eq!(
            msg.kind,
            MessageKind::PitchBend {
                channel: 1,
                value: 8191
            }
        );
    }
}

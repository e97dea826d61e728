//! In-memory byte pipes, used for loopback wiring and in tests

use super::{ByteSink, ByteSource};
use crate::{MidiError, Result};
use crossbeam::channel::{unbounded, Receiver, Sender};

/// Creates a connected sink/source pair
///
/// Bytes written to the [`PipeSink`] become readable from the
/// [`PipeSource`]. Dropping every clone of the sink ends the source with
/// [`MidiError::Closed`], mirroring a disconnected serial link.
pub fn pair() -> (PipeSink, PipeSource) {
    let (tx, rx) = unbounded();
    (PipeSink { tx }, PipeSource { rx, peeked: None })
}

pub struct PipeSource {
    rx: Receiver<u8>,
    peeked: Option<u8>,
}

impl ByteSource for PipeSource {
    fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        self.rx.recv().map_err(|_| MidiError::Closed)
    }

    fn peek_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked {
            return Ok(byte);
        }
        let byte = self.rx.recv().map_err(|_| MidiError::Closed)?;
        self.peeked = Some(byte);
        Ok(byte)
    }
}

#[derive(Clone)]
pub struct PipeSink {
    tx: Sender<u8>,
}

impl ByteSink for PipeSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        for byte in bytes {
            self.tx.send(*byte).map_err(|_| MidiError::Closed)?;
        }
        Ok(())
    }
}

//! Byte transport seam for the wire protocol
//!
//! The protocol core only needs two capabilities from its transport: a
//! blocking byte source with one byte of lookahead, and a byte sink. The
//! concrete link (a serial device node opened by the application, a socket,
//! an in-memory pipe) carries no protocol semantics.
//!
//! The main components are:
//! - [`ByteSource`] and [`ByteSink`] traits consumed by the port
//! - [`ReaderSource`] and [`WriterSink`] adapters over `std::io`
//! - [`pipe`] for in-memory loopback transports

pub mod pipe;

use crate::{MidiError, Result};
use std::io::{ErrorKind, Read, Write};

/// Blocking source of raw wire bytes, exclusively owned by a port's
/// receive loop
pub trait ByteSource {
    /// Reads the next byte, blocking until one is available
    fn read_byte(&mut self) -> Result<u8>;

    /// Returns the next byte without consuming it, blocking until one is
    /// available
    fn peek_byte(&mut self) -> Result<u8>;
}

/// Sink for raw wire bytes, exclusively owned by a port's send loop
pub trait ByteSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Adapts any `std::io::Read` into a [`ByteSource`]
///
/// Suitable for a serial device node opened as a file (the link-layer
/// parameters are configured outside this crate), a socket, or test input.
pub struct ReaderSource<R: Read> {
    inner: R,
    peeked: Option<u8>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        ReaderSource {
            inner,
            peeked: None,
        }
    }

    fn fetch(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(MidiError::Closed),
            Err(e) => Err(MidiError::Transport(e.to_string())),
        }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        self.fetch()
    }

    fn peek_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked {
            return Ok(byte);
        }
        let byte = self.fetch()?;
        self.peeked = Some(byte);
        Ok(byte)
    }
}

/// Adapts any `std::io::Write` into a [`ByteSink`]
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        WriterSink { inner }
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .and_then(|()| self.inner.flush())
            .map_err(|e| MidiError::Transport(e.to_string()))
    }
}

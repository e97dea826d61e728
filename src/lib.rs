//! MIDI message transport over byte-oriented serial links
//!
//! This crate decodes an inbound serial byte stream into discrete MIDI
//! messages, encodes outbound messages back into wire bytes, and schedules
//! outbound messages for delivery at specified future times while
//! preserving chronological order.
//!
//! The main components are:
//! - [`Note`] for 7-bit pitch numbers and their names
//! - [`Message`] / [`MessageKind`] covering the full MIDI 1.0 serial
//!   vocabulary, with a stream [`Decoder`] and wire encoding
//! - [`TimedQueue`] for timestamp-ordered outbound scheduling
//! - [`Port`] pairing a receive loop and a send loop over one transport
//! - [`transport`] with the byte source/sink seam and ready-made adapters

pub mod cli;
mod error;
pub mod logging;
pub mod message;
pub mod note;
pub mod port;
pub mod queue;
pub mod transport;

pub use error::{MidiError, Result};
pub use message::{ChannelMode, Decoder, Message, MessageKind, VendorId};
pub use note::Note;
pub use port::Port;
pub use queue::TimedQueue;

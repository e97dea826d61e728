//! Bidirectional MIDI port over a byte source/sink pair
//!
//! A [`Port`] owns two background threads: the receive loop decodes wire
//! bytes into messages and feeds a bounded inbound channel, and the send
//! loop drains the [`TimedQueue`] as entries become due, serializing them to
//! the sink. Application code talks only to [`Port::receive`],
//! [`Port::send`] and [`Port::close`]; the transport is owned entirely by
//! the two loops.

use crate::message::{Decoder, Message, MessageKind};
use crate::queue::TimedQueue;
use crate::transport::{ByteSink, ByteSource};
use crate::{MidiError, Result};
use crossbeam::channel::{bounded, Receiver, Sender};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Capacity of the inbound message channel. When the consumer falls behind
/// by this many messages the receive loop blocks, applying backpressure to
/// the byte source; a burst can stall reading until the consumer catches
/// up.
const INBOUND_CAPACITY: usize = 64;

pub struct Port {
    inbound: Receiver<Message>,
    queue: Arc<TimedQueue>,
    running: Arc<AtomicBool>,
    log_messages: Arc<AtomicBool>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    recv_handle: Mutex<Option<JoinHandle<()>>>,
    send_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Port {
    /// Opens a port over the given transport, spawning its receive and
    /// send loops
    pub fn open<S, W>(source: S, sink: W) -> Self
    where
        S: ByteSource + Send + 'static,
        W: ByteSink + Send + 'static,
    {
        let (inbound_tx, inbound_rx) = bounded(INBOUND_CAPACITY);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let queue = Arc::new(TimedQueue::new());
        let running = Arc::new(AtomicBool::new(true));
        let log_messages = Arc::new(AtomicBool::new(false));

        let recv_handle = {
            let running = running.clone();
            let log_messages = log_messages.clone();
            thread::spawn(move || run_receive_loop(source, inbound_tx, running, log_messages))
        };

        let send_handle = {
            let queue = queue.clone();
            let log_messages = log_messages.clone();
            thread::spawn(move || run_send_loop(sink, queue, log_messages))
        };

        Port {
            inbound: inbound_rx,
            queue,
            running,
            log_messages,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            recv_handle: Mutex::new(Some(recv_handle)),
            send_handle: Mutex::new(Some(send_handle)),
        }
    }

    /// Blocks until the next decoded message arrives
    ///
    /// Returns [`MidiError::Closed`] once the port is closed or the
    /// transport has ended. No timeout is imposed here; callers wrap their
    /// own if they need one.
    pub fn receive(&self) -> Result<Message> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(MidiError::Closed);
        }
        crossbeam::select! {
            recv(self.inbound) -> msg => msg.map_err(|_| MidiError::Closed),
            recv(self.shutdown_rx) -> _ => Err(MidiError::Closed),
        }
    }

    /// Enqueues a message for delivery at its timestamp
    ///
    /// Never blocks the caller beyond the queue's own synchronization. A
    /// message stamped in the past (the default) goes out as soon as the
    /// send loop gets to it.
    pub fn send(&self, msg: Message) {
        self.queue.push(msg);
    }

    /// Toggles verbose tracing of every message in either direction
    pub fn set_log_messages(&self, enabled: bool) {
        self.log_messages.store(enabled, Ordering::SeqCst);
    }

    /// Terminates both loops. Messages still queued or buffered are
    /// discarded; there is no guaranteed delivery after close.
    pub fn close(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("closing MIDI port");
        self.queue.close();
        // Dropping the sender disconnects every receive() blocked in select.
        self.shutdown_tx.lock().unwrap().take();
        if let Some(handle) = self.send_handle.lock().unwrap().take() {
            let _ = handle.join();
        }
        // The receive loop may be blocked inside the byte source; it exits
        // on the next decoded message or when the transport ends, so it is
        // detached rather than joined.
        self.recv_handle.lock().unwrap().take();
    }
}

impl Drop for Port {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_receive_loop<S: ByteSource>(
    mut source: S,
    inbound: Sender<Message>,
    running: Arc<AtomicBool>,
    log_messages: Arc<AtomicBool>,
) {
    let mut decoder = Decoder::new();
    info!("receive loop started");
    while running.load(Ordering::SeqCst) {
        match decoder.read_message(&mut source) {
            Ok(msg) => {
                if log_messages.load(Ordering::SeqCst) {
                    debug!("MIDI in: {:?}", msg.kind);
                }
                if inbound.send(msg).is_err() {
                    break;
                }
            }
            Err(MidiError::Closed) => {
                info!("byte source ended, stopping receive loop");
                break;
            }
            Err(e) => {
                error!("receive loop transport failure: {}", e);
                break;
            }
        }
    }
    info!("receive loop stopped");
}

fn run_send_loop<W: ByteSink>(mut sink: W, queue: Arc<TimedQueue>, log_messages: Arc<AtomicBool>) {
    // Sysex dump phase on the outbound wire, tracked independently of the
    // receive side.
    let mut in_sysex = false;
    info!("send loop started");
    while let Some(msg) = queue.pop_due() {
        if !legal_in_phase(&msg.kind, in_sysex) {
            warn!(
                "dropping {:?}: not legal {} a sysex dump",
                msg.kind,
                if in_sysex { "inside" } else { "outside" }
            );
            continue;
        }
        let bytes = match msg.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("dropping unencodable message: {}", e);
                continue;
            }
        };
        if log_messages.load(Ordering::SeqCst) {
            debug!("MIDI out: {:?}", msg.kind);
        }
        if let Err(e) = sink.write(&bytes) {
            error!("send loop transport failure: {}", e);
            break;
        }
        match msg.kind {
            MessageKind::SysexBegin { .. } => in_sysex = true,
            MessageKind::SysexEnd => in_sysex = false,
            _ => {}
        }
    }
    info!("send loop stopped");
}

/// A dump may not be opened twice, and dump payload or a terminator may
/// only follow an opened dump
fn legal_in_phase(kind: &MessageKind, in_sysex: bool) -> bool {
    match kind {
        MessageKind::SysexBegin { .. } => !in_sysex,
        MessageKind::SysexData { .. } | MessageKind::SysexEnd => in_sysex,
        _ => true,
    }
}

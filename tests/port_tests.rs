use midiwire::transport::pipe::{self, PipeSink, PipeSource};
use midiwire::transport::{ByteSink, ByteSource};
use midiwire::{Message, MessageKind, MidiError, Note, Port};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A port wired to two in-memory pipes: one the test feeds wire bytes
/// into, one the test taps outgoing wire bytes from
fn piped_port() -> (Port, PipeSink, PipeSource) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (feed, port_source) = pipe::pair();
    let (port_sink, tap) = pipe::pair();
    let port = Port::open(port_source, port_sink);
    (port, feed, tap)
}

fn read_bytes(source: &mut PipeSource, count: usize) -> Vec<u8> {
    (0..count)
        .map(|_| source.read_byte().expect("wire byte should be available"))
        .collect()
}

fn note(number: u8) -> Note {
    Note::from_number(number).unwrap()
}

#[test]
fn test_receive_decodes_wire_bytes() {
    let (port, mut feed, _tap) = piped_port();

    feed.write(&[0x90, 60, 100, 0xF8, 0xC2, 7]).unwrap();

    assert_eq!(
        port.receive().unwrap().kind,
        MessageKind::NoteOn {
            channel: 1,
            note: note(60),
            velocity: 100
        }
    );
    assert_eq!(port.receive().unwrap().kind, MessageKind::TimingClock);
    assert_eq!(
        port.receive().unwrap().kind,
        MessageKind::ProgramChange {
            channel: 3,
            program: 7
        }
    );
}

#[test]
fn test_send_writes_wire_bytes() {
    let (port, _feed, mut tap) = piped_port();

    port.send(Message::note_on(1, note(60), 100).unwrap());

    assert_eq!(read_bytes(&mut tap, 3), vec![0x90, 60, 100]);
}

#[test]
fn test_scheduled_sends_go_out_in_timestamp_order() {
    let (port, _feed, mut tap) = piped_port();
    let base = Instant::now();

    // Queued out of order; the wire must carry them chronologically
    port.send(Message::song_select(3).unwrap().at(base + Duration::from_millis(300)));
    port.send(Message::song_select(1).unwrap().at(base + Duration::from_millis(100)));
    port.send(Message::song_select(2).unwrap().at(base + Duration::from_millis(200)));

    assert_eq!(
        read_bytes(&mut tap, 6),
        vec![0xF3, 1, 0xF3, 2, 0xF3, 3]
    );
}

#[test]
fn test_scheduled_send_is_not_early() {
    let (port, _feed, mut tap) = piped_port();
    let start = Instant::now();

    port.send(Message::song_select(1).unwrap().after(Duration::from_millis(200)));

    let bytes = read_bytes(&mut tap, 2);
    assert_eq!(bytes, vec![0xF3, 1]);
    assert!(
        start.elapsed() >= Duration::from_millis(200),
        "message went out {:?} after queuing, before its due time",
        start.elapsed()
    );
}

#[test]
fn test_sysex_phase_violations_are_dropped() {
    let (port, _feed, mut tap) = piped_port();

    // No dump is open, so payload and terminator must be dropped
    port.send(Message::sysex_data(vec![1, 2]).unwrap());
    port.send(Message::sysex_end());

    // A legal dump; the second begin arrives mid-dump and must be dropped
    port.send(Message::sysex_begin(&[0x41]).unwrap());
    port.send(Message::sysex_begin(&[0x42]).unwrap());
    port.send(Message::sysex_data(vec![10]).unwrap());
    port.send(Message::sysex_end());

    // After the dump closed, payload is illegal again
    port.send(Message::sysex_data(vec![3]).unwrap());
    port.send(Message::note_on(1, note(60), 100).unwrap());

    assert_eq!(
        read_bytes(&mut tap, 7),
        vec![0xF0, 0x41, 10, 0xF7, 0x90, 60, 100]
    );
}

#[test]
fn test_realtime_messages_pass_mid_dump() {
    let (port, _feed, mut tap) = piped_port();

    port.send(Message::sysex_begin(&[0x41]).unwrap());
    port.send(Message::timing_clock());
    port.send(Message::sysex_data(vec![10]).unwrap());
    port.send(Message::sysex_end());

    assert_eq!(
        read_bytes(&mut tap, 5),
        vec![0xF0, 0x41, 0xF8, 10, 0xF7]
    );
}

#[test]
fn test_end_to_end_between_two_ports() {
    // Two ports wired back to back, as two devices sharing a cable pair
    let (a_sink, b_source) = pipe::pair();
    let (b_sink, a_source) = pipe::pair();
    let port_a = Port::open(a_source, a_sink);
    let port_b = Port::open(b_source, b_sink);

    port_a.send(Message::note_on(1, note(64), 90).unwrap());
    port_a.send(Message::note_off(1, note(64), 0).unwrap());

    assert_eq!(
        port_b.receive().unwrap().kind,
        MessageKind::NoteOn {
            channel: 1,
            note: note(64),
            velocity: 90
        }
    );
    assert_eq!(
        port_b.receive().unwrap().kind,
        MessageKind::NoteOff {
            channel: 1,
            note: note(64),
            velocity: 0
        }
    );
}

#[test]
fn test_receive_after_close_fails() {
    let (port, mut feed, _tap) = piped_port();
    feed.write(&[0xF8]).unwrap();

    port.close();
    assert!(matches!(port.receive(), Err(MidiError::Closed)));
}

#[test]
fn test_close_wakes_blocked_receiver() {
    let (port, _feed, _tap) = piped_port();
    let port = Arc::new(port);

    let receiver = {
        let port = port.clone();
        thread::spawn(move || port.receive())
    };

    thread::sleep(Duration::from_millis(50));
    port.close();

    assert!(matches!(receiver.join().unwrap(), Err(MidiError::Closed)));
}

#[test]
fn test_source_disconnect_surfaces_as_closed() {
    let (port, feed, _tap) = piped_port();

    // Dropping the only sink end disconnects the byte source
    drop(feed);

    assert!(matches!(port.receive(), Err(MidiError::Closed)));
}

#[test]
fn test_close_discards_scheduled_messages() {
    let (port, _feed, mut tap) = piped_port();

    port.send(Message::song_select(1).unwrap().after(Duration::from_secs(5)));
    port.close();

    // The sink end was dropped by the send loop exiting; nothing was
    // written before that
    assert!(matches!(tap.read_byte(), Err(MidiError::Closed)));
}

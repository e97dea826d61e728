use clap::Parser;
use midiwire::{
    cli::Args,
    transport::{ReaderSource, WriterSink},
    Message, Note, Port,
};
use std::fs::{File, OpenOptions};
use std::time::Duration;

fn main() {
    initialize_logging();
    let args = Args::parse();

    let port = match open_device_port(&args.device) {
        Ok(port) => port,
        Err(e) => {
            let error_msg = format!("Error opening serial device '{}': {}", args.device, e);
            log::error!("{}", error_msg);
            eprintln!("{}", error_msg);
            std::process::exit(1);
        }
    };
    port.set_log_messages(args.log_messages);
    log::info!("Opened MIDI port on {}", args.device);
    println!("Opened MIDI port on {}", args.device);

    if args.test_note {
        if let Err(e) = send_test_note(&port) {
            log::error!("Failed to send test note: {}", e);
        }
    }

    run_monitor_loop(&port);
}

fn initialize_logging() {
    midiwire::logging::init_logger().expect("Logger initialization failed");
    log::info!("Application starting");
}

/// Opens the device node once for reading and once for writing; the
/// link-layer parameters are expected to be configured already.
fn open_device_port(device: &str) -> std::io::Result<Port> {
    let source = File::open(device)?;
    let sink = OpenOptions::new().write(true).open(device)?;
    Ok(Port::open(ReaderSource::new(source), WriterSink::new(sink)))
}

/// Sends middle C, scheduling its release half a second into the future
fn send_test_note(port: &Port) -> midiwire::Result<()> {
    log::info!("Sending test note (Middle C)");
    let note = Note::from_number(60)?;
    port.send(Message::note_on(1, note, 100)?);
    port.send(Message::note_off(1, note, 0)?.after(Duration::from_millis(500)));
    Ok(())
}

fn run_monitor_loop(port: &Port) {
    println!("Listening for MIDI messages. Press Ctrl+C to exit...");
    loop {
        match port.receive() {
            Ok(msg) => {
                println!(
                    "{} {:?}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    msg.kind
                );
            }
            Err(e) => {
                log::error!("Receive failed: {}", e);
                eprintln!("Receive failed: {}", e);
                break;
            }
        }
    }
}

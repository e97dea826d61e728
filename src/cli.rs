use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serial device to open, e.g. /dev/ttyUSB0. The link layer must
    /// already be configured for MIDI (31250 baud, 8 data bits, 1 stop
    /// bit, no parity).
    #[arg(long)]
    pub device: String,

    /// Trace every message transiting in either direction
    #[arg(long)]
    pub log_messages: bool,

    /// Send a middle C test note on startup, released half a second later
    #[arg(long)]
    pub test_note: bool,
}

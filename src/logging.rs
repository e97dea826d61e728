use simplelog::{CombinedLogger, Config, LevelFilter, WriteLogger};
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

pub fn init_logger() -> Result<(), Error> {
    // Get user's home directory and construct log path
    let home = std::env::var("HOME")
        .map_err(|_| Error::new(ErrorKind::NotFound, "HOME environment variable not set"))?;

    let log_dir = PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("midiwire")
        .join("logs");

    // Create the log directory if it doesn't exist
    fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))?;

    let config = Config::default();

    INIT.call_once(|| {
        if CombinedLogger::init(vec![WriteLogger::new(LevelFilter::Debug, config, log_file)])
            .is_ok()
        {
            LOGGER_INITIALIZED.store(true, Ordering::SeqCst);
        }
    });

    if LOGGER_INITIALIZED.load(Ordering::SeqCst) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Other, "Logger initialization failed"))
    }
}

//! `log` backend writing to the serial port.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use ringos::config::LOG_LEVEL;

struct SerialLogger;

static LOGGER: SerialLogger = SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        cfg!(feature = "log_serial") && metadata.level() <= LOG_LEVEL
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            crate::serial::write_fmt(format_args!(
                "[{:>5}] {}: {}\n",
                record.level(),
                record.target(),
                record.args()
            ));
        }
    }

    fn flush(&self) {}
}

/// Install the serial logger. Fails if another logger got there first.
pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(if cfg!(feature = "log_serial") { LOG_LEVEL } else { LevelFilter::Off });
    Ok(())
}

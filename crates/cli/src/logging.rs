//! Timestamped stderr logger for the command-line tools.

use std::io::{self, IsTerminal};

use chrono::Utc;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger {
    level: LevelFilter,
    color: bool,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let (code, tag) = match record.level() {
            Level::Error => ("31", "ERROR"),
            Level::Warn => ("35", "WARN"),
            Level::Info => ("32", "INFO"),
            Level::Debug => ("33", "DEBUG"),
            Level::Trace => ("36", "TRACE"),
        };
        let time = Utc::now().format("%H:%M:%S");
        if self.color {
            eprintln!("\x1b[{code}m[{tag:<5}][{time}]\x1b[0m {}", record.args());
        } else {
            eprintln!("[{tag:<5}][{time}] {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Level for a count of `-v` flags: warnings by default, then info, debug and trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the logger. Fails if another logger is already set.
pub fn init(verbosity: u8) -> Result<(), SetLoggerError> {
    let level = level_for(verbosity);
    log::set_boxed_logger(Box::new(StderrLogger {
        level,
        color: io::stderr().is_terminal(),
    }))?;
    log::set_max_level(level);
    Ok(())
}

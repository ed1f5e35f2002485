//! Where the logger lives
//!
//! Everything in this crate logs through the [`log`] facade, so embedding applications are free to
//! install whatever logger they like. This module provides a small one for the cases where they
//! don't: records are written, one per line, to a swappable output sink.
use std::io::Write;
use std::mem;
use std::sync::Mutex;

use lazy_static::lazy_static;
use log::{LevelFilter, Metadata, Record};

use crate::{Error, Result};

/// The type of output accepted by the logger
pub type Sink = Box<dyn Write + Send>;

lazy_static! {
    /// The output that we're currently logging to
    ///
    /// This lock is provided both to sync writes to whatever output we're using, AND to allow
    /// changing the output at runtime.
    static ref SINK: Mutex<Option<Sink>> = Mutex::new(None);
}

const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Sets the global logger to the one given here
///
/// ## Errors
///
/// Only one logger can be set for the lifetime of a process. If one already has been (by this
/// function or by anything else), this returns an error and leaves the existing logger in place.
pub fn init() -> Result<()> {
    log::set_logger(&LOGGER)
        .map_err(|e| Error::Config(format!("failed to set logger: {}", e)))?;
    log::set_max_level(DEFAULT_LEVEL);
    Ok(())
}

/// Sets the output for log records, returning the old one, if it was present
pub fn set_sink(sink: Sink) -> Option<Sink> {
    let mut guard = lock_sink();
    mem::replace(&mut *guard, Some(sink))
}

/// Removes the output for log records, returning it if it was present
pub fn take_sink() -> Option<Sink> {
    lock_sink().take()
}

/// Sets the application-wide logging level, returning the previous one
pub fn set_level(level: LevelFilter) -> LevelFilter {
    let previous = log::max_level();
    log::set_max_level(level);
    previous
}

/// Returns whether there there is currently an output to log to
pub fn logging() -> bool {
    lock_sink().is_some()
}

/// Returns the curent level of the logger
pub fn level() -> LevelFilter {
    log::max_level()
}

/// Utility function for grabbing the log level from a string
///
/// The string should be one of "Trace", "Debug", "Info", "Warn", "Error", or "Off". Matching is
/// case-insensitive, because these typically come from configuration files.
pub fn level_filter_from_str(s: &str) -> Result<LevelFilter> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::Trace),
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" => Ok(LevelFilter::Off),
        _ => Err(Error::Config(format!("unexpected log level {:?}", s))),
    }
}

// A poisoned lock only means that some other thread panicked mid-write. The sink itself is still
// usable, so we just carry on.
fn lock_sink() -> std::sync::MutexGuard<'static, Option<Sink>> {
    SINK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The public-facing logger. This is an empty struct that uses the internal functions of the rest
/// of the logging utilities to perform the logging.
pub struct Logger;

/// A dummy value that allows a static reference to the global logger
pub static LOGGER: Logger = Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut guard = lock_sink();

        // We only log if we actually have somewhere to log to
        if let Some(sink) = guard.as_mut() {
            let res = writeln!(
                sink,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );

            // There isn't anywhere to report a failure to write the log, so the output gets
            // dropped instead of failing every subsequent record too.
            if res.is_err() {
                *guard = None;
            }
        }
    }

    fn flush(&self) {
        let mut guard = lock_sink();
        if let Some(sink) = guard.as_mut() {
            if sink.flush().is_err() {
                *guard = None;
            }
        }
    }
}

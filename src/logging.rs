//! Leveled logging without allocation.
//!
//! Records travel as [`fmt::Arguments`]; the sink decides where they go
//! (defmt over RTT on the device, a buffer in tests). Sinks are best
//! effort and never report failure back to the caller.

use core::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

pub trait LogSink {
    fn write(&mut self, level: LogLevel, args: fmt::Arguments<'_>);
}

/// Sink that drops everything.
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&mut self, _level: LogLevel, _args: fmt::Arguments<'_>) {}
}

/// Filters records below a minimum level before they reach the sink.
pub struct Logger<S> {
    sink: S,
    min_level: LogLevel,
}

impl<S: LogSink> Logger<S> {
    pub fn new(sink: S, min_level: LogLevel) -> Self {
        Self { sink, min_level }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&mut self, level: LogLevel, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            self.sink.write(level, args);
        }
    }

    pub fn debug(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    pub fn info(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    pub fn warn(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    pub fn error(&mut self, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

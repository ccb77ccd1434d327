//! Output abstraction for the `print` statement.
//!
//! The interpreter never talks to stdout directly; it writes through a
//! [`PrintWriter`] supplied by the host. The default [`StdPrint`] goes to
//! stdout, [`CollectStringPrint`] captures output for tests or programmatic
//! use, and [`NoPrint`] discards it.

use std::io::{self, Write as _};

/// Receives the output of `print` statements.
pub trait PrintWriter {
    /// Writes one rendered value, without the trailing newline.
    fn write_str(&mut self, output: &str);

    /// Writes the line terminator after a rendered value.
    fn push(&mut self, end: char);
}

/// Default writer: straight to stdout. Write failures are ignored, matching
/// `println!`-style output.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_str(&mut self, output: &str) {
        let _ = io::stdout().write_all(output.as_bytes());
    }

    fn push(&mut self, end: char) {
        let mut buf = [0_u8; 4];
        let _ = io::stdout().write_all(end.encode_utf8(&mut buf).as_bytes());
        if end == '\n' {
            let _ = io::stdout().flush();
        }
    }
}

/// Collects all output into a string.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected output so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn write_str(&mut self, output: &str) {
        self.0.push_str(output);
    }

    fn push(&mut self, end: char) {
        self.0.push(end);
    }
}

/// Ignores all output. Useful for benchmarks and hosts that surface values
/// some other way.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_str(&mut self, _output: &str) {}

    fn push(&mut self, _end: char) {}
}

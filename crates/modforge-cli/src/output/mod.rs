//! Terminal output formatting and utilities.
//!
//! Documents go to stdout untouched so they can be piped; status lines are
//! decorated with colors when the terminal supports them.

pub mod colors;
pub mod errors;

use std::sync::{Arc, Mutex};

/// Output handler for consistent terminal formatting
#[derive(Debug, Clone)]
pub struct OutputHandler {
    colors: colors::ColorSupport,
    /// When set, lines are collected here instead of printed
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
            buffer: None,
        }
    }

    /// Handler that records every line without color, for tests
    #[cfg(test)]
    pub fn buffered() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
            buffer: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines recorded by a buffered handler
    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.buffer
            .as_ref()
            .map(|buffer| buffer.lock().unwrap_or_else(|p| p.into_inner()).clone())
            .unwrap_or_default()
    }

    /// Print raw document output
    pub fn print(&self, text: &str) {
        self.emit(text, false);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        self.emit(&self.colors.dim(message), false);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.emit(&format!("{} {}", self.colors.green("✓"), message), false);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        self.emit(&format!("{} {}", self.colors.yellow("⚠"), message), true);
    }

    fn emit(&self, line: &str, to_stderr: bool) {
        match &self.buffer {
            Some(buffer) => buffer.lock().unwrap_or_else(|p| p.into_inner()).push(line.to_string()),
            None if to_stderr => eprintln!("{}", line),
            None => println!("{}", line),
        }
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

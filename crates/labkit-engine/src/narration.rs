//! Narration sinks
//!
//! The engine produces narration as plain strings. Whatever turns them into
//! speech or on-screen captions implements [`NarrationSink`].

/// Receives narration lines in order
#[cfg_attr(test, mockall::automock)]
pub trait NarrationSink {
    /// Deliver one line
    fn narrate(&mut self, line: &str);
}

/// Collects lines in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrationBuffer {
    lines: Vec<String>,
}

impl NarrationBuffer {
    /// Create an empty buffer
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines collected so far
    #[inline]
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Most recent line
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    /// Drain all collected lines
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl NarrationSink for NarrationBuffer {
    fn narrate(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Emits each line as an `info` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNarration;

impl NarrationSink for TracingNarration {
    fn narrate(&mut self, line: &str) {
        tracing::info!(target: "labkit::narration", "{line}");
    }
}

impl<S: NarrationSink + ?Sized> NarrationSink for &mut S {
    fn narrate(&mut self, line: &str) {
        (**self).narrate(line);
    }
}

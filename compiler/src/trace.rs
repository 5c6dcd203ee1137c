//! Parse trace: an indented, XML-like log of every production the parser
//! enters and every token it consumes.
//!
//! The trace is write-only from the parser's point of view; nothing it
//! records feeds back into parsing. Lines accumulate in memory so the CLI
//! can write the trace out even when parsing stops at an error.

#[derive(Debug, Clone)]
pub struct Trace {
    enabled: bool,
    depth: usize,
    text: String,
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Trace {
    pub fn new() -> Self {
        Self {
            enabled: true,
            depth: 0,
            text: String::new(),
        }
    }

    /// A trace that records nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// `<tag>`, then indent.
    pub fn open(&mut self, tag: &str) {
        self.line(&format!("<{}>", tag));
        self.depth += 1;
    }

    /// Dedent, then `</tag>`.
    pub fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", tag));
    }

    pub fn line(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        for _ in 0..self.depth {
            self.text.push('\t');
        }
        self.text.push_str(text);
        self.text.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

//! Line framing for streamed response bodies
//!
//! Network chunks can end anywhere, including inside a multi-byte UTF-8
//! character. [`LineDecoder`] buffers raw bytes and only decodes a line once
//! its terminating newline has arrived, so a character split across chunks
//! is reassembled before decoding. A newline byte never occurs inside a
//! multi-byte sequence, which makes byte-level splitting safe.

/// Prefix of lines carrying a payload
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends a delta stream
pub const DONE_SIGNAL: &str = "[DONE]";

/// Incremental byte-to-line decoder
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk, returning every line it completes
    ///
    /// Returned lines have their `\n` / `\r\n` terminator removed. Bytes after
    /// the last newline stay buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            lines.push(decode_line(&line_bytes));
        }
        lines
    }

    /// Flush a final unterminated line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }

    /// Number of bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(bytes).into_owned();
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Classification of one framed line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLine<'a> {
    /// A `data:` line with its payload
    Data(&'a str),
    /// The `data: [DONE]` terminator
    Done,
    /// Blank lines, comments, `event:`/`id:` fields and anything else
    Ignore,
}

/// Classify a framed line
pub fn classify_line(line: &str) -> DataLine<'_> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return DataLine::Ignore;
    };
    let payload = payload.strip_prefix(' ').unwrap_or(payload).trim_end();
    if payload == DONE_SIGNAL {
        DataLine::Done
    } else if payload.is_empty() {
        DataLine::Ignore
    } else {
        DataLine::Data(payload)
    }
}

//! Line framing for the raw feed byte stream
//!
//! `\r\n`, lone `\r` and `\n` all end a line. Blank lines are dropped.

use thiserror::Error;

/// Default cap on bytes buffered without a line terminator
pub const DEFAULT_MAX_PENDING: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("unterminated line exceeds {limit} bytes")]
    Overflow { limit: usize },
}

/// Accumulates partial reads and yields complete lines
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_pending: usize,
}

impl LineFramer {
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_pending,
        }
    }

    /// Feed one received chunk, returning every line it completes
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, FrameError> {
        let mut lines = Vec::new();

        for &byte in chunk {
            match byte {
                b'\r' | b'\n' => self.flush_line(&mut lines),
                _ => {
                    if self.pending.len() >= self.max_pending {
                        self.pending.clear();
                        return Err(FrameError::Overflow {
                            limit: self.max_pending,
                        });
                    }
                    self.pending.push(byte);
                }
            }
        }

        Ok(lines)
    }

    /// Bytes held back waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn flush_line(&mut self, lines: &mut Vec<String>) {
        if self.pending.is_empty() {
            return;
        }
        let line = decode_dropping_invalid(&self.pending).trim().to_string();
        self.pending.clear();
        if !line.is_empty() {
            lines.push(line);
        }
    }
}

/// UTF-8 decode that skips invalid sequences instead of substituting U+FFFD
fn decode_dropping_invalid(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to marks a checked boundary
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    None => return out,
                }
            }
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

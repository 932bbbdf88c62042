//! Prompt-delimited response framing.
//!
//! A response is everything the operator writes before its prompt. Reads
//! arrive in arbitrary chunks; a chunk terminates the response only if the
//! prompt is the last non-whitespace character of that chunk. A prompt in the
//! middle of a chunk is payload. Only the terminating chunk is truncated.

use crate::PROMPT;

use std::mem::take;

/// Byte offset of the terminating prompt within `chunk`, if the chunk ends one.
pub fn find_trailing_prompt(chunk: &str) -> Option<usize> {
    let trimmed = chunk.trim_end();
    if trimmed.ends_with(PROMPT) {
        Some(trimmed.len() - PROMPT.len_utf8())
    } else {
        None
    }
}

/// Whether a response carries nothing but whitespace and prompt characters.
pub fn is_empty_response(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == PROMPT)
}

/// Collects chunks until one of them ends with the prompt.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    buffer: String,
}

impl ResponseAccumulator {
    /// Append a chunk. Returns the complete response once the prompt arrives,
    /// leaving the accumulator empty for the next exchange.
    pub fn push_chunk(&mut self, chunk: &str) -> Option<String> {
        match find_trailing_prompt(chunk) {
            Some(position) => {
                self.buffer.push_str(&chunk[..position]);
                Some(take(&mut self.buffer))
            }
            None => {
                self.buffer.push_str(chunk);
                None
            }
        }
    }

    /// Text received so far without a terminating prompt.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

//! Incremental SSE frame parser.
//!
//! The chat endpoints answer with a `text/event-stream` body that arrives in
//! arbitrary byte chunks. [`FrameParser`] turns those chunks into [`Frame`]s:
//!
//! 1. bytes are decoded with [`Utf8Decoder`], which holds back an incomplete
//!    multi-byte sequence until the next chunk completes it;
//! 2. decoded text is appended to a line buffer and split on `\n`; the
//!    trailing fragment stays buffered;
//! 3. each complete line updates the current event tag (`event:`) or yields
//!    a frame under that tag (`data:`). Everything else is ignored.
//!
//! The tag is never reset by a `data:` line. Several `data:` lines under one
//! `event:` line all carry the same tag.

use std::fmt;

/// The event tag a frame was received under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventKind {
    /// No `event:` line seen yet, or an empty tag.
    #[default]
    Unset,
    /// `event: message`, a partial text chunk.
    Message,
    /// `event: done`, the completion payload.
    Done,
    /// `event: error`, an application error reported by the server.
    Error,
    /// Any other tag (the server opens with `event: test`).
    Other(String),
}

impl EventKind {
    /// Map a trimmed `event:` value to its kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "" => EventKind::Unset,
            "message" => EventKind::Message,
            "done" => EventKind::Done,
            "error" => EventKind::Error,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Whether frames of this kind end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventKind::Done | EventKind::Error)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Unset => write!(f, "<unset>"),
            EventKind::Message => write!(f, "message"),
            EventKind::Done => write!(f, "done"),
            EventKind::Error => write!(f, "error"),
            EventKind::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// One `data:` payload together with the tag it was received under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub event: EventKind,
    pub data: String,
}

/// Incremental UTF-8 decoder.
///
/// Invalid sequences are replaced with U+FFFD. An incomplete sequence at the
/// end of a chunk is kept until more bytes arrive.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let input = if self.pending.is_empty() {
            bytes.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(bytes);
            joined
        };

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Number of bytes held back waiting for the rest of a sequence.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Flush whatever is pending, replacing it with U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}

/// The SSE line state machine for one stream.
///
/// Owned by exactly one in-flight stream; never shared.
#[derive(Debug, Default)]
pub struct FrameParser {
    decoder: Utf8Decoder,
    buffer: String,
    current_event: EventKind,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next body chunk and return the frames it completes, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let text = self.decoder.decode(bytes);
        self.buffer.push_str(&text);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].find('\n') {
            let end = start + offset;
            let line = self.buffer[start..end].trim_end_matches('\r').to_string();
            start = end + 1;
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }
        self.buffer.drain(..start);
        frames
    }

    /// Process one complete line.
    fn process_line(&mut self, line: &str) -> Option<Frame> {
        if let Some(tag) = line.strip_prefix("event:") {
            self.current_event = EventKind::from_tag(tag.trim());
            tracing::trace!(event = %self.current_event, "sse event tag");
            return None;
        }

        if let Some(data) = line.strip_prefix("data:") {
            return Some(Frame {
                event: self.current_event.clone(),
                data: data.trim().to_string(),
            });
        }

        // Blank separators, comments and unknown fields.
        None
    }

    /// The tag `data:` lines are currently attributed to.
    pub fn current_event(&self) -> &EventKind {
        &self.current_event
    }

    /// Bytes and characters received but not yet part of a complete line.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.decoder.pending_len()
    }

    /// End of body: discard the unterminated trailing line, if any.
    ///
    /// Returns the number of bytes discarded.
    pub fn finish(&mut self) -> usize {
        let tail = self.decoder.finish();
        let discarded = self.buffer.len() + tail.len();
        self.buffer.clear();
        discarded
    }
}

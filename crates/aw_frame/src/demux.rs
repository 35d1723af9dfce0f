use std::{mem, str::Utf8Error};

use tracing::{trace, warn};

use crate::FrameMarkers;

/// A complete frame payload, with its markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Vec<u8>);

impl Frame {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// View the payload as text.
    ///
    /// Chunks are split on byte boundaries, so UTF-8 validity can only be
    /// checked once the frame is complete.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the next start marker. Bytes seen in this state are not
    /// part of any frame and are dropped.
    Searching,

    /// Inside a frame, buffering payload bytes until the end marker.
    Collecting,
}

/// A state machine that consumes arbitrarily-chunked bytes and produces
/// complete frame payloads, in arrival order.
///
/// A marker split across two chunks is still recognized: when a chunk ends
/// with a proper prefix of the marker currently searched for, those bytes are
/// carried over and re-examined together with the next chunk. The carry-over
/// never exceeds the marker length minus one byte.
#[derive(Debug)]
pub struct FrameDemux {
    markers: FrameMarkers,
    state: State,

    /// Payload of the frame currently being collected.
    buffer: Vec<u8>,

    /// Trailing bytes of the previous chunk that might be the start of a
    /// marker.
    carry: Vec<u8>,

    /// Frames with a payload larger than this are dropped.
    max_frame_len: Option<usize>,

    /// Number of frames dropped for exceeding `max_frame_len`.
    oversized: usize,
}

impl Default for FrameDemux {
    fn default() -> Self {
        Self::new(FrameMarkers::default())
    }
}

impl FrameDemux {
    #[must_use]
    pub fn new(markers: FrameMarkers) -> Self {
        Self {
            markers,
            state: State::Searching,
            buffer: Vec::new(),
            carry: Vec::new(),
            max_frame_len: None,
            oversized: 0,
        }
    }

    /// Drop frames whose payload grows beyond `max` bytes.
    #[must_use]
    pub fn with_max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = Some(max);
        self
    }

    #[must_use]
    pub fn markers(&self) -> &FrameMarkers {
        &self.markers
    }

    /// Whether a frame has been opened but not yet closed.
    #[must_use]
    pub fn is_collecting(&self) -> bool {
        self.state == State::Collecting
    }

    /// Number of bytes held back, waiting for more input.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len() + self.carry.len()
    }

    #[must_use]
    pub fn max_frame_len(&self) -> Option<usize> {
        self.max_frame_len
    }

    /// Number of frames dropped because they exceeded the maximum length.
    #[must_use]
    pub fn oversized_frames(&self) -> usize {
        self.oversized
    }

    /// Consume the next chunk, returning every frame it completes.
    ///
    /// A single chunk may complete zero, one or many frames.
    pub fn push(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Frame> {
        let chunk = chunk.as_ref();

        let joined: Vec<u8>;
        let mut input = if self.carry.is_empty() {
            chunk
        } else {
            let mut carry = mem::take(&mut self.carry);
            carry.extend_from_slice(chunk);
            joined = carry;
            joined.as_slice()
        };

        let mut frames = vec![];
        while !input.is_empty() {
            match self.state {
                State::Searching => {
                    let marker = self.markers.start().as_bytes();

                    let Some(pos) = find(input, marker) else {
                        let keep = partial_suffix(input, marker);
                        let dropped = input.len() - keep;
                        if dropped > 0 {
                            trace!(dropped, "Dropping bytes outside of a frame.");
                        }

                        self.carry.extend_from_slice(&input[dropped..]);
                        break;
                    };

                    if pos > 0 {
                        trace!(dropped = pos, "Dropping bytes outside of a frame.");
                    }

                    input = &input[pos + marker.len()..];
                    self.buffer.clear();
                    self.state = State::Collecting;
                }
                State::Collecting => {
                    let marker = self.markers.end().as_bytes();

                    let Some(pos) = find(input, marker) else {
                        let keep = partial_suffix(input, marker);
                        let (payload, tail) = input.split_at(input.len() - keep);
                        self.buffer.extend_from_slice(payload);
                        self.carry.extend_from_slice(tail);

                        if self.exceeds_limit() {
                            self.drop_oversized();
                        }

                        break;
                    };

                    self.buffer.extend_from_slice(&input[..pos]);
                    input = &input[pos + marker.len()..];

                    if self.exceeds_limit() {
                        self.drop_oversized();
                    } else {
                        self.state = State::Searching;
                        frames.push(Frame(mem::take(&mut self.buffer)));
                    }
                }
            }
        }

        trace!(
            frames = frames.len(),
            buffered = self.buffered_len(),
            collecting = self.is_collecting(),
            "Processed chunk."
        );

        frames
    }

    /// Signal the end of the stream.
    ///
    /// Returns the size of the unterminated frame that was discarded, if the
    /// stream ended inside one.
    pub fn finish(&mut self) -> Option<usize> {
        let partial = self.is_collecting().then(|| self.buffered_len());
        if let Some(len) = partial {
            warn!(len, "Stream ended inside an unterminated frame. Discarding it.");
        }

        self.reset();
        partial
    }

    /// Discard any partially collected frame and start over.
    pub fn reset(&mut self) {
        self.state = State::Searching;
        self.buffer.clear();
        self.carry.clear();
    }

    fn exceeds_limit(&self) -> bool {
        self.max_frame_len
            .is_some_and(|max| self.buffer.len() > max)
    }

    fn drop_oversized(&mut self) {
        warn!(
            len = self.buffer.len(),
            max = self.max_frame_len,
            "Frame exceeds maximum length. Dropping it."
        );

        self.oversized += 1;
        self.reset();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Length of the longest suffix of `haystack` that is a proper prefix of
/// `marker`.
fn partial_suffix(haystack: &[u8], marker: &[u8]) -> usize {
    (1..marker.len().min(haystack.len() + 1))
        .rev()
        .find(|&len| haystack.ends_with(&marker[..len]))
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "demux_tests.rs"]
mod tests;

use std::pin::pin;

use async_stream::stream;
use aw_frame::FrameDemux;
use futures::{Stream, StreamExt as _};
use tracing::{debug, warn};

use crate::{DecodeError, Event, decode};

/// Couples a [`FrameDemux`] with the frame decoder.
///
/// Every chunk yields the events of all frames it completes, in order. A
/// frame that fails to decode yields an error in its place, without
/// affecting the frames around it. Frames dropped for exceeding the
/// demultiplexer's size limit yield [`DecodeError::Oversized`] after the
/// chunk's other results.
#[derive(Debug, Default)]
pub struct EventDecoder {
    demux: FrameDemux,
}

impl EventDecoder {
    #[must_use]
    pub fn new(demux: FrameDemux) -> Self {
        Self { demux }
    }

    pub fn push(&mut self, chunk: impl AsRef<[u8]>) -> Vec<Result<Event, DecodeError>> {
        let oversized = self.demux.oversized_frames();
        let mut results = self
            .demux
            .push(chunk)
            .into_iter()
            .map(|frame| {
                let result = decode(&frame);
                if let Err(error) = &result {
                    warn!(%error, len = frame.len(), "Dropping malformed frame.");
                }
                result
            })
            .collect::<Vec<_>>();

        if let Some(max) = self.demux.max_frame_len() {
            let dropped = self.demux.oversized_frames() - oversized;
            results.extend((0..dropped).map(|_| Err(DecodeError::Oversized { max })));
        }

        results
    }

    /// Signal the end of the stream.
    ///
    /// Returns [`DecodeError::Unterminated`] if the stream ended inside a
    /// frame. See [`FrameDemux::finish`].
    pub fn finish(&mut self) -> Option<DecodeError> {
        self.demux.finish().map(DecodeError::Unterminated)
    }

    /// See [`FrameDemux::reset`].
    pub fn reset(&mut self) {
        self.demux.reset();
    }

    #[must_use]
    pub fn demux(&self) -> &FrameDemux {
        &self.demux
    }
}

/// An error produced by [`decode_stream`].
#[derive(Debug, thiserror::Error)]
pub enum StreamError<E> {
    /// The underlying byte stream failed. The stream ends after this error.
    #[error("transport error: {0}")]
    Transport(#[source] E),

    /// A single frame could not be decoded. The stream continues.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Adapt a stream of byte chunks into a stream of decoded events.
///
/// Decode errors are yielded in place of the offending frame. If the chunks
/// end inside a frame, a final [`DecodeError::Unterminated`] is yielded. A
/// transport error is yielded once, after which the stream ends and any
/// partially received frame is discarded.
pub fn decode_stream<S, B, E>(
    chunks: S,
    demux: FrameDemux,
) -> impl Stream<Item = Result<Event, StreamError<E>>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    stream! {
        let mut decoder = EventDecoder::new(demux);
        let mut chunks = pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    debug!("Transport failed. Discarding partial frame.");
                    decoder.reset();
                    yield Err(StreamError::Transport(error));
                    return;
                }
            };

            for result in decoder.push(chunk) {
                yield result.map_err(StreamError::Decode);
            }
        }

        if let Some(error) = decoder.finish() {
            yield Err(StreamError::Decode(error));
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;

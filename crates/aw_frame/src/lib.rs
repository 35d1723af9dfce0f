//! Incremental demultiplexing of marker-delimited frames.
//!
//! The agent streams its events as a sequence of frames of the form
//! `<event>{...}</event>`, embedded in an HTTP body that arrives in chunks of
//! arbitrary size. [`FrameDemux`] turns those chunks back into complete frame
//! payloads, in arrival order, without ever waiting for the full body.

mod demux;
mod error;
mod markers;

pub use demux::{Frame, FrameDemux};
pub use error::Error;
pub use markers::{DEFAULT_END_MARKER, DEFAULT_START_MARKER, FrameMarkers};

/// Wrap a single payload in the default frame markers.
#[must_use]
pub fn encode(payload: &str) -> String {
    FrameMarkers::default().wrap(payload)
}

/// Wrap every payload in the default frame markers, concatenating the result.
pub fn encode_all<I, S>(payloads: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let markers = FrameMarkers::default();
    payloads
        .into_iter()
        .map(|payload| markers.wrap(payload.as_ref()))
        .collect()
}

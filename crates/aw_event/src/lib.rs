//! Typed events decoded from the agent's frame stream.

mod decode;
pub mod event;
mod stream;

pub use decode::{DecodeError, decode};
pub use event::{Event, EventKind};
pub use stream::{EventDecoder, StreamError, decode_stream};

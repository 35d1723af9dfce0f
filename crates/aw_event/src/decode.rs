use serde_json::Value;

use crate::Event;

/// Reasons a frame could not be turned into an [`Event`].
///
/// All are recoverable: the frame is dropped and the stream continues.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON in frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame payload is {0}, expected an object")]
    NotAnObject(&'static str),

    #[error("frame exceeded {max} bytes and was dropped")]
    Oversized { max: usize },

    #[error("stream ended inside a frame of {0} bytes")]
    Unterminated(usize),
}

#[cfg(test)]
impl PartialEq for DecodeError {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}

/// Decode a single frame payload.
pub fn decode(payload: impl AsRef<[u8]>) -> Result<Event, DecodeError> {
    match serde_json::from_slice(payload.as_ref())? {
        Value::Object(object) => Ok(Event::from_object(object)),
        other => Err(DecodeError::NotAnObject(json_type(&other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

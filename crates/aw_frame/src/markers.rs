use crate::error::{Error, Result};

/// Marker that opens a frame on the wire.
pub const DEFAULT_START_MARKER: &str = "<event>";

/// Marker that closes a frame on the wire.
pub const DEFAULT_END_MARKER: &str = "</event>";

/// The literal start and end markers delimiting a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMarkers {
    start: String,
    end: String,
}

impl Default for FrameMarkers {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_MARKER.to_owned(),
            end: DEFAULT_END_MARKER.to_owned(),
        }
    }
}

impl FrameMarkers {
    /// Create a custom marker pair.
    ///
    /// Both markers must be non-empty.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let start = start.into();
        let end = end.into();

        if start.is_empty() {
            return Err(Error::EmptyMarker("start"));
        }

        if end.is_empty() {
            return Err(Error::EmptyMarker("end"));
        }

        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> &str {
        &self.start
    }

    #[must_use]
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Wrap `payload` in this marker pair.
    #[must_use]
    pub fn wrap(&self, payload: &str) -> String {
        let mut frame = String::with_capacity(self.start.len() + payload.len() + self.end.len());
        frame.push_str(&self.start);
        frame.push_str(payload);
        frame.push_str(&self.end);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_markers() {
        assert_eq!(FrameMarkers::new("", "]"), Err(Error::EmptyMarker("start")));
        assert_eq!(FrameMarkers::new("[", ""), Err(Error::EmptyMarker("end")));
    }

    #[test]
    fn test_wrap() {
        let markers = FrameMarkers::new("<<", ">>").unwrap();
        assert_eq!(markers.wrap("{}"), "<<{}>>");
        assert_eq!(FrameMarkers::default().wrap("x"), "<event>x</event>");
    }
}

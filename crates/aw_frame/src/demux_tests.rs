use pretty_assertions::assert_eq;
use test_log::test;

use super::*;
use crate::{encode, encode_all};

fn payloads(frames: Vec<Frame>) -> Vec<String> {
    frames
        .into_iter()
        .map(|frame| String::from_utf8(frame.into_bytes()).unwrap())
        .collect()
}

fn push_all<'a>(demux: &mut FrameDemux, chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<String> {
    chunks
        .into_iter()
        .flat_map(|chunk| payloads(demux.push(chunk)))
        .collect()
}

#[test]
fn test_single_frame() {
    let mut demux = FrameDemux::default();

    assert_eq!(payloads(demux.push(encode(r#"{"a":1}"#))), vec![r#"{"a":1}"#]);
    assert!(!demux.is_collecting());
    assert_eq!(demux.buffered_len(), 0);
}

#[test]
fn test_multiple_frames_in_one_chunk() {
    let mut demux = FrameDemux::default();
    let stream = encode_all(["1", "2", "3"]);

    assert_eq!(payloads(demux.push(stream)), vec!["1", "2", "3"]);
}

#[test]
fn test_frame_spanning_chunks() {
    let mut demux = FrameDemux::default();

    assert!(demux.push("<event>{\"text\":").is_empty());
    assert!(demux.is_collecting());
    assert!(demux.push("\"hello ").is_empty());
    assert_eq!(payloads(demux.push("world\"}</event>")), vec![
        r#"{"text":"hello world"}"#
    ]);
}

#[test]
fn test_drops_bytes_outside_frames() {
    let mut demux = FrameDemux::default();

    let frames = payloads(demux.push("noise<event>1</event>\n\nmore noise<event>2</event>tail"));
    assert_eq!(frames, vec!["1", "2"]);
    assert_eq!(demux.buffered_len(), 0);

    assert!(demux.push("still nothing").is_empty());
    assert_eq!(payloads(demux.push("<event>3</event>")), vec!["3"]);
}

#[test]
fn test_end_marker_split_across_chunks() {
    let mut demux = FrameDemux::default();

    let chunk1 = r#"<event>{"data":{"type":"user_notification","payload":{"text":"hi"}}}</eve"#;
    assert!(demux.push(chunk1).is_empty());
    assert_eq!(payloads(demux.push("nt>")), vec![
        r#"{"data":{"type":"user_notification","payload":{"text":"hi"}}}"#
    ]);
}

#[test]
fn test_start_marker_split_across_chunks() {
    let mut demux = FrameDemux::default();

    assert!(demux.push("garbage<ev").is_empty());
    assert!(!demux.is_collecting());
    assert_eq!(demux.buffered_len(), 3);
    assert_eq!(payloads(demux.push("ent>1</event>")), vec!["1"]);
}

#[test]
fn test_marker_split_into_single_bytes() {
    let mut demux = FrameDemux::default();
    let stream = encode_all(["first", "second"]);

    let frames = push_all(&mut demux, stream.as_bytes().chunks(1));
    assert_eq!(frames, vec!["first", "second"]);
}

#[test]
fn test_partial_marker_that_does_not_complete() {
    let mut demux = FrameDemux::default();

    assert!(demux.push("<eve").is_empty());
    assert!(demux.push("rything is fine").is_empty());
    assert_eq!(payloads(demux.push("<event>ok</event>")), vec!["ok"]);

    // Inside a frame, a false end-marker prefix is part of the payload.
    assert!(demux.push("<event>a</ev").is_empty());
    assert!(demux.push("il>b").is_empty());
    assert_eq!(payloads(demux.push("</event>")), vec!["a</evil>b"]);
}

#[test]
fn test_every_two_way_partition_yields_the_same_frames() {
    let stream = encode_all([
        r#"{"data":{"type":"conversation_started","payload":{"conversation_id":"abc"}}}"#,
        r#"{"data":{"type":"user_notification","payload":{"text":"<b>bold</b>"}}}"#,
        r#"{"data":{"event_type":"tool_started","tool_name":"web_search"}}"#,
    ]);
    let bytes = stream.as_bytes();

    let expected = payloads(FrameDemux::default().push(bytes));
    assert_eq!(expected.len(), 3);

    for split in 0..=bytes.len() {
        let mut demux = FrameDemux::default();
        let (head, tail) = bytes.split_at(split);

        assert_eq!(push_all(&mut demux, [head, tail]), expected, "split at {split}");
        assert_eq!(demux.buffered_len(), 0, "split at {split}");
    }
}

#[test]
fn test_multibyte_characters_split_across_chunks() {
    let mut demux = FrameDemux::default();
    let stream = encode(r#"{"text":"héllo wörld ✓"}"#);
    let bytes = stream.as_bytes();

    // Split inside the three-byte check mark.
    let check = stream.find('✓').unwrap();
    assert!(demux.push(&bytes[..=check]).is_empty());

    let frames = demux.push(&bytes[check + 1..]);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].to_str().unwrap(), r#"{"text":"héllo wörld ✓"}"#);
}

#[test]
fn test_empty_frame() {
    let mut demux = FrameDemux::default();

    let frames = demux.push("<event></event>");
    assert_eq!(frames.len(), 1);
    assert!(frames[0].is_empty());
}

#[test]
fn test_custom_markers() {
    let markers = FrameMarkers::new("[[", "]]").unwrap();
    let mut demux = FrameDemux::new(markers);

    assert!(demux.push("x[").is_empty());
    assert_eq!(payloads(demux.push("[a]")), Vec::<String>::new());
    assert_eq!(payloads(demux.push("][[b]]")), vec!["a", "b"]);
}

#[test]
fn test_oversized_frame_is_dropped_and_stream_recovers() {
    let mut demux = FrameDemux::default().with_max_frame_len(4);

    assert!(demux.push("<event>0123456789").is_empty());
    assert_eq!(demux.oversized_frames(), 1);
    assert!(!demux.is_collecting());

    // The tail of the dropped frame is stray text now.
    assert_eq!(payloads(demux.push("</event><event>ok</event>")), vec!["ok"]);

    assert_eq!(payloads(demux.push("<event>12345</event>")), Vec::<String>::new());
    assert_eq!(demux.oversized_frames(), 2);
}

#[test]
fn test_reset_discards_partial_frame() {
    let mut demux = FrameDemux::default();

    assert!(demux.push("<event>{\"half").is_empty());
    demux.reset();

    assert!(!demux.is_collecting());
    assert_eq!(demux.buffered_len(), 0);
    assert!(demux.push("\"}</event>").is_empty());
}

#[test]
fn test_finish_reports_unterminated_frame() {
    let mut demux = FrameDemux::default();

    assert_eq!(demux.finish(), None);

    demux.push("<event>abc");
    assert_eq!(demux.finish(), Some(3));
    assert!(!demux.is_collecting());

    demux.push("<event>abc</event>");
    assert_eq!(demux.finish(), None);
}

use crate::logging::emit_sse_parse_error;
use crate::types::StreamEvent;
use bytes::BytesMut;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Reassembles newline-terminated lines from arbitrarily split byte chunks.
///
/// Bytes are held until a `\n` arrives, so a UTF-8 sequence split across two
/// reads is decoded whole. A trailing `\r` is dropped from each line.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
            let raw = self.buffer.split_to(end + 1);
            let line = &raw[..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            lines.push(String::from_utf8_lossy(line).into_owned());
        }

        lines
    }

    /// Bytes buffered after the last terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Drops the unterminated tail and returns how many bytes were discarded.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        discarded
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Payload(&'a str),
    Done,
    Noise,
}

pub fn classify_line(line: &str) -> LineKind<'_> {
    match line.strip_prefix(DATA_PREFIX) {
        Some(payload) if payload.trim_end() == DONE_SENTINEL => LineKind::Done,
        Some(payload) => LineKind::Payload(payload),
        None => LineKind::Noise,
    }
}

pub fn decode_payload(payload: &str) -> serde_json::Result<StreamEvent> {
    serde_json::from_str(payload)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Event(StreamEvent),
    Done,
}

/// Line framer plus event decoder for the chat stream.
///
/// Once the `[DONE]` sentinel is seen the parser stops: the rest of that chunk
/// and every later chunk produce nothing.
#[derive(Debug, Default)]
pub struct StreamParser {
    framer: LineFramer,
    finished: bool,
    skipped: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        let mut decoded = Vec::new();
        if self.finished {
            return decoded;
        }

        for line in self.framer.push(chunk) {
            match classify_line(&line) {
                LineKind::Noise => {}
                LineKind::Done => {
                    tracing::debug!("stream sentinel received");
                    self.finished = true;
                    self.framer.finish();
                    decoded.push(Decoded::Done);
                    break;
                }
                LineKind::Payload(payload) => match decode_payload(payload) {
                    Ok(event) => decoded.push(Decoded::Event(event)),
                    Err(error) => {
                        self.skipped += 1;
                        emit_sse_parse_error(payload, &error);
                    }
                },
            }
        }

        decoded
    }

    /// Ends the stream, discarding any unterminated line.
    pub fn finish(&mut self) {
        let discarded = self.framer.finish();
        if discarded > 0 {
            tracing::debug!(bytes = discarded, "discarding unterminated stream tail");
        }
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of payloads dropped because they failed to decode.
    pub fn skipped_payloads(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EventKind;

    #[test]
    fn test_framer_holds_partial_line_until_terminator() {
        let mut framer = LineFramer::new();
        assert!(framer.push(b"data: {\"type\"").is_empty());
        assert_eq!(framer.pending(), 13);
        let lines = framer.push(b":\"done\"}\r\n\n");
        assert_eq!(lines, vec!["data: {\"type\":\"done\"}".to_string(), String::new()]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_framer_reassembles_split_utf8() {
        let text = "data: {\"content\":\"思考\"}\n".as_bytes();
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for byte in text {
            lines.extend(framer.push(std::slice::from_ref(byte)));
        }
        assert_eq!(lines, vec!["data: {\"content\":\"思考\"}".to_string()]);
    }

    #[test]
    fn test_framer_finish_discards_tail() {
        let mut framer = LineFramer::new();
        framer.push(b"data: partial");
        assert_eq!(framer.finish(), 13);
        assert!(framer.push(b"\n").len() == 1);
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("data: [DONE]"), LineKind::Done);
        assert_eq!(classify_line("data: {}"), LineKind::Payload("{}"));
        assert_eq!(classify_line(""), LineKind::Noise);
        assert_eq!(classify_line("event: message"), LineKind::Noise);
        assert_eq!(classify_line("data:{}"), LineKind::Noise);
    }

    #[test]
    fn test_parser_stops_at_sentinel_within_chunk() {
        let mut parser = StreamParser::new();
        let decoded = parser.process(
            b"data: {\"type\":\"response\",\"content\":\"a\"}\n\ndata: [DONE]\n\ndata: {\"type\":\"response\",\"content\":\"b\"}\n\n",
        );
        assert_eq!(
            decoded,
            vec![
                Decoded::Event(StreamEvent::with_content(EventKind::Response, "a")),
                Decoded::Done,
            ]
        );
        assert!(parser.is_finished());
        assert!(parser
            .process(b"data: {\"type\":\"done\"}\n\n")
            .is_empty());
    }

    #[test]
    fn test_parser_skips_malformed_payload() {
        let mut parser = StreamParser::new();
        let decoded = parser.process(
            b"data: {\"type\":\"response\",\"content\":\"a\"}\ndata: {\"type\":\"resp\ndata: {\"type\":\"done\"}\n",
        );
        assert_eq!(decoded.len(), 2);
        assert_eq!(parser.skipped_payloads(), 1);
    }
}

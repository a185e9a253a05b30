//! Line framing of OpenAI-style server-sent events.
//!
//! [`LineDecoder`] is sans-IO: it is fed raw byte buffers with arbitrary
//! boundaries and returns the text deltas of every complete `data:` record.
//! Bytes after the last newline are kept until the next feed.

use tracing::{trace, warn};

use crate::openai::ChatCompletionChunk;

/// Payload that terminates a completion stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Incremental SSE record decoder.
#[derive(Debug, Default)]
pub struct LineDecoder {
    leftover: Vec<u8>,
    done: bool,
    malformed: usize,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of records skipped because their payload was not valid JSON.
    pub fn malformed_count(&self) -> usize {
        self.malformed
    }

    /// Feed one buffer, returning the deltas of the records it completed.
    ///
    /// Records following the sentinel are ignored, as is everything fed
    /// after it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }

        self.leftover.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(pos) = self.leftover[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let line = self.leftover[start..end].to_vec();
            start = end + 1;

            if let Some(delta) = self.decode_line(&line) {
                deltas.push(delta);
            }
            if self.done {
                self.leftover.clear();
                return deltas;
            }
        }

        self.leftover.drain(..start);
        deltas
    }

    /// Decode whatever remains after the transport ended without a final
    /// newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.done || self.leftover.is_empty() {
            self.leftover.clear();
            return None;
        }
        let line = std::mem::take(&mut self.leftover);
        self.decode_line(&line)
    }

    fn decode_line(&mut self, raw: &[u8]) -> Option<String> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();

        if line.is_empty() || line.starts_with(':') {
            return None;
        }

        // event:, id: and retry: fields carry nothing we use
        let payload = line.strip_prefix("data:")?.trim_start();
        if payload.is_empty() {
            return None;
        }
        if payload == DONE_SENTINEL {
            trace!(subsystem = "inference", component = "decoder", "Stream sentinel received");
            self.done = true;
            return None;
        }

        match serde_json::from_str::<ChatCompletionChunk>(payload) {
            Ok(chunk) => chunk.delta_text(),
            Err(e) => {
                self.malformed += 1;
                warn!(
                    subsystem = "inference",
                    component = "decoder",
                    error = %e,
                    record_len = payload.len(),
                    "Skipping malformed stream record"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_single_record() {
        let mut decoder = LineDecoder::new();
        let deltas = decoder.feed(record("Hello").as_bytes());
        assert_eq!(deltas, vec!["Hello".to_string()]);
        assert!(!decoder.is_done());
    }

    #[test]
    fn test_record_split_mid_line_is_reassembled() {
        let input = record("split across reads");
        let (a, b) = input.as_bytes().split_at(17);

        let mut decoder = LineDecoder::new();
        assert!(decoder.feed(a).is_empty());
        assert_eq!(decoder.feed(b), vec!["split across reads".to_string()]);
        assert_eq!(decoder.malformed_count(), 0);
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let input = record("你好");
        let bytes = input.as_bytes();
        let mut decoder = LineDecoder::new();
        let mut out = String::new();
        for byte in bytes {
            for delta in decoder.feed(std::slice::from_ref(byte)) {
                out.push_str(&delta);
            }
        }
        assert_eq!(out, "你好");
    }

    #[test]
    fn test_done_is_not_parsed_or_emitted() {
        let mut decoder = LineDecoder::new();
        let deltas = decoder.feed(b"data: [DONE]\n\n");
        assert!(deltas.is_empty());
        assert!(decoder.is_done());
        assert_eq!(decoder.malformed_count(), 0);
    }

    #[test]
    fn test_records_after_done_are_ignored() {
        let mut decoder = LineDecoder::new();
        let input = format!("{}data: [DONE]\n\n{}", record("a"), record("b"));
        assert_eq!(decoder.feed(input.as_bytes()), vec!["a".to_string()]);
        assert!(decoder.feed(record("c").as_bytes()).is_empty());
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_malformed_record_is_skipped() {
        let mut decoder = LineDecoder::new();
        let input = format!("{}data: {{not json\n\n{}", record("a"), record("b"));
        assert_eq!(
            decoder.feed(input.as_bytes()),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(decoder.malformed_count(), 1);
    }

    #[test]
    fn test_crlf_comments_and_other_fields() {
        let mut decoder = LineDecoder::new();
        let input = concat!(
            ": keep-alive\r\n",
            "event: message\r\n",
            "id: 1\r\n",
            "data:{\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\r\n",
            "\r\n"
        );
        assert_eq!(decoder.feed(input.as_bytes()), vec!["x".to_string()]);
        assert_eq!(decoder.malformed_count(), 0);
    }

    #[test]
    fn test_role_only_delta_yields_nothing() {
        let mut decoder = LineDecoder::new();
        let input = "data: {\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\"}}]}\n";
        assert!(decoder.feed(input.as_bytes()).is_empty());
    }

    #[test]
    fn test_null_delta_is_not_malformed() {
        let mut decoder = LineDecoder::new();
        let input = "data: {\"choices\":[{\"delta\":null,\"finish_reason\":\"stop\"}]}\n\
                     data: {\"choices\":null}\n";
        assert!(decoder.feed(input.as_bytes()).is_empty());
        assert_eq!(decoder.malformed_count(), 0);
    }

    #[test]
    fn test_finish_decodes_unterminated_record() {
        let mut decoder = LineDecoder::new();
        let input = record("tail");
        let unterminated = input.trim_end();
        assert!(decoder.feed(unterminated.as_bytes()).is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert!(decoder.finish().is_none());
    }
}

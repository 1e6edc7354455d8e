//! Incremental Server-Sent Events decoder.
//!
//! Bytes arrive in arbitrary chunks; complete events come out. Lines end in
//! LF or CRLF. Incomplete events left at end of stream are discarded.

use super::transport::RawMessage;

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    last_id: Option<String>,
    retry_ms: Option<u64>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawMessage> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(msg) = self.process_line(&line) {
                out.push(msg);
            }
        }
        out
    }

    /// Reconnection delay the server last requested, if any.
    pub fn retry_ms(&self) -> Option<u64> {
        self.retry_ms
    }

    fn process_line(&mut self, line: &str) -> Option<RawMessage> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            "retry" => {
                if let Ok(ms) = value.parse() {
                    self.retry_ms = Some(ms);
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<RawMessage> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(RawMessage {
            event,
            data,
            id: self.last_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_event_across_chunks() {
        let mut d = SseDecoder::new();
        assert!(d.feed(b"event: cluster-up").is_empty());
        assert!(d.feed(b"date\ndata: {\"a\":").is_empty());
        let out = d.feed(b"1}\n\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].event.as_deref(), Some("cluster-update"));
        assert_eq!(out[0].data, "{\"a\":1}");
    }

    #[test]
    fn test_multiline_data_and_crlf() {
        let mut d = SseDecoder::new();
        let out = d.feed(b"id: 7\r\ndata: line one\r\ndata:line two\r\n\r\n");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].data, "line one\nline two");
        assert_eq!(out[0].id.as_deref(), Some("7"));
        assert_eq!(out[0].event, None);
    }

    #[test]
    fn test_comments_and_empty_events_ignored() {
        let mut d = SseDecoder::new();
        let out = d.feed(b": keep-alive\n\nevent: ping\n\nretry: 3000\n\n");
        assert!(out.is_empty());
        assert_eq!(d.retry_ms(), Some(3000));
    }

    #[test]
    fn test_event_name_resets_between_events() {
        let mut d = SseDecoder::new();
        let out = d.feed(b"event: cluster-update\ndata: 1\n\ndata: 2\n\n");
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].event, None);
        assert_eq!(out[1].data, "2");
    }

    #[test]
    fn test_split_utf8_sequence() {
        let mut d = SseDecoder::new();
        let bytes = "data: é\n\n".as_bytes();
        let (a, b) = bytes.split_at(7);
        assert!(d.feed(a).is_empty());
        let out = d.feed(b);
        assert_eq!(out[0].data, "é");
    }
}

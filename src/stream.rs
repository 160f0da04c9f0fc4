use log::warn;
use serde::{Deserialize, Serialize};

use crate::survey::Survey;

/// A single event from the generation endpoint's SSE stream.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Step { message: String },
    Progress { progress: f32, message: String },
    Thinking { message: String },
    Complete { survey: Option<Survey> },
    Error { message: String },
}

/// Incremental decoder for `data: <json>` SSE lines.
///
/// Chunks may split a logical line anywhere; the decoder carries the
/// incomplete tail over to the next `feed` call. A line that fails to parse
/// is logged and skipped so one bad record never aborts the stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
}

const DATA_PREFIX: &str = "data: ";

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk, returning every event completed by it.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamEvent> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].to_string();
            self.buffer.drain(..newline_pos + 1);

            if let Some(event) = parse_data_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush the remaining buffer; the terminal chunk of a stream may lack a
    /// trailing newline.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            if let Some(event) = parse_data_line(&line) {
                events.push(event);
            }
        }
        events
    }
}

/// Decode one complete line. Blank lines, comments and non-`data:` fields
/// are ignored; they are part of the SSE framing, not errors.
fn parse_data_line(line: &str) -> Option<StreamEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);

    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("解析SSE数据时出错: {} (原始数据: {})", e, line);
            None
        }
    }
}

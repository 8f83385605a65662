//! Server-Sent Events (SSE) streaming for spoken commentary.
//!
//! Text deltas are forwarded into a [`SpeechSender`] as they arrive, so the
//! environment can speak them while the rest of the transition runs.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ReasoningError;
use crate::llm::{ChatRequest, OpenRouterClient};
use crate::reasoning::SpeechSender;

/// One parsed SSE line.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    /// Blank line, comment, or a chunk without text.
    Skip,
    Text(String),
    Done,
}

#[derive(Deserialize, Debug)]
struct StreamChunk {
    choices: Option<Vec<StreamChoice>>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenRouterClient {
    /// Stream a chat completion into `speech`.
    ///
    /// The sender is always closed: with the accumulated text on success, or
    /// with the error on failure. The error is also returned.
    pub async fn chat_stream_into(
        &self,
        body: &ChatRequest,
        mut speech: SpeechSender,
    ) -> Result<(), ReasoningError> {
        match self.forward_stream(body, &mut speech).await {
            Ok(()) => {
                speech.finish();
                Ok(())
            }
            Err(e) => {
                speech.fail(ReasoningError::Stream(e.to_string()));
                Err(e)
            }
        }
    }

    async fn forward_stream(
        &self,
        body: &ChatRequest,
        speech: &mut SpeechSender,
    ) -> Result<(), ReasoningError> {
        let mut stream_body = serde_json::to_value(body)
            .map_err(|e| ReasoningError::Request(format!("failed to serialize request: {e}")))?;
        stream_body["stream"] = serde_json::Value::Bool(true);

        debug!("Sending streaming chat request");
        let mut resp = self
            .post(&stream_body)
            .send()
            .await
            .map_err(|e| ReasoningError::Request(format!("streaming request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ReasoningError::Request(format!(
                "OpenRouter API HTTP {status}: {text}"
            )));
        }

        let mut buffer = LineBuffer::default();
        let mut deltas = 0usize;
        'read: while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| ReasoningError::Stream(format!("failed to read chunk: {e}")))?
        {
            buffer.push(&chunk);
            while let Some(line) = buffer.next_line() {
                match parse_sse_line(&line) {
                    SseLine::Skip => {}
                    SseLine::Text(text) => {
                        deltas += 1;
                        speech.send(text).await;
                    }
                    SseLine::Done => break 'read,
                }
            }
        }

        // Trailing data without a final newline.
        if let SseLine::Text(text) = parse_sse_line(&buffer.rest()) {
            deltas += 1;
            speech.send(text).await;
        }

        debug!("Stream completed with {deltas} text deltas");
        Ok(())
    }
}

/// Raw stream bytes, decoded one complete line at a time so a multi-byte
/// character split across chunks survives intact.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// The next `\n`-terminated line, including the terminator.
    fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.bytes.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.bytes.drain(..=newline_pos).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Whatever is left after the last newline.
    fn rest(&mut self) -> String {
        let rest = std::mem::take(&mut self.bytes);
        String::from_utf8_lossy(&rest).into_owned()
    }
}

fn parse_sse_line(line: &str) -> SseLine {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return SseLine::Skip;
    }
    if line == "data: [DONE]" {
        return SseLine::Done;
    }
    let Some(data) = line.strip_prefix("data: ") else {
        return SseLine::Skip;
    };
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => {
            let text: String = chunk
                .choices
                .unwrap_or_default()
                .into_iter()
                .filter_map(|c| c.delta.and_then(|d| d.content))
                .collect();
            if text.is_empty() {
                SseLine::Skip
            } else {
                SseLine::Text(text)
            }
        }
        Err(e) => {
            warn!("Failed to parse SSE chunk: {e}; data: {data}");
            SseLine::Skip
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Text("Hello".into()));
    }

    #[test]
    fn done_and_comments() {
        assert_eq!(parse_sse_line("data: [DONE]\n"), SseLine::Done);
        assert_eq!(parse_sse_line(": OPENROUTER PROCESSING"), SseLine::Skip);
        assert_eq!(parse_sse_line(""), SseLine::Skip);
    }

    #[test]
    fn empty_or_role_only_delta_is_skipped() {
        let line = r#"data: {"choices":[{"delta":{"role":"assistant","content":""}}]}"#;
        assert_eq!(parse_sse_line(line), SseLine::Skip);
        let usage = r#"data: {"choices":[],"usage":{"prompt_tokens":3}}"#;
        assert_eq!(parse_sse_line(usage), SseLine::Skip);
    }

    #[test]
    fn character_split_across_chunks_is_kept() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"caf\u{e9}\"}}]}\n";
        let bytes = line.as_bytes();
        let split = line.find('\u{e9}').unwrap() + 1;

        let mut buffer = LineBuffer::default();
        buffer.push(&bytes[..split]);
        assert_eq!(buffer.next_line(), None);
        buffer.push(&bytes[split..]);
        let decoded = buffer.next_line().unwrap();
        assert_eq!(parse_sse_line(&decoded), SseLine::Text("caf\u{e9}".into()));
        assert_eq!(buffer.rest(), "");
    }

    #[test]
    fn lines_are_split_and_rest_is_kept() {
        let mut buffer = LineBuffer::default();
        buffer.push(b": keepalive\ndata: [DONE]\ntrail");
        assert_eq!(buffer.next_line().as_deref(), Some(": keepalive\n"));
        assert_eq!(buffer.next_line().as_deref(), Some("data: [DONE]\n"));
        assert_eq!(buffer.next_line(), None);
        assert_eq!(buffer.rest(), "trail");
    }

    #[test]
    fn malformed_json_is_skipped() {
        assert_eq!(parse_sse_line("data: {oops"), SseLine::Skip);
    }
}

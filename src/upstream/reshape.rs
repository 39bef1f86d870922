use std::fmt::Display;

use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, header};
use axum::response::Response;
use futures_util::{Stream, StreamExt};

use crate::error::ProxyError;

use super::types::UpstreamChunk;

const MIN_LINE_LEN: usize = 6;
const DATA_PREFIX: &[u8] = b"data: ";
const DONE_SENTINEL: &[u8] = b"[DONE]";

/// 单行 SSE 的处理结果
#[derive(Debug)]
pub enum LineOutcome {
    /// Keep-alive or blank line.
    Skip,
    Append(String),
    /// `[DONE]` or anything that is not a JSON object.
    Done,
    /// Undecodable chunk; reading stops with what has been collected.
    Malformed(serde_json::Error),
}

/// Classifies one newline-terminated line from the upstream body.
pub fn classify_line(line: &[u8]) -> LineOutcome {
    if line.len() < MIN_LINE_LEN {
        return LineOutcome::Skip;
    }
    let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line);

    if payload.starts_with(DONE_SENTINEL) || !payload.starts_with(b"{") {
        return LineOutcome::Done;
    }

    match serde_json::from_slice::<UpstreamChunk>(payload) {
        Ok(chunk) => LineOutcome::Append(chunk.first_delta().to_string()),
        Err(e) => LineOutcome::Malformed(e),
    }
}

/// 将分片到达的字节流按行折叠为完整文本
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    pending: Vec<u8>,
    text: String,
    finished: bool,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one body chunk. Returns `false` once no more input is wanted.
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if self.finished {
            return false;
        }
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(pos) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + pos + 1;
            match classify_line(&self.pending[start..end]) {
                LineOutcome::Skip => {}
                LineOutcome::Append(delta) => self.text.push_str(&delta),
                LineOutcome::Done => self.finished = true,
                LineOutcome::Malformed(e) => {
                    tracing::warn!(
                        "Stopping at undecodable upstream chunk after {} bytes of text: {}",
                        self.text.len(),
                        e
                    );
                    self.finished = true;
                }
            }
            start = end;
            if self.finished {
                break;
            }
        }
        self.pending.drain(..start);

        !self.finished
    }

    /// Ends the fold. An unterminated trailing fragment is discarded.
    pub fn finish(self) -> String {
        if !self.pending.is_empty() && !self.finished {
            tracing::debug!(
                "Discarding {} trailing bytes without newline",
                self.pending.len()
            );
        }
        self.text
    }
}

/// Batch mode: reads the upstream body until a stop condition and returns the
/// concatenated deltas. A read error before that point is `StreamInterrupted`.
pub async fn collect_deltas<S, E>(body: S) -> Result<String, ProxyError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut body = std::pin::pin!(body);
    let mut acc = DeltaAccumulator::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| ProxyError::StreamInterrupted(e.to_string()))?;
        if !acc.feed(&chunk) {
            break;
        }
    }

    Ok(acc.finish())
}

/// Stream mode: mirrors status and content type, body bytes go through untouched.
pub fn passthrough(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let content_type: Option<HeaderValue> = upstream.headers().get(header::CONTENT_TYPE).cloned();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    if let Some(ct) = content_type {
        response.headers_mut().insert(header::CONTENT_TYPE, ct);
    }
    response
}

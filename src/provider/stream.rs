//! Line framing for streamed HTTP bodies.
//!
//! Both streaming formats the providers read are line-oriented
//! (newline-delimited JSON for Ollama, server-sent events for OpenAI), but
//! network chunks split lines, and sometimes multi-byte characters,
//! arbitrarily. Bytes are buffered until a full line is available.

use futures::StreamExt;

use super::ProviderError;

#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed, without the
    /// trailing `\n` / `\r\n`.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw[..raw.len() - 1]);
            lines.push(line.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// The unterminated tail, if any.
    pub(crate) fn finish(self) -> Option<String> {
        let tail = String::from_utf8_lossy(&self.pending).trim().to_string();
        (!tail.is_empty()).then_some(tail)
    }
}

/// Whether a line-handler wants more input.
pub(crate) enum Flow {
    Continue,
    Stop,
}

/// Drive `response` to completion, calling `on_line` for each non-blank line.
pub(crate) async fn for_each_line<F>(
    backend: &str,
    response: reqwest::Response,
    mut on_line: F,
) -> Result<(), ProviderError>
where
    F: FnMut(&str) -> Result<Flow, ProviderError>,
{
    let mut body = response.bytes_stream();
    let mut buffer = LineBuffer::default();

    while let Some(chunk) = body.next().await {
        let bytes = chunk.map_err(|e| ProviderError::from_reqwest(backend, &e))?;
        for line in buffer.push(&bytes) {
            if line.trim().is_empty() {
                continue;
            }
            if let Flow::Stop = on_line(&line)? {
                return Ok(());
            }
        }
    }

    if let Some(tail) = buffer.finish() {
        on_line(&tail)?;
    }
    Ok(())
}

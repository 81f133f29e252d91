//! Server-sent event decoding for streamed generations.

use std::collections::VecDeque;
use std::fmt::Display;

use futures::{Stream, StreamExt};

use quill_core::error::QuillError;
use quill_core::traits::StreamItem;

use crate::gemini::GeminiResponse;

/// Incremental decoder for `data:` lines carrying Gemini response chunks.
///
/// Bytes are buffered until a full line is available, so multi-byte
/// characters split across network chunks decode correctly.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed a network chunk, returning every text fragment it completes.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<StreamItem> {
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(item) = Self::decode_line(&line) {
                out.push(item);
            }
        }
        out
    }

    /// Flush a trailing line that was not newline-terminated.
    pub(crate) fn finish(&mut self) -> Vec<StreamItem> {
        let rest = std::mem::take(&mut self.buffer);
        Self::decode_line(&rest).into_iter().collect()
    }

    fn decode_line(raw: &[u8]) -> Option<StreamItem> {
        let line = String::from_utf8_lossy(raw);
        let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim();
        if data.is_empty() || data == "[DONE]" {
            return None;
        }

        match serde_json::from_str::<GeminiResponse>(data) {
            Ok(chunk) => {
                let text = chunk.text();
                (!text.is_empty()).then_some(Ok(text))
            }
            Err(e) => Some(Err(QuillError::llm(format!(
                "Malformed stream chunk: {}",
                e
            )))),
        }
    }
}

struct DecodeState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<StreamItem>,
    finished: bool,
}

/// Turn a raw byte stream into a stream of text fragments.
///
/// A transport error is yielded once and ends the stream.
pub(crate) fn decode_event_stream<S, B, E>(body: S) -> impl Stream<Item = StreamItem> + Send
where
    S: Stream<Item = Result<B, E>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let items = state.decoder.push(bytes.as_ref());
                    state.pending.extend(items);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(QuillError::llm(format!("Gemini stream interrupted: {}", e))));
                }
                None => {
                    state.finished = true;
                    let items = state.decoder.finish();
                    state.pending.extend(items);
                }
            }
        }
    })
}

//! Async adapter turning a response body into coalesced text events.

use std::collections::VecDeque;
use std::pin::Pin;

use futures::{stream, Stream, StreamExt};
use tokio::time::Instant;
use tracing::{debug, trace};

use jotter_core::Error;

use crate::coalesce::{ChunkCoalescer, CoalesceConfig};
use crate::decoder::LineDecoder;
use crate::openai::ByteStream;

/// One observable step of a completion stream.
///
/// A stream yields zero or more `Chunk`s followed by exactly one terminal
/// `Completed` or `Failed`. Chunks concatenate to the text reported by the
/// terminal event.
#[derive(Debug)]
pub enum StreamEvent {
    Chunk(String),
    Completed { full_text: String },
    Failed { error: Error, partial_text: String },
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk(_))
    }
}

pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

struct DecodeState {
    body: ByteStream,
    lines: LineDecoder,
    coalescer: ChunkCoalescer,
    pending: VecDeque<StreamEvent>,
    started: Instant,
    chunks: usize,
    finished: bool,
}

impl DecodeState {
    fn on_bytes(&mut self, bytes: &[u8]) {
        for delta in self.lines.feed(bytes) {
            trace!(subsystem = "inference", component = "decoder", delta_len = delta.len(), "Delta");
            self.coalescer.push(&delta);
        }
        if self.lines.is_done() {
            self.complete();
        } else if let Some(chunk) = self.coalescer.poll(Instant::now()) {
            self.emit(chunk);
        }
    }

    fn on_eof(&mut self) {
        if let Some(delta) = self.lines.finish() {
            self.coalescer.push(&delta);
        }
        self.complete();
    }

    fn emit(&mut self, chunk: String) {
        self.chunks += 1;
        self.pending.push_back(StreamEvent::Chunk(chunk));
    }

    fn complete(&mut self) {
        if let Some(rest) = self.coalescer.flush() {
            self.emit(rest);
        }
        let full_text = self.coalescer.full_text().to_string();
        debug!(
            subsystem = "inference",
            component = "decoder",
            op = "decode",
            chunk_count = self.chunks,
            response_len = full_text.len(),
            malformed = self.lines.malformed_count(),
            duration_ms = self.started.elapsed().as_millis() as u64,
            "Stream completed"
        );
        self.pending.push_back(StreamEvent::Completed { full_text });
        self.finished = true;
    }

    fn fail(&mut self, error: Error) {
        if let Some(rest) = self.coalescer.flush() {
            self.emit(rest);
        }
        let partial_text = self.coalescer.full_text().to_string();
        debug!(
            subsystem = "inference",
            component = "decoder",
            op = "decode",
            chunk_count = self.chunks,
            response_len = partial_text.len(),
            error = %error,
            "Stream failed"
        );
        self.pending.push_back(StreamEvent::Failed {
            error,
            partial_text,
        });
        self.finished = true;
    }
}

/// Decode an established completion body into [`StreamEvent`]s.
///
/// Thresholds are evaluated after every read. The `[DONE]` sentinel
/// completes the stream without waiting for the transport to close.
pub fn decode_stream(body: ByteStream, config: CoalesceConfig) -> EventStream {
    let state = DecodeState {
        body,
        lines: LineDecoder::new(),
        coalescer: ChunkCoalescer::new(config),
        pending: VecDeque::new(),
        started: Instant::now(),
        chunks: 0,
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => state.on_bytes(&bytes),
                Some(Err(error)) => state.fail(error),
                None => state.on_eof(),
            }
        }
    }))
}

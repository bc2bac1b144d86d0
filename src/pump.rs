use std::io::{ErrorKind, Read};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::lifecycle::Lifecycle;
use crate::process_manager::{ProcessEvent, StreamKind};
use crate::sanitize::{sanitize, split_incomplete_tail};

pub const CHUNK_SIZE: usize = 32 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpOutcome {
    EndOfStream,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub offset: usize,
    pub truncated: bool,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.truncated {
            write!(f, "stream ended inside a UTF-8 sequence")
        } else {
            write!(f, "invalid UTF-8 at byte {} of chunk", self.offset)
        }
    }
}

impl std::error::Error for DecodeError {}

/// Turns raw reads into sanitized text, carrying fragments that straddle reads.
///
/// A trailing `\r` is emitted as a line break right away; `after_cr` drops the
/// `\n` of a CRLF pair that a read boundary cut in half.
#[derive(Debug, Default)]
pub(crate) struct ChunkDecoder {
    pending_bytes: Vec<u8>,
    pending_text: String,
    after_cr: bool,
}

impl ChunkDecoder {
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<String, DecodeError> {
        self.pending_bytes.extend_from_slice(bytes);
        let complete_len = match std::str::from_utf8(&self.pending_bytes) {
            Ok(_) => self.pending_bytes.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => {
                return Err(DecodeError {
                    offset: err.valid_up_to(),
                    truncated: false,
                })
            }
        };
        let complete = self.pending_bytes.drain(..complete_len).collect::<Vec<u8>>();
        let decoded = String::from_utf8(complete).map_err(|err| DecodeError {
            offset: err.utf8_error().valid_up_to(),
            truncated: false,
        })?;
        self.pending_text.push_str(&decoded);

        let (mut ready, held) = split_incomplete_tail(&self.pending_text);
        if !ready.is_empty() {
            if self.after_cr {
                ready = ready.strip_prefix('\n').unwrap_or(ready);
            }
            self.after_cr = ready.ends_with('\r');
        }
        let clean = sanitize(ready);
        let held = held.to_owned();
        self.pending_text = held;
        Ok(clean)
    }

    pub(crate) fn finish(&mut self) -> Result<String, DecodeError> {
        if !self.pending_bytes.is_empty() {
            return Err(DecodeError {
                offset: 0,
                truncated: true,
            });
        }
        Ok(sanitize(&std::mem::take(&mut self.pending_text)))
    }
}

pub(crate) fn spawn_pump<R>(
    stream: StreamKind,
    pid: u32,
    reader: R,
    events: Sender<ProcessEvent>,
    lifecycle: Arc<Lifecycle>,
) -> JoinHandle<PumpOutcome>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || pump_stream(stream, pid, reader, &events, &lifecycle))
}

/// Drains `reader` until end-of-stream, forwarding sanitized chunks in read order.
///
/// The reader is dropped before the close is recorded, so the stream handle is
/// released by the time the lifecycle can report `Stopped`.
pub fn pump_stream<R: Read>(
    stream: StreamKind,
    pid: u32,
    mut reader: R,
    events: &Sender<ProcessEvent>,
    lifecycle: &Lifecycle,
) -> PumpOutcome {
    let mut decoder = ChunkDecoder::default();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut outcome = loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break PumpOutcome::EndOfStream,
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => break PumpOutcome::Failed(format!("read error: {err}")),
        };
        match decoder.push(&buf[..read]) {
            Ok(text) => deliver(events, stream, text),
            Err(err) => break PumpOutcome::Failed(err.to_string()),
        }
    };
    if outcome == PumpOutcome::EndOfStream {
        match decoder.finish() {
            Ok(text) => deliver(events, stream, text),
            Err(err) => outcome = PumpOutcome::Failed(err.to_string()),
        }
    }
    drop(reader);

    let event = match &outcome {
        PumpOutcome::EndOfStream => {
            debug!(stream = stream.label(), "stream reached end-of-stream");
            ProcessEvent::StreamClosed { stream }
        }
        PumpOutcome::Failed(reason) => {
            warn!(pid, stream = stream.label(), %reason, "stream pump failed");
            ProcessEvent::StreamFailed {
                pid,
                stream,
                reason: reason.clone(),
            }
        }
    };
    let _ = events.send(event);
    let remaining = lifecycle.stream_closed();
    debug!(stream = stream.label(), remaining, "stream released");
    outcome
}

fn deliver(events: &Sender<ProcessEvent>, stream: StreamKind, text: String) {
    if text.is_empty() {
        return;
    }
    // A dropped receiver means the session is gone; keep draining so the
    // runner never blocks on a full pipe.
    let _ = events.send(ProcessEvent::Output { stream, text });
}

#[cfg(test)]
#[path = "tests/pump_tests.rs"]
mod tests;

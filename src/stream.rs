//! Ingestion: byte source → decoder → queue.

use crate::error::SessionError;
use crate::queue::CharQueue;
use crate::shutdown::ShutdownHandle;
use crate::source::ByteSource;
use crate::sse::{ContentFragment, SseDecoder};

/// Text enqueued when the connection fails, so the reader sees why the
/// answer stopped.
pub const CONNECTION_ERROR_TEXT: &str = "Connection error";

/// Why ingestion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The `[DONE]` sentinel arrived.
    Done,
    /// The body ended without a sentinel.
    Eof,
    /// The external stop signal was raised.
    Stopped,
    /// The transport failed.
    NetworkError,
}

/// What one ingestion run produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub ended_by: EndReason,
    pub fragments: u64,
    pub chars_enqueued: u64,
    pub parse_errors: u64,
    pub bytes_read: u64,
}

impl IngestReport {
    /// A report for a run that produced nothing.
    pub fn empty(ended_by: EndReason) -> Self {
        Self {
            ended_by,
            fragments: 0,
            chars_enqueued: 0,
            parse_errors: 0,
            bytes_read: 0,
        }
    }
}

/// Feeds one response body through a fresh decoder into a queue.
pub struct Orchestrator {
    chunk_size: usize,
    decoder: SseDecoder,
    report: IngestReport,
}

impl Orchestrator {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            decoder: SseDecoder::new(),
            report: IngestReport::empty(EndReason::Eof),
        }
    }

    /// Read `source` until EOF, the sentinel, a transport error or `stop`.
    ///
    /// On a transport error [`CONNECTION_ERROR_TEXT`] is enqueued before the
    /// error is returned. Stopping leaves buffered bytes undecoded.
    pub async fn run<B: ByteSource>(
        mut self,
        source: &mut B,
        queue: &CharQueue,
        stop: &ShutdownHandle,
    ) -> Result<IngestReport, SessionError> {
        loop {
            let read = tokio::select! {
                biased;
                _ = stop.wait() => {
                    tracing::info!("ingestion stopped");
                    return Ok(self.finish_with(EndReason::Stopped));
                }
                read = source.read(self.chunk_size) => read,
            };

            match read {
                Ok(Some(chunk)) => {
                    self.report.bytes_read += chunk.len() as u64;
                    let fragments = self.decoder.feed(&chunk);
                    self.enqueue(fragments, queue);
                    if self.decoder.is_done() {
                        return Ok(self.finish_with(EndReason::Done));
                    }
                }
                Ok(None) => {
                    let fragments = self.decoder.finish();
                    self.enqueue(fragments, queue);
                    return Ok(self.finish_with(EndReason::Eof));
                }
                Err(source) => {
                    tracing::error!(error = %source, "response body read failed");
                    report_connection_error(queue);
                    self.finish_with(EndReason::NetworkError);
                    return Err(SessionError::Read { source });
                }
            }
        }
    }

    fn enqueue(&mut self, fragments: Vec<ContentFragment>, queue: &CharQueue) {
        for fragment in fragments {
            self.report.fragments += 1;
            self.report.chars_enqueued += queue.put_str(fragment.as_str()) as u64;
        }
    }

    fn finish_with(&mut self, ended_by: EndReason) -> IngestReport {
        self.report.ended_by = ended_by;
        self.report.parse_errors = self.decoder.parse_errors();
        tracing::info!(
            ?ended_by,
            fragments = self.report.fragments,
            chars = self.report.chars_enqueued,
            parse_errors = self.report.parse_errors,
            bytes = self.report.bytes_read,
            "ingestion finished"
        );
        self.report
    }
}

/// Put the user-visible connection error message on the queue.
pub fn report_connection_error(queue: &CharQueue) {
    queue.put_str(CONNECTION_ERROR_TEXT);
}

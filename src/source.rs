//! Byte sources the orchestrator reads response bodies from.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;

/// A live response body: "read up to N bytes, or EOF".
pub trait ByteSource {
    /// Next chunk of at most `max_bytes` bytes, or `None` at end of body.
    /// A returned chunk is never empty.
    fn read(&mut self, max_bytes: usize) -> impl Future<Output = io::Result<Option<Bytes>>> + Send;
}

/// Adapts a stream of byte chunks (e.g. `reqwest::Response::bytes_stream`).
///
/// Chunks larger than the requested size are split and the remainder is
/// served by the following reads.
pub struct StreamSource<S> {
    inner: S,
    pending: Bytes,
}

impl<S> StreamSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
        }
    }
}

/// Boxed body stream of a reqwest response.
pub type ResponseStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Byte source over a streaming HTTP response.
pub type ResponseSource = StreamSource<ResponseStream>;

impl<S, E> ByteSource for StreamSource<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: std::error::Error + Send + Sync + 'static,
{
    async fn read(&mut self, max_bytes: usize) -> io::Result<Option<Bytes>> {
        let max_bytes = max_bytes.max(1);
        while self.pending.is_empty() {
            let next = std::future::poll_fn(|cx| Pin::new(&mut self.inner).poll_next(cx)).await;
            match next {
                Some(Ok(bytes)) => self.pending = bytes,
                Some(Err(err)) => return Err(io::Error::other(err)),
                None => return Ok(None),
            }
        }
        let take = max_bytes.min(self.pending.len());
        Ok(Some(self.pending.split_to(take)))
    }
}

/// Scripted source: serves queued chunks, then EOF.
///
/// Errors can be queued between chunks to simulate a dropped connection.
#[derive(Default)]
pub struct VecSource {
    chunks: VecDeque<io::Result<Bytes>>,
    pending: Bytes,
}

impl VecSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source serving `bytes` as one body, split only by the read size.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new().chunk(bytes)
    }

    /// A source serving each element as a separate chunk.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        chunks
            .into_iter()
            .fold(Self::new(), |source, bytes| source.chunk(bytes))
    }

    pub fn chunk(mut self, bytes: impl Into<Bytes>) -> Self {
        self.chunks.push_back(Ok(bytes.into()));
        self
    }

    pub fn error(mut self, err: io::Error) -> Self {
        self.chunks.push_back(Err(err));
        self
    }
}

impl ByteSource for VecSource {
    async fn read(&mut self, max_bytes: usize) -> io::Result<Option<Bytes>> {
        let max_bytes = max_bytes.max(1);
        while self.pending.is_empty() {
            match self.chunks.pop_front() {
                Some(Ok(bytes)) => self.pending = bytes,
                Some(Err(err)) => return Err(err),
                None => return Ok(None),
            }
        }
        let take = max_bytes.min(self.pending.len());
        Ok(Some(self.pending.split_to(take)))
    }
}

use crate::error::BoxError;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// How a delivery stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every byte was handed to the connection (not necessarily flushed to the peer).
    Completed { bytes_sent: u64 },
    /// The source failed mid-transfer.
    Failed { bytes_sent: u64, cause: String },
    /// The stream was dropped before completion, normally a client disconnect.
    Abandoned { bytes_sent: u64 },
}

type Reporter = Box<dyn FnOnce(StreamOutcome) + Send>;
type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Byte stream that counts what it yields and reports its outcome once.
///
/// Dropping it drops the underlying file handle or upstream body, which
/// releases the resource immediately.
pub struct Delivery {
    inner: ByteStream,
    expected_len: Option<u64>,
    bytes_sent: u64,
    reporter: Option<Reporter>,
}

impl Delivery {
    pub fn new<S>(stream: S, expected_len: Option<u64>) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            expected_len,
            bytes_sent: 0,
            reporter: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(futures::stream::empty(), Some(0))
    }

    /// Register the callback that receives the outcome.
    pub fn on_finish<F>(mut self, reporter: F) -> Self
    where
        F: FnOnce(StreamOutcome) + Send + 'static,
    {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Drop the reporter without calling it.
    pub fn disarm(&mut self) {
        self.reporter = None;
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    fn finish(&mut self, outcome: StreamOutcome) {
        if let Some(reporter) = self.reporter.take() {
            reporter(outcome);
        }
    }
}

impl Stream for Delivery {
    type Item = Result<Bytes, BoxError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.bytes_sent += chunk.len() as u64;
                // The connection may stop polling once the declared length is
                // yielded. Reported when the last chunk is handed to hyper, not
                // once it reaches the socket: a disconnect during that final
                // write is still recorded as completed.
                if this.expected_len == Some(this.bytes_sent) {
                    let bytes_sent = this.bytes_sent;
                    this.finish(StreamOutcome::Completed { bytes_sent });
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                let bytes_sent = this.bytes_sent;
                this.finish(StreamOutcome::Failed {
                    bytes_sent,
                    cause: e.to_string(),
                });
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                let bytes_sent = this.bytes_sent;
                this.finish(StreamOutcome::Completed { bytes_sent });
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        let bytes_sent = self.bytes_sent;
        if self.expected_len == Some(bytes_sent) {
            self.finish(StreamOutcome::Completed { bytes_sent });
        } else {
            self.finish(StreamOutcome::Abandoned { bytes_sent });
        }
    }
}

// src/exec/drain.rs

//! Pipe draining.
//!
//! A child's stdout and stderr must be read to end-of-stream before its exit
//! status is awaited: a child that fills a pipe buffer nobody reads from
//! blocks forever.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{ExecError, Result, Stream};

/// Copy `reader` into `writer` until end-of-stream, returning everything
/// that was copied.
///
/// Each read is at most `chunk_size` bytes; every chunk goes to the sink as
/// soon as it arrives. End-of-stream is success. A failed write stops the
/// copy.
pub async fn copy_and_capture<R, W>(
    reader: &mut R,
    writer: &mut W,
    stream: Stream,
    chunk_size: usize,
) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| ExecError::read(stream, e))?;
        if n == 0 {
            writer
                .flush()
                .await
                .map_err(|e| ExecError::write(stream, e))?;
            return Ok(out);
        }

        let chunk = &buf[..n];
        out.extend_from_slice(chunk);
        writer
            .write_all(chunk)
            .await
            .map_err(|e| ExecError::write(stream, e))?;
    }
}

/// Drain an optional child pipe; a missing pipe drains as empty.
pub(crate) async fn drain_pipe<R, W>(
    pipe: Option<R>,
    writer: &mut W,
    stream: Stream,
    chunk_size: usize,
) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    match pipe {
        Some(mut pipe) => copy_and_capture(&mut pipe, writer, stream, chunk_size).await,
        None => Ok(Vec::new()),
    }
}

/// In-memory sink that can be written through several handles at once.
///
/// Used to merge a child's stdout and stderr into one buffer in the order
/// the chunks arrive.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    /// Take everything written so far, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        // A panic mid-extend leaves plain bytes behind; still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.lock().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink that accepts `limit` bytes and then fails every write.
    struct FailingSink {
        limit: usize,
        written: Vec<u8>,
    }

    impl AsyncWrite for FailingSink {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let room = self.limit - self.written.len();
            if room == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed")));
            }
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn copies_to_sink_and_captures() {
        let mut input: &[u8] = b"hello from the child";
        let mut sink: Vec<u8> = Vec::new();

        let captured = copy_and_capture(&mut input, &mut sink, Stream::Stdout, 4)
            .await
            .unwrap();

        assert_eq!(captured, b"hello from the child");
        assert_eq!(sink, captured);
    }

    #[tokio::test]
    async fn empty_stream_is_success() {
        let mut input: &[u8] = b"";
        let mut sink: Vec<u8> = Vec::new();

        let captured = copy_and_capture(&mut input, &mut sink, Stream::Stderr, 1024)
            .await
            .unwrap();

        assert!(captured.is_empty());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn write_failure_aborts_and_names_stream() {
        let data = vec![b'x'; 4096];
        let mut input: &[u8] = &data;
        let mut sink = FailingSink {
            limit: 100,
            written: Vec::new(),
        };

        let err = copy_and_capture(&mut input, &mut sink, Stream::Stderr, 1024)
            .await
            .unwrap_err();

        match err {
            ExecError::Write { stream, .. } => assert_eq!(stream, Stream::Stderr),
            other => panic!("expected write error, got {other:?}"),
        }
        assert_eq!(sink.written.len(), 100);
        // The first chunk was read in full before the sink gave up.
        assert_eq!(input.len(), 4096 - 1024);
    }

    #[tokio::test]
    async fn missing_pipe_drains_as_empty() {
        let mut sink: Vec<u8> = Vec::new();
        let captured = drain_pipe(None::<&[u8]>, &mut sink, Stream::Stdout, 16)
            .await
            .unwrap();
        assert!(captured.is_empty());
    }

    #[tokio::test]
    async fn shared_buffer_merges_handles() {
        let shared = SharedBuffer::new();
        let mut a = shared.clone();
        let mut b = shared.clone();

        a.write_all(b"out").await.unwrap();
        b.write_all(b"err").await.unwrap();

        assert_eq!(shared.contents(), b"outerr");
        assert_eq!(shared.take(), b"outerr");
        assert!(shared.contents().is_empty());
    }
}

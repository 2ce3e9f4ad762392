// src/exec/wait.rs

//! Things a task can hand to `utils.wait_for(..)`.
//!
//! - [`Awaitable::Ready`]: an already-settled value.
//! - [`Awaitable::Pending`]: a future that settles into another awaitable
//!   (a value, a stream or an observable), which is then handled the same
//!   way.
//! - [`Awaitable::Stream`]: raw bytes (e.g. a child's stdout), split into
//!   lines by [`lines`].
//! - [`Awaitable::Observable`]: a push-style source of lines.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A source of lines; an `Err` item fails the `wait_for` call.
pub type Observable = BoxStream<'static, anyhow::Result<String>>;

pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

const READ_CHUNK: usize = 4096;

pub enum Awaitable {
    Ready(Value),
    Pending(BoxFuture<'static, anyhow::Result<Awaitable>>),
    Stream(ByteStream),
    Observable(Observable),
}

impl Awaitable {
    /// Wrap a future; whatever it resolves to is awaited in turn.
    pub fn pending<F, T>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<Awaitable>,
    {
        Awaitable::Pending(fut.map(|res| res.map(Into::into)).boxed())
    }

    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Awaitable::Stream(Box::pin(reader))
    }

    pub fn observable<S, T, E>(source: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        T: Into<String>,
        E: Into<anyhow::Error>,
    {
        let lines = source.map(|item| -> anyhow::Result<String> {
            match item {
                Ok(line) => Ok(line.into()),
                Err(err) => Err(err.into()),
            }
        });
        Awaitable::Observable(lines.boxed())
    }
}

impl From<Value> for Awaitable {
    fn from(value: Value) -> Self {
        Awaitable::Ready(value)
    }
}

impl From<()> for Awaitable {
    fn from(_: ()) -> Self {
        Awaitable::Ready(Value::Null)
    }
}

impl fmt::Debug for Awaitable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Awaitable::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Awaitable::Pending(_) => f.write_str("Pending(..)"),
            Awaitable::Stream(_) => f.write_str("Stream(..)"),
            Awaitable::Observable(_) => f.write_str("Observable(..)"),
        }
    }
}

struct LineReader {
    reader: ByteStream,
    buf: Vec<u8>,
    eof: bool,
}

/// Adapt a byte stream into an observable of lines.
///
/// Bytes are buffered and split on `\n`; each line is emitted without its
/// terminator. At end of stream a non-empty trailing partial line is emitted
/// before completing. Invalid UTF-8 is replaced, not rejected.
pub fn lines(reader: ByteStream) -> Observable {
    let state = LineReader {
        reader,
        buf: Vec::new(),
        eof: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(pos) = st.buf.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = st.buf.drain(..=pos).collect();
                let text = String::from_utf8_lossy(&line[..pos]).into_owned();
                return Some((Ok(text), st));
            }

            if st.eof {
                if st.buf.is_empty() {
                    return None;
                }
                let rest = std::mem::take(&mut st.buf);
                return Some((Ok(String::from_utf8_lossy(&rest).into_owned()), st));
            }

            let mut chunk = [0u8; READ_CHUNK];
            match st.reader.read(&mut chunk).await {
                Ok(0) => st.eof = true,
                Ok(n) => st.buf.extend_from_slice(&chunk[..n]),
                Err(err) => {
                    st.eof = true;
                    st.buf.clear();
                    return Some((Err(anyhow::Error::from(err)), st));
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(input: &'static [u8]) -> Vec<String> {
        lines(Box::pin(input))
            .map(|item| item.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn splits_on_line_feed_and_strips_it() {
        assert_eq!(collect(b"one\ntwo\n").await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn flushes_trailing_partial_line() {
        assert_eq!(collect(b"one\ntail").await, vec!["one", "tail"]);
    }

    #[tokio::test]
    async fn keeps_empty_lines_between_terminators() {
        assert_eq!(collect(b"a\n\nb\n").await, vec!["a", "", "b"]);
    }

    #[tokio::test]
    async fn empty_stream_emits_nothing() {
        assert!(collect(b"").await.is_empty());
    }

    #[tokio::test]
    async fn lines_split_across_reads_are_joined() {
        let (mut tx, rx) = tokio::io::duplex(4);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            tx.write_all(b"hello wor").await.unwrap();
            tx.write_all(b"ld\nbye").await.unwrap();
        });

        let got: Vec<String> = lines(Box::pin(rx)).map(|l| l.unwrap()).collect().await;
        writer.await.unwrap();
        assert_eq!(got, vec!["hello world", "bye"]);
    }
}

// src/listeners/redirect_to.rs

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::errors::Result;
use crate::exec::ProcessExecutor;
use crate::listening::BeforeStart;
use crate::types::Stream;

/// Also copies the process's stdout (or stderr) into a caller-supplied sink.
///
/// The sink is shared by every execution the listener takes part in; it is
/// flushed when the stream ends. Other destinations of the stream, including
/// in-memory capture, are left as they are.
#[derive(Clone)]
pub struct RedirectTo {
    sink: SharedSink,
    stream: Stream,
}

impl RedirectTo {
    /// Redirect stdout into `sink`.
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self::with_stream(sink, Stream::Output)
    }

    /// Redirect stderr into `sink`.
    pub fn from_error_stream(sink: impl Write + Send + 'static) -> Self {
        Self::with_stream(sink, Stream::Error)
    }

    pub fn with_stream(sink: impl Write + Send + 'static, stream: Stream) -> Self {
        Self {
            sink: SharedSink(Arc::new(Mutex::new(Box::new(sink)))),
            stream,
        }
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }
}

impl BeforeStart for RedirectTo {
    fn before_start(&self, executor: &mut ProcessExecutor) -> Result<()> {
        executor.redirect_also_to(self.stream, self.sink.clone());
        Ok(())
    }
}

impl fmt::Debug for RedirectTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectTo")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct SharedSink(Arc<Mutex<Box<dyn Write + Send>>>);

impl SharedSink {
    fn with<T>(&self, op: impl FnOnce(&mut dyn Write) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::other("redirect sink lock poisoned"))?;
        op(&mut **guard)
    }
}

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with(|sink| sink.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with(|sink| sink.flush())
    }
}

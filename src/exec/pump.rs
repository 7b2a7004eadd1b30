// src/exec/pump.rs

//! Background copying of child output streams.

use std::io::{self, Write};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

pub(crate) type Sink = Box<dyn Write + Send>;

type PumpHandle = JoinHandle<io::Result<Drained>>;

/// What one pump produced once its pipe reached end of stream.
#[derive(Debug, Default)]
pub(crate) struct Drained {
    /// Captured bytes, `None` when capture was off.
    pub(crate) captured: Option<Vec<u8>>,
    /// First error raised by a redirect sink; that sink was detached.
    pub(crate) sink_error: Option<io::Error>,
}

/// Pumps draining the stdout/stderr pipes of one child.
///
/// Dropping the value aborts any pump still running, including while
/// [`collect`](Self::collect) is being awaited.
pub(crate) struct OutputPumps {
    stdout: Option<PumpHandle>,
    stderr: Option<PumpHandle>,
}

impl OutputPumps {
    pub(crate) fn start(
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
        capture: bool,
        output_sinks: Vec<Sink>,
        error_sinks: Vec<Sink>,
    ) -> Self {
        Self {
            stdout: stdout.map(|r| spawn_pump(r, capture, output_sinks, "stdout")),
            stderr: stderr.map(|r| spawn_pump(r, capture, error_sinks, "stderr")),
        }
    }

    /// Wait for both pipes to reach end of stream.
    ///
    /// Fails only if reading a pipe failed; sink failures are reported in
    /// the returned [`Drained`] values.
    pub(crate) async fn collect(&mut self) -> io::Result<(Drained, Drained)> {
        let stdout = join_pump(self.stdout.as_mut()).await?;
        let stderr = join_pump(self.stderr.as_mut()).await?;
        self.stdout = None;
        self.stderr = None;
        Ok((stdout, stderr))
    }
}

impl Drop for OutputPumps {
    fn drop(&mut self) {
        for handle in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            handle.abort();
        }
    }
}

async fn join_pump(handle: Option<&mut PumpHandle>) -> io::Result<Drained> {
    match handle {
        Some(handle) => handle.await.map_err(io::Error::other)?,
        None => Ok(Drained::default()),
    }
}

fn spawn_pump<R>(reader: R, capture: bool, sinks: Vec<Sink>, stream: &'static str) -> PumpHandle
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = reader;
        let mut sinks: Vec<Option<Sink>> = sinks.into_iter().map(Some).collect();
        let mut captured = capture.then(Vec::new);
        let mut sink_error: Option<io::Error> = None;
        let mut buf = vec![0u8; 8 * 1024];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            let chunk = &buf[..n];

            if let Some(captured) = captured.as_mut() {
                captured.extend_from_slice(chunk);
            }

            // A failing sink is dropped; the pipe keeps draining so the
            // child never blocks on a full buffer.
            for slot in sinks.iter_mut() {
                if let Some(sink) = slot {
                    if let Err(e) = sink.write_all(chunk) {
                        warn!(stream, error = %e, "output sink failed; detaching it");
                        if sink_error.is_none() {
                            sink_error = Some(e);
                        }
                        *slot = None;
                    }
                }
            }
        }

        for sink in sinks.iter_mut().flatten() {
            if let Err(e) = sink.flush() {
                warn!(stream, error = %e, "flushing output sink failed");
                if sink_error.is_none() {
                    sink_error = Some(e);
                }
            }
        }

        trace!(stream, "output pump reached end of stream");

        Ok(Drained {
            captured,
            sink_error,
        })
    })
}

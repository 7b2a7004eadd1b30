// src/listeners/line_sink.rs

use std::fmt;
use std::io::{self, Write};

/// An output sink that hands every complete line to a callback.
///
/// Lines are passed without their terminator (`\n` or `\r\n`) and decoded
/// lossily as UTF-8. A trailing line without terminator is emitted on
/// [`flush`](Write::flush), which the output pumps call at end of stream.
///
/// ```
/// use std::io::Write;
/// use hookcmd::listeners::LineSink;
///
/// let mut lines = Vec::new();
/// let mut sink = LineSink::new(|line: &str| lines.push(line.to_string()));
/// sink.write_all(b"line1\nli").unwrap();
/// sink.write_all(b"ne2").unwrap();
/// sink.flush().unwrap();
/// drop(sink);
/// assert_eq!(lines, ["line1", "line2"]);
/// ```
pub struct LineSink<F>
where
    F: FnMut(&str),
{
    pending: Vec<u8>,
    on_line: F,
}

impl<F> LineSink<F>
where
    F: FnMut(&str),
{
    pub fn new(on_line: F) -> Self {
        Self {
            pending: Vec::new(),
            on_line,
        }
    }

    fn emit(&mut self, mut line: &[u8]) {
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        (self.on_line)(&String::from_utf8_lossy(line));
    }
}

impl<F> Write for LineSink<F>
where
    F: FnMut(&str),
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line[..pos]);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.emit(&line);
        }
        Ok(())
    }
}

impl<F> fmt::Debug for LineSink<F>
where
    F: FnMut(&str),
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSink")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

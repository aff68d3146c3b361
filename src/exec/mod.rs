//! Subprocess execution
//!
//! Every external command the build step runs (`yarn`, `cp`) is described by
//! a `CommandSpec` and executed through a `CommandRunner`.

pub mod command;
mod runner;
#[cfg(test)]
pub(crate) mod testing;

pub use command::{CommandOutput, CommandSpec, ExecEnv};
pub use runner::{CommandRunner, SystemRunner};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

/// Max number of output lines to include in command error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of command output for error diagnostics.
pub(crate) fn build_error_output(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Newline-delimited reader over a child pipe.
///
/// Lines are split on raw bytes and decoded lossily, so output that is not
/// valid UTF-8 never stops the stream. The buffer outlives each call, which
/// keeps `next_line` cancel safe inside `select!`.
struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    /// Next line without its terminator, `None` at end of stream
    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}

async fn read_next<R: AsyncRead + Unpin>(
    reader: &mut Option<LineReader<R>>,
) -> std::io::Result<Option<String>> {
    match reader.as_mut() {
        Some(reader) => reader.next_line().await,
        None => Ok(None),
    }
}

/// Record one read result; returns `true` once the stream is finished
fn collect_line(
    line: std::io::Result<Option<String>>,
    stream: &str,
    all_output: &mut Vec<String>,
    on_output: &(dyn Fn(&str) + Send + Sync),
) -> bool {
    match line {
        Ok(Some(line)) => {
            on_output(&line);
            all_output.push(line);
            false
        }
        Ok(None) => true,
        Err(e) => {
            warn!("Failed to read command {}: {}", stream, e);
            true
        }
    }
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting. Streams that were
/// not piped are treated as already closed. Each stream is read until end of
/// file or a read error; the other stream keeps draining either way.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(&str) + Send + Sync),
) -> Vec<String> {
    let mut stderr_reader = child.stderr.take().map(LineReader::new);
    let mut stdout_reader = child.stdout.take().map(LineReader::new);

    let mut all_output = Vec::new();
    let mut stderr_done = stderr_reader.is_none();
    let mut stdout_done = stdout_reader.is_none();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = read_next(&mut stderr_reader), if !stderr_done => {
                stderr_done = collect_line(line, "stderr", &mut all_output, on_output);
            }
            line = read_next(&mut stdout_reader), if !stdout_done => {
                stdout_done = collect_line(line, "stdout", &mut all_output, on_output);
            }
        }
    }

    all_output
}

//! Child process spawning and live output streaming.
//!
//! # Lifecycle
//! ```text
//! Resolved → Spawning ─┬→ StartFailed (405, error text)
//!                      └→ Streaming → Draining(stdout) → [Draining(stderr)] → Closed
//! ```
//!
//! Every read from the child's stdout becomes one body frame, handed to the
//! connection as soon as it is read. When stderr is included it is collected
//! concurrently (so a chatty stderr cannot block the child) and forwarded line
//! by line after stdout is exhausted. At most `STDERR_LIMIT_BYTES` of stderr
//! is held; past that the pipe is still drained so the child keeps running,
//! but the rest is discarded and the dropped byte count is logged.
//!
//! The pump ends when the child's pipes close. It also ends, killing the
//! child, when the client goes away or the optional deadline passes. Without a
//! deadline, a child that never closes its stdout keeps its request open
//! indefinitely. The exit status is never reported to the caller; it is
//! reaped in the background and logged.

use std::convert::Infallible;
use std::process::Stdio;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::response::Response;
use futures_util::stream;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::http::response;
use crate::observability::metrics;
use crate::process::command::CommandLine;

/// Upper bound on a single stdout read, and so on a single body frame.
const READ_CHUNK_BYTES: usize = 4096;

/// Stderr retained for forwarding after stdout closes.
const STDERR_LIMIT_BYTES: usize = 1024 * 1024;

/// Frames buffered between the pump and the connection.
const CHANNEL_CAPACITY: usize = 32;

/// Errors starting a command.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The command line has no executable token.
    #[error("empty command")]
    EmptyCommand,

    /// The operating system refused to start the executable.
    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Per-dispatch streaming options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOptions {
    /// Forward stderr lines after stdout.
    pub include_stderr: bool,
    /// Kill the child once this much time has passed.
    pub deadline: Option<Duration>,
}

/// How a pump ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Exhausted,
    Disconnected,
    TimedOut,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Exhausted => "exhausted",
            Outcome::Disconnected => "disconnected",
            Outcome::TimedOut => "timed_out",
        }
    }
}

/// Output of a running child, consumed frame by frame.
#[derive(Debug)]
pub struct ChildOutput {
    pid: Option<u32>,
    rx: mpsc::Receiver<Bytes>,
}

impl ChildOutput {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next frame, or `None` once the pump has finished.
    pub async fn next_frame(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Turn the output into a streaming response body.
    ///
    /// Dropping the body (client disconnect) stops the pump and kills the child.
    pub fn into_body(self) -> Body {
        let frames = stream::unfold(self.rx, |mut rx| async move {
            rx.recv().await.map(|frame| (Ok::<_, Infallible>(frame), rx))
        });
        Body::from_stream(frames)
    }
}

/// Spawn a command line and start pumping its output.
///
/// Must be called within a Tokio runtime.
pub fn spawn(line: &str, options: StreamOptions) -> Result<ChildOutput, StreamError> {
    let command = CommandLine::parse(line).ok_or(StreamError::EmptyCommand)?;

    let stderr = if options.include_stderr {
        Stdio::piped()
    } else {
        Stdio::null()
    };

    let child = Command::new(command.program())
        .args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(stderr)
        .spawn()
        .map_err(|source| StreamError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

    let pid = child.id();
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::spawn(supervise(child, tx, options.deadline, Instant::now()));

    Ok(ChildOutput { pid, rx })
}

/// Run a command line and answer with its live output.
///
/// A command that cannot be started yields a 405 carrying the error text.
pub fn stream(line: &str, options: StreamOptions) -> Response {
    match spawn(line, options) {
        Ok(output) => {
            tracing::debug!(pid = ?output.pid(), command = %line, "Child started");
            response::event_stream(output.into_body())
        }
        Err(e) => {
            tracing::warn!(command = %line, error = %e, "Failed to start command");
            metrics::record_spawn_failure();
            response::start_failed(&e)
        }
    }
}

async fn supervise(mut child: Child, tx: mpsc::Sender<Bytes>, deadline: Option<Duration>, started: Instant) {
    let pid = child.id();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let pump = async {
        tokio::select! {
            outcome = forward_output(stdout, stderr, &tx) => outcome,
            _ = tx.closed() => Outcome::Disconnected,
        }
    };

    let outcome = match deadline {
        Some(limit) => tokio::time::timeout(limit, pump)
            .await
            .unwrap_or(Outcome::TimedOut),
        None => pump.await,
    };
    drop(tx);

    match outcome {
        Outcome::Exhausted => {
            tracing::debug!(pid = ?pid, "Child output exhausted");
        }
        Outcome::Disconnected => {
            tracing::info!(pid = ?pid, "Client disconnected, killing child");
            kill(&mut child);
        }
        Outcome::TimedOut => {
            tracing::warn!(pid = ?pid, deadline = ?deadline, "Dispatch deadline reached, killing child");
            kill(&mut child);
        }
    }
    metrics::record_dispatch(outcome.as_str(), started);

    match child.wait().await {
        Ok(status) => tracing::debug!(pid = ?pid, status = %status, "Child exited"),
        Err(e) => tracing::debug!(pid = ?pid, error = %e, "Failed to reap child"),
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "Failed to kill child");
    }
}

async fn forward_output<O, E>(stdout: Option<O>, stderr: Option<E>, tx: &mpsc::Sender<Bytes>) -> Outcome
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let collect_stderr = async move {
        match stderr {
            Some(stderr) => read_lines(stderr, STDERR_LIMIT_BYTES).await,
            None => Vec::new(),
        }
    };

    let (delivered, stderr_lines) = tokio::join!(forward_chunks(stdout, tx), collect_stderr);
    if !delivered {
        return Outcome::Disconnected;
    }

    for line in stderr_lines {
        if tx.send(line).await.is_err() {
            return Outcome::Disconnected;
        }
    }
    Outcome::Exhausted
}

/// Forward each read as its own frame. Returns `false` if the receiver is gone.
async fn forward_chunks<R>(reader: Option<R>, tx: &mpsc::Sender<Bytes>) -> bool
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return true;
    };

    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => return true,
            Ok(n) => {
                if tx.send(Bytes::copy_from_slice(&buf[..n])).await.is_err() {
                    return false;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Reading child stdout failed");
                return true;
            }
        }
    }
}

/// Read lines, each normalized to end with a single `\n`, keeping at most
/// `limit` bytes of input. Input past the limit is drained and discarded.
async fn read_lines<R>(reader: R, limit: usize) -> Vec<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut kept = 0;
    loop {
        let remaining = limit - kept;
        let mut line = Vec::new();
        let read = (&mut reader)
            .take(remaining as u64 + 1)
            .read_until(b'\n', &mut line)
            .await;
        match read {
            Ok(0) => break,
            Ok(n) if n <= remaining => {
                kept += n;
                lines.push(terminate_line(line));
            }
            Ok(n) => {
                let drained = tokio::io::copy(&mut reader, &mut tokio::io::sink())
                    .await
                    .unwrap_or(0);
                tracing::warn!(
                    limit,
                    dropped_bytes = n as u64 + drained,
                    "Child stderr over limit, discarding the rest"
                );
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Reading child stderr failed");
                break;
            }
        }
    }
    lines
}

fn terminate_line(mut line: Vec<u8>) -> Bytes {
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    line.push(b'\n');
    Bytes::from(line)
}

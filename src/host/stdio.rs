//! Stdin/stdout JSON bridge.
//!
//! Reads one request per line, dispatches it through [`HostHandler`] and
//! writes one response line. Firings are written as `alarm.fired` event lines
//! on the same stream as they happen.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.

use crate::config::ChimeConfig;
use crate::host::contract::{Command, FiredEvent, Request, Response};
use crate::host::handler::HostHandler;
use crate::notify::{ChannelNotifier, FanoutNotifier, LogNotifier};
use crate::scheduler::Scheduler;
use chime_grammar::Interpreter;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Run the bridge on the process's stdin and stdout until stdin closes or a
/// `host.stop` command is received.
///
/// # Errors
///
/// Returns an error if the scheduler cannot start or stdio fails.
pub async fn run_stdio_bridge(config: &ChimeConfig) -> crate::Result<()> {
    run_bridge(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        config,
    )
    .await
}

/// Run the bridge over arbitrary streams.
///
/// Two tasks operate in parallel:
///
/// 1. **Reader** -- reads requests from `reader`, dispatches them and writes
///    the responses.
/// 2. **Event forwarder** -- receives firings from the scheduler and writes
///    them as event lines.
///
/// On exit the scheduler is stopped and the forwarder aborted.
///
/// # Errors
///
/// Returns an error if the scheduler cannot start, or [`crate::ChimeError::Io`]
/// if a read or write fails.
pub async fn run_bridge<R, W>(reader: R, writer: W, config: &ChimeConfig) -> crate::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (sink, mut firings) = ChannelNotifier::channel();
    let notifier = FanoutNotifier::new().with(LogNotifier).with(sink);
    let scheduler = Arc::new(Scheduler::from_config(&config.scheduler, notifier));
    scheduler.start()?;

    let handler = HostHandler::new(
        Interpreter::new(config.interpreter.matching),
        Arc::clone(&scheduler),
    );
    let writer = Arc::new(Mutex::new(writer));

    let event_writer = Arc::clone(&writer);
    let event_handle = tokio::spawn(async move {
        while let Some(firing) = firings.recv().await {
            let mut w = event_writer.lock().await;
            if let Err(e) = write_json(&mut *w, &FiredEvent::from(firing)).await {
                tracing::warn!(
                    error = %e,
                    "failed to write event line; stopping event forwarder"
                );
                break;
            }
        }
    });

    let reader_result = run_reader(reader, &handler, &*writer).await;

    scheduler.stop().await;
    event_handle.abort();
    let _ = event_handle.await;

    reader_result
}

async fn run_reader<R, W>(
    mut reader: R,
    handler: &HostHandler,
    writer: &Mutex<W>,
) -> crate::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;

        // EOF
        if bytes_read == 0 {
            tracing::info!("input closed (EOF); shutting down bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (response, is_stop) = match Request::parse_line(trimmed) {
            Ok(request) => {
                let is_stop = request.command == Command::HostStop;
                (handler.handle(request), is_stop)
            }
            Err(message) => {
                tracing::warn!(error = %message, "rejected request line");
                (Response::error(message), false)
            }
        };

        {
            let mut w = writer.lock().await;
            write_json(&mut *w, &response).await?;
        }

        if is_stop {
            tracing::info!("host.stop received; shutting down bridge");
            break;
        }
    }

    Ok(())
}

/// Write one JSON line and flush.
async fn write_json<W, T>(writer: &mut W, value: &T) -> crate::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut json = serde_json::to_string(value)
        .map_err(|e| crate::ChimeError::Channel(format!("failed to serialize line: {e}")))?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

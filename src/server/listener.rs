//! The read loop over the server's output.
//!
//! Each line is parsed, published on the event feed and dispatched before
//! the next line is read. Handlers that need to wait must go through the
//! scheduler.

use std::process::ExitStatus;
use std::time::Duration;

use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::display;
use crate::event::{read_lines, Event, EventParser, StreamError};
use crate::observer::Dispatcher;

use super::ServerProcess;

/// Capacity of the event feed. Receivers lagging further behind lose events.
pub const EVENT_FEED_CAPACITY: usize = 256;

/// Grace period between SIGTERM and kill once the stop timeout has passed.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// `now + timeout`, saturating at a far-future instant.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or(now + Duration::from_secs(86_400 * 365 * 30))
}

/// Error type for the read loop.
#[derive(thiserror::Error, Debug)]
pub enum ListenerError {
    #[error("Server stdout is not available")]
    NoStdout,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How the server is asked to stop.
#[derive(Debug, Clone)]
pub struct StopPolicy {
    /// Console command written on shutdown.
    pub command: String,
    /// How long to wait for the server after writing `command`.
    pub timeout: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            command: "stop".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Reads server output, turning each line into an [`Event`].
#[derive(Debug)]
pub struct Listener {
    dispatcher: Dispatcher,
    parser: EventParser,
    feed: broadcast::Sender<Event>,
    echo: bool,
}

impl Listener {
    /// Create a listener dispatching into `ctx`, parsing commands that start
    /// with `command_prefix`.
    #[must_use]
    pub fn new(ctx: Context, command_prefix: char) -> Self {
        let parser =
            EventParser::new(ctx.players.clone()).with_command_prefix(command_prefix);
        let (feed, _) = broadcast::channel(EVENT_FEED_CAPACITY);
        Self {
            dispatcher: Dispatcher::new(ctx),
            parser,
            feed,
            echo: false,
        }
    }

    /// Echo every server line to the terminal.
    #[must_use]
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        self.dispatcher.context()
    }

    /// Subscribe to the event feed. Every consumed line produces one event.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.feed.subscribe()
    }

    /// Parse, publish and dispatch one line.
    pub fn handle_line(&self, line: &str) -> Event {
        if self.echo {
            display::print_server_line(line);
        }

        let event = self.parser.parse(line);
        if !event.is_general() {
            tracing::debug!(
                kind = event.kind_name(),
                player = ?event.player().map(|p| p.name()),
                line = %event.raw_line,
                "Event parsed"
            );
        }

        // No subscribers is fine.
        let _ = self.feed.send(event.clone());

        let report = self.dispatcher.dispatch(&event);
        if report.failed > 0 {
            tracing::debug!(
                kind = event.kind_name(),
                invoked = report.invoked,
                failed = report.failed,
                "Handlers failed"
            );
        }
        event
    }

    /// Consume `reader` until EOF. Returns the number of lines handled.
    pub async fn run_reader<R>(&self, reader: R) -> usize
    where
        R: AsyncRead + Unpin,
    {
        let lines = read_lines(reader);
        futures_util::pin_mut!(lines);

        let mut count = 0;
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    self.handle_line(&line);
                    count += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Server output unreadable, stopping reader");
                    break;
                }
            }
        }
        count
    }

    /// Drive a running server until it exits.
    ///
    /// When `shutdown` fires, the stop command is written to the console. If
    /// the server is still running after the stop timeout, it is terminated.
    ///
    /// # Errors
    ///
    /// Returns `ListenerError::NoStdout` if the process's stdout was already
    /// taken, or `ListenerError::Io` if waiting on the process fails.
    pub async fn run(
        &self,
        process: &mut ServerProcess,
        shutdown: CancellationToken,
        stop: &StopPolicy,
    ) -> Result<ExitStatus, ListenerError> {
        let stdout = process.take_stdout().ok_or(ListenerError::NoStdout)?;
        self.drive(read_lines(stdout), process, shutdown, stop).await
    }

    /// Write the stop command and start the stop timeout.
    fn request_stop(&self, stop: &StopPolicy) -> Instant {
        display::print_stopping(&stop.command);
        tracing::info!(command = %stop.command, "Stopping server");
        self.context().console.send(stop.command.clone());
        deadline_after(stop.timeout)
    }

    async fn drive<S>(
        &self,
        lines: S,
        process: &mut ServerProcess,
        shutdown: CancellationToken,
        stop: &StopPolicy,
    ) -> Result<ExitStatus, ListenerError>
    where
        S: Stream<Item = Result<String, StreamError>>,
    {
        futures_util::pin_mut!(lines);

        let mut stop_requested = false;
        let mut kill_deadline: Option<Instant> = None;
        let mut read_failed = false;

        loop {
            tokio::select! {
                () = shutdown.cancelled(), if !stop_requested => {
                    stop_requested = true;
                    kill_deadline = Some(self.request_stop(stop));
                }

                () = tokio::time::sleep_until(kill_deadline.unwrap_or_else(Instant::now)),
                    if kill_deadline.is_some() =>
                {
                    kill_deadline = None;
                    tracing::warn!(
                        timeout_secs = stop.timeout.as_secs(),
                        "Server did not stop in time, terminating"
                    );
                    process.graceful_terminate(TERMINATE_GRACE).await?;
                }

                line = lines.next() => match line {
                    Some(Ok(line)) => {
                        self.handle_line(&line);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Server output unreadable, stopping reader");
                        read_failed = true;
                        break;
                    }
                    None => break,
                },
            }
        }

        // Nobody drains stdout any more, so a live server is stopped.
        if read_failed && process.try_wait()?.is_none() {
            let deadline = match kill_deadline {
                Some(deadline) => deadline,
                None if stop_requested => Instant::now(),
                None => self.request_stop(stop),
            };
            if tokio::time::timeout_at(deadline, process.wait()).await.is_err() {
                tracing::warn!(
                    timeout_secs = stop.timeout.as_secs(),
                    "Server did not stop in time, terminating"
                );
                process.graceful_terminate(TERMINATE_GRACE).await?;
            }
        }

        tracing::debug!("Server output closed, waiting for exit");
        let status = process.wait().await?;
        tracing::info!(code = ?status.code(), "Server exited");
        Ok(status)
    }
}

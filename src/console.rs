//! Outbound commands to the server console.
//!
//! Handlers never touch the child's stdin directly. They push command strings
//! into an unbounded channel through a [`Console`]; a writer task drains the
//! channel into the process. Delivery is best effort.

use rand::Rng;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::player::Player;

/// Receiving side of the console channel.
pub type ConsoleReceiver = mpsc::UnboundedReceiver<String>;

/// Text colours understood by `tellraw` and `title`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    White,
    Yellow,
    Red,
    /// A random `#rrggbb` colour.
    Random,
}

impl Color {
    /// The colour as a JSON text component value.
    #[must_use]
    pub fn to_component(self) -> String {
        match self {
            Self::White => "white".to_string(),
            Self::Yellow => "yellow".to_string(),
            Self::Red => "red".to_string(),
            Self::Random => {
                let rgb: u32 = rand::thread_rng().gen_range(0..=0x00FF_FFFF);
                format!("#{rgb:06x}")
            }
        }
    }
}

/// Which title slot to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSlot {
    Title,
    Subtitle,
    Actionbar,
}

impl TitleSlot {
    fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Actionbar => "actionbar",
        }
    }
}

/// Cloneable sender of console commands.
#[derive(Debug, Clone)]
pub struct Console {
    tx: mpsc::UnboundedSender<String>,
}

impl Console {
    /// Create a console and the receiver a writer task should drain.
    #[must_use]
    pub fn channel() -> (Self, ConsoleReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue a raw command line.
    ///
    /// Returns `false` if the writer is gone.
    pub fn send(&self, command: impl Into<String>) -> bool {
        let command = command.into();
        tracing::trace!(command = %command, "Queueing console command");
        if self.tx.send(command).is_err() {
            tracing::warn!("Console writer closed, dropping command");
            return false;
        }
        true
    }

    /// Broadcast a chat message.
    pub fn say(&self, text: &str) -> bool {
        self.send(format!("/say {text}"))
    }

    /// Send a private coloured message to one player.
    pub fn tellraw(&self, target: &Player, text: &str, color: Color) -> bool {
        let component = json!({ "text": text, "color": color.to_component() });
        self.send(format!("/tellraw {} {component}", target.name()))
    }

    /// Show a title, subtitle or action bar text to one player.
    pub fn title(&self, target: &Player, slot: TitleSlot, text: &str, color: Color) -> bool {
        let component = json!({ "text": text, "color": color.to_component() });
        self.send(format!(
            "/title {} {} {component}",
            target.name(),
            slot.as_str()
        ))
    }

    /// Set title fade-in, stay and fade-out times, in ticks.
    pub fn title_times(&self, target: &Player, fade_in: u32, stay: u32, fade_out: u32) -> bool {
        self.send(format!(
            "/title {} times {fade_in} {stay} {fade_out}",
            target.name()
        ))
    }
}

/// Spawn the task that writes queued commands to the server's stdin.
///
/// Each command is newline-terminated and flushed. The task ends when every
/// [`Console`] is dropped, the write fails, or `cancel` fires.
pub fn spawn_writer<W>(
    mut stdin: W,
    mut rx: ConsoleReceiver,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                command = rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            let mut line = command.into_bytes();
            if line.last() != Some(&b'\n') {
                line.push(b'\n');
            }
            let result = async {
                stdin.write_all(&line).await?;
                stdin.flush().await
            }
            .await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to write to server stdin");
                break;
            }
        }
        tracing::debug!("Console writer stopped");
    })
}

/// Spawn the task relaying interactive terminal input to the server.
pub fn spawn_input_relay(console: Console, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !console.send(line) {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read terminal input");
                        break;
                    }
                },
            }
        }
        tracing::debug!("Input relay stopped");
    })
}

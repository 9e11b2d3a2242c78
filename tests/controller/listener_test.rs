//! The read loop against mocked and real server output.

use std::time::Duration;

use mcserver_control::event::EventKind;
use mcserver_control::server::Listener;

use super::{drain, harness};

#[tokio::test]
async fn reader_publishes_and_dispatches_each_line() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, mut rx) = harness(dir.path());
    let listener = Listener::new(ctx, '!');
    let mut feed = listener.subscribe();

    let output = tokio_test::io::Builder::new()
        .read(b"[12:00:00] [Server thread/INFO]: Steve joined the game\n")
        .read(b"[12:00:01] [Server thread/INFO]: <Steve> !nope\n")
        .read(b"[12:00:02] [Server thread/INFO]: Steve left the game\n")
        .build();
    assert_eq!(listener.run_reader(output).await, 3);

    let kinds: Vec<&str> = [
        feed.recv().await.unwrap(),
        feed.recv().await.unwrap(),
        feed.recv().await.unwrap(),
    ]
    .iter()
    .map(|e| e.kind_name())
    .collect();
    assert_eq!(kinds, vec!["login", "cmd", "logout"]);

    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("Invalid command - nope"));

    let steve = listener.context().players.get("Steve").unwrap();
    assert!(!steve.status().is_online());
    assert!(listener.context().store.path_for("Steve").exists());
}

#[tokio::test]
async fn partial_lines_are_joined() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _rx) = harness(dir.path());
    let listener = Listener::new(ctx, '\\');
    let mut feed = listener.subscribe();

    let output = tokio_test::io::Builder::new()
        .read(b"[12:00:00] [Server thread/INFO]: Alex jo")
        .read(b"ined the game\r\n")
        .build();
    assert_eq!(listener.run_reader(output).await, 1);

    let event = feed.recv().await.unwrap();
    assert!(matches!(event.kind, EventKind::Login { .. }));
    assert!(!event.raw_line.ends_with('\r'));
}

#[cfg(unix)]
mod process {
    use super::*;
    use mcserver_control::console::spawn_writer;
    use mcserver_control::server::{ServerProcess, ServerProcessBuilder, StopPolicy};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn exit_status_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _rx) = harness(dir.path());
        let listener = Listener::new(ctx, '\\');
        let mut feed = listener.subscribe();

        let builder = ServerProcessBuilder::new("sh").args([
            "-c",
            "echo '[12:00:00] [Server thread/INFO]: Steve joined the game'; exit 3",
        ]);
        let mut process = ServerProcess::spawn(&builder).unwrap();

        let status = listener
            .run(&mut process, CancellationToken::new(), &StopPolicy::default())
            .await
            .unwrap();
        assert_eq!(status.code(), Some(3));
        assert_eq!(feed.recv().await.unwrap().kind_name(), "login");
    }

    #[tokio::test]
    async fn shutdown_sends_stop_command() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, console_rx) = harness(dir.path());
        let listener = Listener::new(ctx, '\\');
        let mut feed = listener.subscribe();

        let builder =
            ServerProcessBuilder::new("sh").args(["-c", "read cmd; echo \"got $cmd\"; exit 0"]);
        let mut process = ServerProcess::spawn(&builder).unwrap();
        let cancel = CancellationToken::new();
        let stdin = process.take_stdin().unwrap();
        let writer = spawn_writer(stdin, console_rx, cancel.clone());

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let stop = StopPolicy {
            command: "stop".to_string(),
            timeout: Duration::from_secs(10),
        };
        let status = listener.run(&mut process, shutdown, &stop).await.unwrap();
        cancel.cancel();
        writer.await.unwrap();

        assert!(status.success());
        assert_eq!(feed.recv().await.unwrap().raw_line, "got stop");
    }

    #[tokio::test]
    async fn missing_stdout_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (ctx, _rx) = harness(dir.path());
        let listener = Listener::new(ctx, '\\');

        let builder = ServerProcessBuilder::new("sh").args(["-c", "exit 0"]);
        let mut process = ServerProcess::spawn(&builder).unwrap();
        drop(process.take_stdout());

        let err = listener
            .run(&mut process, CancellationToken::new(), &StopPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            mcserver_control::server::ListenerError::NoStdout
        ));
    }
}

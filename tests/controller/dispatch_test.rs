//! Dispatch scenarios: commands, lifecycle isolation, session accounting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone};
use mcserver_control::addons::{Goodbye, OnlineTimeCommand};
use mcserver_control::context::Context;
use mcserver_control::event::EventParser;
use mcserver_control::handler::{HandlerError, HandlerResult};
use mcserver_control::observer::{default_observers, Dispatcher, LifecycleObserver, Observer};
use mcserver_control::player::{Player, PlayerTable, StatusStore};

use super::{drain, harness};

fn at(hour: u32, min: u32, sec: u32) -> DateTime<Local> {
    on_day(1, hour, min, sec)
}

fn on_day(day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2024, 5, day, hour, min, sec)
        .single()
        .unwrap()
}

fn line(message: &str) -> String {
    format!("[12:00:00] [Server thread/INFO]: {message}")
}

struct Failing;

impl Observer for Failing {
    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        Some(self)
    }
}

impl LifecycleObserver for Failing {
    fn on_login(&self, _: &Context, _: &Arc<Player>) -> HandlerResult {
        Err(HandlerError::failed("boom"))
    }

    fn on_logout(&self, _: &Context, _: &Arc<Player>) -> HandlerResult {
        panic!("logout hook exploded");
    }
}

#[derive(Default)]
struct Counting {
    logins: AtomicUsize,
    logouts: AtomicUsize,
}

impl Observer for Counting {
    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        Some(self)
    }
}

impl LifecycleObserver for Counting {
    fn on_login(&self, _: &Context, _: &Arc<Player>) -> HandlerResult {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_logout(&self, _: &Context, _: &Arc<Player>) -> HandlerResult {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records the online counters each login hook sees.
#[derive(Default)]
struct SeenAtLogin {
    seen: Mutex<Vec<(f64, f64)>>,
}

impl Observer for SeenAtLogin {
    fn as_lifecycle(&self) -> Option<&dyn LifecycleObserver> {
        Some(self)
    }
}

impl LifecycleObserver for SeenAtLogin {
    fn on_login(&self, _: &Context, player: &Arc<Player>) -> HandlerResult {
        let status = player.status();
        self.seen
            .lock()
            .unwrap()
            .push((status.time_online_today(), status.time_online()));
        Ok(())
    }
}

#[tokio::test]
async fn unknown_command_yields_single_feedback() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, mut rx) = harness(dir.path());
    ctx.observers.register_all(default_observers('\\'));
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx);

    dispatcher.dispatch(&parser.parse(&line("Steve joined the game")));
    let report = dispatcher.dispatch(&parser.parse(&line("<Steve> \\foobar")));

    assert_eq!(report.failed, 0);
    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("/tellraw Steve "));
    assert!(sent[0].contains("Invalid command - foobar"));
}

#[tokio::test]
async fn help_lists_registered_commands() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, mut rx) = harness(dir.path());
    ctx.observers.register_all(default_observers('\\'));
    ctx.observers.register(Arc::new(OnlineTimeCommand::new()));
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx);

    dispatcher.dispatch(&parser.parse(&line("Steve joined the game")));
    dispatcher.dispatch(&parser.parse(&line("<Steve> \\help")));
    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("help"));
    assert!(sent[0].contains("online-time (ot)"));

    dispatcher.dispatch(&parser.parse(&line("<Steve> \\help ot")));
    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("Help for command - ot"));
}

#[tokio::test]
async fn invalid_arguments_show_reason_and_help() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, mut rx) = harness(dir.path());
    ctx.observers.register(Arc::new(OnlineTimeCommand::new()));
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx);

    dispatcher.dispatch(&parser.parse(&line("Steve joined the game")));
    let report = dispatcher.dispatch(&parser.parse(&line("<Steve> \\ot dance")));

    assert_eq!(report.invoked, 1);
    assert_eq!(report.failed, 0);
    let sent = drain(&mut rx);
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains("Invalid arguments - dance"));
    assert!(sent[1].contains("Show online time"));
}

#[tokio::test]
async fn failing_hooks_do_not_stop_others() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, mut rx) = harness(dir.path());
    let counting = Arc::new(Counting::default());
    ctx.observers.register(Arc::new(Failing));
    ctx.observers.register(Arc::clone(&counting) as Arc<dyn Observer>);
    ctx.observers.register(Arc::new(Goodbye));
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx);

    let report = dispatcher.dispatch(&parser.parse(&line("Steve joined the game")));
    assert_eq!(report.invoked, 3);
    assert_eq!(report.failed, 1);

    let report = dispatcher.dispatch(&parser.parse(&line("Steve left the game")));
    assert_eq!(report.invoked, 3);
    assert_eq!(report.failed, 1);

    assert_eq!(counting.logins.load(Ordering::SeqCst), 1);
    assert_eq!(counting.logouts.load(Ordering::SeqCst), 1);
    assert_eq!(drain(&mut rx), vec!["/say Goodbye, Steve"]);
}

#[tokio::test]
async fn same_day_sessions_accumulate() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _rx) = harness(dir.path());
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx.clone());

    dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), at(10, 0, 0)));
    let steve = ctx.players.get("Steve").unwrap();
    let total_before = steve.status().time_online();
    let today_before = steve.status().time_online_today();

    dispatcher.dispatch(&parser.parse_at(&line("Steve left the game"), at(10, 10, 0)));
    dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), at(11, 0, 0)));

    assert!((steve.status().time_online() - total_before - 600.0).abs() < 1e-6);
    assert!((steve.status().time_online_today() - today_before - 600.0).abs() < 1e-6);
    assert!(steve.status().is_online());
}

#[tokio::test]
async fn logout_persists_status_for_next_run() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (ctx, _rx) = harness(dir.path());
        let parser = EventParser::new(ctx.players.clone());
        let dispatcher = Dispatcher::new(ctx);
        dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), at(10, 0, 0)));
        dispatcher.dispatch(&parser.parse_at(&line("Steve left the game"), at(10, 30, 0)));
    }

    let store = StatusStore::new(dir.path());
    let players = PlayerTable::new();
    let steve = players.get_or_create("Steve", at(12, 0, 0));
    assert!(store.load(&steve).unwrap());
    assert!((steve.status().time_online() - 1800.0).abs() < 1e-6);
    assert!((steve.status().time_online_today() - 1800.0).abs() < 1e-6);
    assert!(steve.status().is_online(), "is_online is not persisted");
}

#[tokio::test]
async fn chat_from_unknown_player_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, mut rx) = harness(dir.path());
    ctx.observers.register_all(default_observers('\\'));
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx.clone());

    let event = parser.parse(&line("<Herobrine> \\help"));
    assert!(event.is_general());
    let report = dispatcher.dispatch(&event);
    assert_eq!(report.invoked, 0);
    assert!(drain(&mut rx).is_empty());
    assert!(ctx.players.is_empty());
}

#[tokio::test]
async fn login_after_midnight_resets_today_before_hooks_run() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (ctx, _rx) = harness(dir.path());
        let parser = EventParser::new(ctx.players.clone());
        let dispatcher = Dispatcher::new(ctx);
        dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), on_day(1, 23, 30, 0)));
        dispatcher.dispatch(&parser.parse_at(&line("Steve left the game"), on_day(1, 23, 50, 0)));
    }

    // Fresh run: the record from the previous day is loaded from disk.
    let (ctx, _rx) = harness(dir.path());
    let seen = Arc::new(SeenAtLogin::default());
    ctx.observers.register(Arc::clone(&seen) as Arc<dyn Observer>);
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx.clone());

    let report =
        dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), on_day(2, 0, 0, 5)));
    assert_eq!(report.failed, 0);

    let seen = seen.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    let (today, total) = seen[0];
    assert!(today.abs() < 1e-6, "today was {today}");
    assert!((total - 1200.0).abs() < 1e-6, "total was {total}");

    let steve = ctx.players.get("Steve").unwrap();
    assert!(steve.status().is_online());
}

#[tokio::test]
async fn login_after_midnight_in_same_run_resets_today() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _rx) = harness(dir.path());
    let seen = Arc::new(SeenAtLogin::default());
    ctx.observers.register(Arc::clone(&seen) as Arc<dyn Observer>);
    let parser = EventParser::new(ctx.players.clone());
    let dispatcher = Dispatcher::new(ctx);

    dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), on_day(1, 23, 0, 0)));
    dispatcher.dispatch(&parser.parse_at(&line("Steve left the game"), on_day(1, 23, 45, 0)));
    dispatcher.dispatch(&parser.parse_at(&line("Steve joined the game"), on_day(2, 0, 0, 5)));

    let seen = seen.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    let (today, total) = seen[1];
    assert!(today.abs() < 1e-6, "today was {today}");
    assert!((total - 2700.0).abs() < 1e-6, "total was {total}");
}

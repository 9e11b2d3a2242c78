//! Parsing properties and scenarios.

use chrono::Local;
use mcserver_control::event::{EventKind, EventParser};
use mcserver_control::player::PlayerTable;

#[test]
fn unbracketed_lines_are_general() {
    let players = PlayerTable::new();
    let parser = EventParser::new(players.clone());
    let lines = [
        "",
        "Starting minecraft server version 1.20.4",
        "Steve joined the game",
        "<Steve> \\help",
        "  [12:00:00] indented",
        "Done (3.2s)! For help, type \"help\"",
    ];

    for line in lines {
        let event = parser.parse(line);
        assert!(event.is_general(), "{line:?} should be general");
        assert_eq!(event.raw_line, line);
    }
    assert!(players.is_empty());
}

#[test]
fn parsing_twice_is_structurally_equal() {
    let players = PlayerTable::new();
    let parser = EventParser::new(players);
    let lines = [
        "[12:00:00] [Server thread/INFO]: Steve joined the game",
        "[12:00:01] [Server thread/INFO]: <Steve> hello there",
        "[12:00:02] [Server thread/INFO]: <Steve> \\kill-item 30",
        "[12:00:03] [Server thread/INFO]: There are 1 of a max of 20 players online: Steve",
        "[12:00:04] [Server thread/INFO]: Steve left the game",
        "[12:00:05] [Server thread/INFO]: Saving chunks",
    ];

    for line in lines {
        let first = parser.parse(line);
        let second = parser.parse(line);
        assert_eq!(first.raw_line, second.raw_line);
        assert_eq!(first.kind, second.kind, "{line:?}");
    }
}

#[test]
fn steve_login_creates_online_player() {
    let players = PlayerTable::new();
    let parser = EventParser::new(players.clone());

    let event = parser.parse("[12:00:00] [Server thread/INFO]: Steve joined the game");
    let EventKind::Login { player } = &event.kind else {
        panic!("Expected Login, got {:?}", event.kind);
    };
    assert_eq!(player.name(), "Steve");
    assert!(player.status().is_online());
    assert!(players.get("Steve").is_some());
}

#[test]
fn help_command_is_parsed() {
    let players = PlayerTable::new();
    let parser = EventParser::new(players);
    parser.parse("[12:00:00] [Server thread/INFO]: Steve joined the game");

    let event = parser.parse_at("[12:00:05] [Server thread/INFO]: <Steve> \\help", Local::now());
    match &event.kind {
        EventKind::Cmd {
            player,
            entry,
            args,
        } => {
            assert_eq!(player.name(), "Steve");
            assert_eq!(entry, "help");
            assert!(args.is_empty());
        }
        other => panic!("Expected Cmd, got {other:?}"),
    }
}

#[test]
fn events_serialize_with_player_names() {
    let players = PlayerTable::new();
    let parser = EventParser::new(players);
    parser.parse("[12:00:00] [Server thread/INFO]: Steve joined the game");

    let event = parser.parse("[12:00:05] [Server thread/INFO]: <Steve> \\ot warn off");
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "cmd");
    assert_eq!(json["player"], "Steve");
    assert_eq!(json["entry"], "ot");
    assert_eq!(json["args"], serde_json::json!(["warn", "off"]));
}

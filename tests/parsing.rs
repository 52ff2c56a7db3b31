use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use hornets_stats::game_log::{Location, Outcome};
use hornets_stats::nba_api::parse_result_set_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_league_game_finder_fixture() {
    let games = parse_result_set_json(&read_fixture("league_game_finder.json"))
        .expect("fixture should parse");
    // The row with an unparseable date is dropped.
    assert_eq!(games.len(), 7);

    let first = &games[0];
    assert_eq!(first.game_id, "0022400061");
    assert_eq!(first.team, "CHA");
    assert_eq!(first.game_date, NaiveDate::from_ymd_opt(2024, 10, 23).unwrap());
    assert_eq!(first.outcome, Some(Outcome::Win));
    assert_eq!(first.location(), Location::Away);
    assert_eq!(first.opponent(), Some("HOU"));
    assert_eq!(first.stats.points, 110.0);
    assert_eq!(first.stats.fg3m, 16.0);
    assert_eq!(first.stats.plus_minus, 5.0);
    assert_eq!(first.points_allowed(), 105.0);

    assert_eq!(games[1].location(), Location::Home);
}

#[test]
fn pending_game_has_no_outcome_and_zeroed_stats() {
    let games = parse_result_set_json(&read_fixture("league_game_finder.json")).unwrap();
    let pending = games
        .iter()
        .find(|g| g.game_id == "0022400999")
        .expect("pending game should be kept");
    assert_eq!(pending.outcome, None);
    assert_eq!(pending.stats.points, 0.0);
    assert_eq!(pending.stats.minutes, 0.0);
}

#[test]
fn parses_player_game_log_fixture() {
    let games = parse_result_set_json(&read_fixture("player_game_log.json")).unwrap();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0].team, "CHA");
    assert_eq!(games[0].game_id, "0022300171");
    assert_eq!(games[0].game_date, NaiveDate::from_ymd_opt(2023, 11, 26).unwrap());
    assert_eq!(games[0].stats.points, 26.0);
    assert_eq!(games[0].stats.ast, 8.0);
    assert_eq!(games[1].stats.minutes, 35.5);
    assert_eq!(games[1].outcome, Some(Outcome::Win));
}

#[test]
fn null_and_empty_payloads_are_empty() {
    assert!(parse_result_set_json("null").unwrap().is_empty());
    assert!(parse_result_set_json("  ").unwrap().is_empty());
    let no_rows = r#"{"resultSets":[{"name":"x","headers":["GAME_ID"]}]}"#;
    assert!(parse_result_set_json(no_rows).unwrap().is_empty());
}

#[test]
fn malformed_payloads_are_errors() {
    assert!(parse_result_set_json("{not json").is_err());
    assert!(parse_result_set_json(r#"{"resultSets":[]}"#).is_err());
    assert!(parse_result_set_json(r#"{"resultSets":[{"rowSet":[]}]}"#).is_err());
}

use chrono::NaiveDate;

use hornets_stats::aggregate::{
    DEFENSIVE_PERFORMANCE, Metric, PER_GAME_PRODUCTION, REBOUNDS_AND_SCORING, aggregate_by_season, aggregate_totals,
    league_points_averages, scoring_split, split_home_away,
};
use hornets_stats::game_log::{BoxScore, Entity, GameRecord, Location, Outcome, SeasonLog};
use hornets_stats::standings::{compute_standings, split_by_conference, team_record};

fn game(team: &str, matchup: &str, wl: Option<Outcome>, points: f64, plus_minus: f64) -> GameRecord {
    GameRecord {
        game_id: format!("{team}-{matchup}-{points}"),
        game_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        team: team.to_string(),
        matchup: matchup.to_string(),
        outcome: wl,
        stats: BoxScore {
            points,
            plus_minus,
            reb: 40.0,
            oreb: 10.0,
            dreb: 30.0,
            fgm: 40.0,
            fg3m: 12.0,
            ftm: 18.0,
            stl: 7.0,
            blk: points / 20.0,
            tov: 12.0,
            pf: 18.0,
            ast: 25.0,
            ..BoxScore::default()
        },
    }
}

fn league() -> Vec<GameRecord> {
    use Outcome::{Loss, Win};
    vec![
        game("CHA", "CHA vs. BOS", Some(Win), 110.0, 4.0),
        game("BOS", "BOS @ CHA", Some(Loss), 106.0, -4.0),
        game("CHA", "CHA @ BOS", Some(Loss), 98.0, -12.0),
        game("BOS", "BOS vs. CHA", Some(Win), 110.0, 12.0),
        game("LAL", "LAL vs. MIA", Some(Win), 120.0, 9.0),
        game("MIA", "MIA @ LAL", Some(Loss), 111.0, -9.0),
        game("MIA", "MIA vs. LAL", Some(Win), 101.0, 1.0),
        game("LAL", "LAL @ MIA", Some(Loss), 100.0, -1.0),
        game("ATL", "ATL vs. DEN", Some(Win), 130.0, 20.0),
        game("DEN", "DEN @ ATL", Some(Loss), 110.0, -20.0),
        game("ATL", "ATL @ CHA", None, 0.0, 0.0),
    ]
}

#[test]
fn two_game_scenario() {
    let games = vec![
        game("CHA", "CHA vs. BOS", Some(Outcome::Win), 110.0, 4.0),
        game("CHA", "CHA @ BOS", Some(Outcome::Loss), 98.0, -12.0),
    ];
    let rows = compute_standings(&games);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].team, "CHA");
    assert_eq!(rows[0].wins, 1);
    assert_eq!(rows[0].losses, 1);
    assert_eq!(rows[0].win_pct, 0.5);

    let (home, away) = split_home_away(&games);
    assert_eq!(home, vec![games[0].clone()]);
    assert_eq!(away, vec![games[1].clone()]);
}

#[test]
fn standings_are_idempotent() {
    let games = league();
    assert_eq!(compute_standings(&games), compute_standings(&games));
}

#[test]
fn standings_order_and_tie_break() {
    let rows = compute_standings(&league());
    let order: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
    // ATL 1.0; BOS, CHA, LAL, MIA all 0.5 in team-code order; DEN 0.0.
    assert_eq!(order, vec!["ATL", "BOS", "CHA", "LAL", "MIA", "DEN"]);
    // Undecided ATL game is ignored.
    assert_eq!(rows[0].games(), 1);
}

#[test]
fn win_pct_stays_in_unit_interval() {
    for row in compute_standings(&league()) {
        assert!((0.0..=1.0).contains(&row.win_pct), "{row:?}");
    }
}

#[test]
fn standings_of_empty_or_undecided_log_are_empty() {
    assert!(compute_standings(&[]).is_empty());
    let pending = vec![game("CHA", "CHA vs. BOS", None, 0.0, 0.0)];
    assert!(compute_standings(&pending).is_empty());
}

#[test]
fn home_away_partition_is_complete() {
    let games = league();
    let (home, away) = split_home_away(&games);
    assert_eq!(home.len() + away.len(), games.len());
    assert!(home.iter().all(|g| g.location() == Location::Home));
    assert!(away.iter().all(|g| g.location() == Location::Away));
    for g in &games {
        let in_home = home.iter().filter(|h| *h == g).count();
        let in_away = away.iter().filter(|a| *a == g).count();
        assert_eq!(in_home + in_away, 1);
    }
}

#[test]
fn totals_use_fixed_aggregation_per_metric() {
    let games = vec![
        game("CHA", "CHA vs. BOS", Some(Outcome::Win), 100.0, 4.0),
        game("CHA", "CHA @ BOS", Some(Outcome::Loss), 120.0, -12.0),
    ];
    let totals = aggregate_totals(&games, &[Metric::Points, Metric::Blocks, Metric::TwoPointMade]);
    assert_eq!(totals.len(), 3);
    assert_eq!(totals[&Metric::Points], 220.0);
    assert_eq!(totals[&Metric::Blocks], 5.5);
    assert_eq!(totals[&Metric::TwoPointMade], 56.0);

    let defense = aggregate_totals(&games, DEFENSIVE_PERFORMANCE);
    assert_eq!(defense[&Metric::Steals], 14.0);
    assert_eq!(defense[&Metric::DefensiveRebounds], 60.0);
    assert_eq!(defense[&Metric::Turnovers], 12.0);
    assert_eq!(defense[&Metric::Fouls], 18.0);
}

#[test]
fn per_game_production_mixes_means_and_three_point_total() {
    let games = vec![
        game("CHA", "CHA vs. BOS", Some(Outcome::Win), 100.0, 4.0),
        game("CHA", "CHA @ BOS", Some(Outcome::Loss), 120.0, -12.0),
    ];
    let per_game = aggregate_totals(&games, PER_GAME_PRODUCTION);
    assert_eq!(per_game.len(), 4);
    assert_eq!(per_game[&Metric::PointsPerGame], 110.0);
    assert_eq!(per_game[&Metric::ReboundsPerGame], 40.0);
    assert_eq!(per_game[&Metric::Assists], 25.0);
    assert_eq!(per_game[&Metric::ThreePointMade], 24.0);
}

#[test]
fn empty_log_gives_empty_totals() {
    assert!(aggregate_totals(&[], REBOUNDS_AND_SCORING).is_empty());
    let (home, away) = split_home_away(&[]);
    assert!(home.is_empty() && away.is_empty());
}

#[test]
fn per_season_totals_follow_log_order() {
    let entity = Entity::Team("CHA".to_string());
    let logs = vec![
        SeasonLog::new(
            entity.clone(),
            "2024-25",
            vec![game("CHA", "CHA vs. BOS", Some(Outcome::Win), 110.0, 4.0)],
        ),
        SeasonLog::empty(entity, "2023-24"),
    ];
    let by_season = aggregate_by_season(&logs, &[Metric::Points]);
    assert_eq!(by_season.len(), 2);
    assert_eq!(by_season[0].0, "2024-25");
    assert_eq!(by_season[0].1[&Metric::Points], 110.0);
    assert_eq!(by_season[1].0, "2023-24");
    assert!(by_season[1].1.is_empty());
}

#[test]
fn team_record_splits_by_location() {
    let games: Vec<GameRecord> = league().into_iter().filter(|g| g.team == "CHA").collect();
    let rec = team_record(&games);
    assert_eq!((rec.wins, rec.losses), (1, 1));
    assert_eq!((rec.home_wins, rec.home_losses), (1, 0));
    assert_eq!((rec.away_wins, rec.away_losses), (0, 1));
    assert_eq!(rec.home_win_pct(), 1.0);
    assert!(team_record(&[]).win_pct().is_nan());
}

#[test]
fn scoring_split_reports_nan_for_missing_side() {
    let games = vec![
        game("CHA", "CHA vs. BOS", Some(Outcome::Win), 110.0, 4.0),
        game("CHA", "CHA vs. ATL", Some(Outcome::Loss), 100.0, -6.0),
    ];
    let split = scoring_split(&games);
    assert_eq!(split.home_scored, 105.0);
    assert_eq!(split.home_allowed, 106.0);
    assert!(split.away_scored.is_nan());
    assert!(split.away_allowed.is_nan());
}

#[test]
fn league_points_averages_are_sorted_by_team() {
    let rows = league_points_averages(&league());
    let teams: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
    assert_eq!(teams, vec!["ATL", "BOS", "CHA", "DEN", "LAL", "MIA"]);
    let cha = &rows[2];
    assert_eq!(cha.games, 2);
    assert_eq!(cha.avg_scored, 104.0);
    assert_eq!(cha.avg_allowed, 108.0);
}

#[test]
fn conference_tables_keep_rank_order() {
    let rows = compute_standings(&league());
    let (east, west) = split_by_conference(&rows);
    let east: Vec<&str> = east.iter().map(|r| r.team.as_str()).collect();
    let west: Vec<&str> = west.iter().map(|r| r.team.as_str()).collect();
    assert_eq!(east, vec!["ATL", "BOS", "CHA", "MIA"]);
    assert_eq!(west, vec!["LAL", "DEN"]);
}

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use hornets_stats::aggregate::{DistributionSummary, Metric, Totals};
use hornets_stats::config::{Config, parse_seasons, parse_threshold};
use hornets_stats::game_source::GameLogSource;
use hornets_stats::game_store::SqliteGameSource;
use hornets_stats::logging;
use hornets_stats::nba_api::NbaStatsClient;
use hornets_stats::report::{
    PLAYER_SEASON_AVERAGES, PLAYER_STATS, PlayerReport, TeamReport, build_player_report,
    build_team_report, report_metrics,
};
use hornets_stats::standings::StandingsRow;

fn main() -> Result<()> {
    logging::init("info");
    let mut cfg = Config::load();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let json = apply_args(&mut cfg, &args)?;

    let source: Box<dyn GameLogSource> = match cfg.db_path.as_deref() {
        Some(path) => Box::new(SqliteGameSource::open(path)?),
        None => Box::new(NbaStatsClient::from_config(&cfg)),
    };

    if let Some(player_id) = cfg.player {
        let report =
            build_player_report(source.as_ref(), player_id, &cfg.seasons, cfg.opponent.as_deref());
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("serialize player report")?
            );
        } else {
            print_player_report(&report);
        }
        return Ok(());
    }

    let report = build_team_report(
        source.as_ref(),
        &cfg.team,
        &cfg.seasons,
        cfg.stat,
        cfg.threshold,
    );
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Command-line flags override the environment. Returns whether `--json` was given.
fn apply_args(cfg: &mut Config, args: &[String]) -> Result<bool> {
    let mut json = false;
    let mut idx = 0;
    while idx < args.len() {
        let arg = args[idx].as_str();
        if arg == "--json" {
            json = true;
            idx += 1;
            continue;
        }
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag, Some(value.to_string())),
            None => (arg, None),
        };
        let value = match inline {
            Some(v) => v,
            None => {
                idx += 1;
                args.get(idx)
                    .cloned()
                    .ok_or_else(|| anyhow!("missing value for {flag}"))?
            }
        };
        match flag {
            "--team" => cfg.team = value.trim().to_ascii_uppercase(),
            "--seasons" => cfg.seasons = parse_seasons(&value),
            "--stat" => {
                cfg.stat = Metric::from_code(&value).ok_or_else(|| anyhow!("unknown stat {value}"))?
            }
            "--x" | "--threshold" => {
                cfg.threshold = parse_threshold(&value)
                    .ok_or_else(|| anyhow!("threshold must be a finite number, got {value}"))?
            }
            "--player" => {
                cfg.player = Some(
                    value
                        .trim()
                        .parse::<u64>()
                        .with_context(|| format!("bad player id {value}"))?,
                )
            }
            "--opponent" => cfg.opponent = Some(value.trim().to_ascii_uppercase()),
            "--db" => cfg.db_path = Some(PathBuf::from(value.trim())),
            other => return Err(anyhow!("unknown argument {other}")),
        }
        idx += 1;
    }
    if cfg.seasons.is_empty() {
        return Err(anyhow!("no seasons requested"));
    }
    Ok(json)
}

fn print_report(r: &TeamReport) {
    println!("{} | seasons {} | {} games", r.team, r.seasons.join(", "), r.games);
    if r.games == 0 {
        println!("No game data found for {}.", r.team);
    }

    if let Some(season) = r.standings_season.as_deref() {
        println!();
        println!("Standings {season}");
        print_standings("East", &r.east);
        print_standings("West", &r.west);
    }

    println!();
    println!(
        "Record {}-{} ({}) | home {}-{} ({}) | away {}-{} ({})",
        r.record.wins,
        r.record.losses,
        fmt_pct(r.record.win_pct()),
        r.record.home_wins,
        r.record.home_losses,
        fmt_pct(r.record.home_win_pct()),
        r.record.away_wins,
        r.record.away_losses,
        fmt_pct(r.record.away_win_pct())
    );
    println!(
        "Points home {} scored / {} allowed | away {} scored / {} allowed",
        fmt_num(r.scoring.home_scored),
        fmt_num(r.scoring.home_allowed),
        fmt_num(r.scoring.away_scored),
        fmt_num(r.scoring.away_allowed)
    );

    println!();
    println!("{:<34} {:>10} {:>10} {:>10}", "", "All", "Home", "Away");
    for metric in report_metrics() {
        println!(
            "{:<34} {:>10} {:>10} {:>10}",
            metric.label(),
            fmt_total(&r.totals, metric),
            fmt_total(&r.home_totals, metric),
            fmt_total(&r.away_totals, metric)
        );
    }
    for (season, totals) in &r.by_season {
        let pts = fmt_total(totals, Metric::Points);
        let reb = fmt_total(totals, Metric::Rebounds);
        println!("{season}: points {pts}, rebounds {reb}");
    }

    println!();
    if let Some(s) = r.summary {
        println!(
            "{}: {} | P(above mean) {}",
            r.stat.code(),
            fmt_summary(&s),
            fmt_pct(s.p_above_mean)
        );
    }
    match (&r.estimate, &r.estimate_error) {
        (Some(e), _) => {
            println!(
                "Gumbel fit mu={:.2} beta={:.2} at X={}",
                e.location, e.scale, e.threshold
            );
            println!("  P(value > X)        {:.4}", e.p_above);
            println!("  P(value >= X)       {:.4}", e.p_at_or_above);
            println!("  P(value <= X)       {:.4}", e.p_at_or_below);
            println!("  fitted share <= X   {:.4}", e.fitted_share_at_or_below);
            println!("  games below X       {} of {}", e.count_below, e.sample_size);
            println!("  share below X       {}", fmt_pct(e.proportion_below));
        }
        (None, Some(err)) => println!("Gumbel fit unavailable: {err}"),
        (None, None) => {}
    }
}

fn print_player_report(r: &PlayerReport) {
    println!(
        "Player {} | seasons {} | {} games | record {}-{}",
        r.player_id,
        r.seasons.join(", "),
        r.games,
        r.record.wins,
        r.record.losses
    );
    if r.games == 0 {
        println!("No game data found for player {}.", r.player_id);
        return;
    }

    for (label, summaries) in [
        ("All games", &r.summaries),
        ("Home", &r.home_summaries),
        ("Away", &r.away_summaries),
    ] {
        println!();
        println!("{label}");
        for metric in PLAYER_STATS {
            match summaries.get(metric) {
                Some(s) => println!("  {:<4} {}", metric.code(), fmt_summary(s)),
                None => println!("  {:<4} n/a", metric.code()),
            }
        }
    }

    println!();
    for metric in PLAYER_SEASON_AVERAGES {
        println!("{:<20} {:>8}", metric.label(), fmt_total(&r.averages, *metric));
    }

    println!();
    println!("Opponents: {}", r.opponents.join(" "));
    if let Some(opp) = r.opponent.as_deref() {
        println!("Games against {opp}: {}", r.vs_opponent.len());
        for g in &r.vs_opponent {
            println!(
                "  {} {:<12} {} pts {} reb {} ast {} min {}",
                g.game_date,
                g.matchup,
                g.outcome.map(|o| o.code()).unwrap_or("-"),
                fmt_num(g.stats.points),
                fmt_num(g.stats.reb),
                fmt_num(g.stats.ast),
                fmt_num(g.stats.minutes)
            );
        }
    }
}

fn print_standings(label: &str, rows: &[StandingsRow]) {
    println!("  {label}");
    for (idx, row) in rows.iter().enumerate() {
        println!(
            "  {:>2}. {:<4} {:>3}-{:<3} {}",
            idx + 1,
            row.team,
            row.wins,
            row.losses,
            fmt_pct(row.win_pct)
        );
    }
}

fn fmt_summary(s: &DistributionSummary) -> String {
    format!(
        "mean {} median {} mode {} sd {} min {} max {}",
        fmt_num(s.mean),
        fmt_num(s.median),
        fmt_num(s.mode),
        fmt_num(s.std_dev),
        fmt_num(s.min),
        fmt_num(s.max)
    )
}

fn fmt_total(totals: &Totals, metric: Metric) -> String {
    totals
        .get(&metric)
        .map(|v| fmt_num(*v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn fmt_num(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.1}")
    } else {
        "n/a".to_string()
    }
}

fn fmt_pct(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.3}")
    } else {
        "n/a".to_string()
    }
}

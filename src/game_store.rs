use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, Row, params};
use tracing::{info, warn};

use crate::error::StatsError;
use crate::game_log::{BoxScore, Entity, GameRecord, Outcome, SeasonLog};
use crate::game_source::GameLogSource;
use crate::http_cache::app_cache_dir;

const DATE_FORMAT: &str = "%Y-%m-%d";

const GAME_COLUMNS: &str = "game_id, game_date, team_code, matchup, wl, minutes, pts, fgm, fga, \
     fg3m, fg3a, ftm, fta, oreb, dreb, reb, ast, stl, blk, tov, pf, plus_minus";

#[derive(Debug, Clone)]
pub struct SeasonIngest {
    pub season: String,
    pub games_upserted: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: PathBuf,
    pub seasons_total: usize,
    pub seasons_succeeded: usize,
    pub games_upserted: usize,
    pub per_season: Vec<SeasonIngest>,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join("game_logs.sqlite"))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            game_id TEXT NOT NULL,
            team_code TEXT NOT NULL,
            season TEXT NOT NULL,
            game_date TEXT NOT NULL,
            matchup TEXT NOT NULL,
            wl TEXT NULL,
            minutes REAL NOT NULL,
            pts REAL NOT NULL,
            fgm REAL NOT NULL,
            fga REAL NOT NULL,
            fg3m REAL NOT NULL,
            fg3a REAL NOT NULL,
            ftm REAL NOT NULL,
            fta REAL NOT NULL,
            oreb REAL NOT NULL,
            dreb REAL NOT NULL,
            reb REAL NOT NULL,
            ast REAL NOT NULL,
            stl REAL NOT NULL,
            blk REAL NOT NULL,
            tov REAL NOT NULL,
            pf REAL NOT NULL,
            plus_minus REAL NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_id, team_code)
        );
        CREATE INDEX IF NOT EXISTS idx_games_season ON games(season);
        CREATE INDEX IF NOT EXISTS idx_games_team ON games(team_code, season);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            seasons_total INTEGER NOT NULL,
            seasons_succeeded INTEGER NOT NULL,
            games_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Insert or replace one season's records. Returns the number written.
pub fn upsert_season(conn: &mut Connection, season: &str, games: &[GameRecord]) -> Result<usize> {
    let updated_at = Utc::now().to_rfc3339();
    let tx = conn.transaction().context("begin upsert transaction")?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO games (game_id, team_code, season, game_date, matchup, wl,
                    minutes, pts, fgm, fga, fg3m, fg3a, ftm, fta, oreb, dreb, reb,
                    ast, stl, blk, tov, pf, plus_minus, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)
                 ON CONFLICT(game_id, team_code) DO UPDATE SET
                    season = excluded.season,
                    game_date = excluded.game_date,
                    matchup = excluded.matchup,
                    wl = excluded.wl,
                    minutes = excluded.minutes,
                    pts = excluded.pts,
                    fgm = excluded.fgm,
                    fga = excluded.fga,
                    fg3m = excluded.fg3m,
                    fg3a = excluded.fg3a,
                    ftm = excluded.ftm,
                    fta = excluded.fta,
                    oreb = excluded.oreb,
                    dreb = excluded.dreb,
                    reb = excluded.reb,
                    ast = excluded.ast,
                    stl = excluded.stl,
                    blk = excluded.blk,
                    tov = excluded.tov,
                    pf = excluded.pf,
                    plus_minus = excluded.plus_minus,
                    updated_at = excluded.updated_at",
            )
            .context("prepare game upsert")?;
        for g in games {
            let s = &g.stats;
            stmt.execute(params![
                g.game_id,
                g.team,
                season,
                g.game_date.format(DATE_FORMAT).to_string(),
                g.matchup,
                g.outcome.map(Outcome::code),
                s.minutes,
                s.points,
                s.fgm,
                s.fga,
                s.fg3m,
                s.fg3a,
                s.ftm,
                s.fta,
                s.oreb,
                s.dreb,
                s.reb,
                s.ast,
                s.stl,
                s.blk,
                s.tov,
                s.pf,
                s.plus_minus,
                updated_at,
            ])
            .with_context(|| format!("upsert game {} for {}", g.game_id, g.team))?;
        }
    }
    tx.commit().context("commit upsert transaction")?;
    Ok(games.len())
}

/// All stored games of a season, oldest first.
pub fn load_season(conn: &Connection, season: &str) -> Result<Vec<GameRecord>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE season = ?1 \
         ORDER BY game_date ASC, game_id ASC, team_code ASC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare load season query")?;
    let rows = stmt
        .query_map(params![season], game_from_row)
        .context("query load season")?;
    collect_rows(rows)
}

pub fn load_team_season(conn: &Connection, team: &str, season: &str) -> Result<Vec<GameRecord>> {
    let sql = format!(
        "SELECT {GAME_COLUMNS} FROM games WHERE season = ?1 AND team_code = ?2 COLLATE NOCASE \
         ORDER BY game_date ASC, game_id ASC"
    );
    let mut stmt = conn.prepare(&sql).context("prepare load team query")?;
    let rows = stmt
        .query_map(params![season, team], game_from_row)
        .context("query load team season")?;
    collect_rows(rows)
}

fn collect_rows(
    rows: impl Iterator<Item = rusqlite::Result<GameRecord>>,
) -> Result<Vec<GameRecord>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode game row")?);
    }
    Ok(out)
}

fn game_from_row(row: &Row<'_>) -> rusqlite::Result<GameRecord> {
    let raw_date: String = row.get(1)?;
    let game_date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
    })?;
    let wl: Option<String> = row.get(4)?;
    Ok(GameRecord {
        game_id: row.get(0)?,
        game_date,
        team: row.get(2)?,
        matchup: row.get(3)?,
        outcome: wl.as_deref().and_then(Outcome::from_code),
        stats: BoxScore {
            minutes: row.get(5)?,
            points: row.get(6)?,
            fgm: row.get(7)?,
            fga: row.get(8)?,
            fg3m: row.get(9)?,
            fg3a: row.get(10)?,
            ftm: row.get(11)?,
            fta: row.get(12)?,
            oreb: row.get(13)?,
            dreb: row.get(14)?,
            reb: row.get(15)?,
            ast: row.get(16)?,
            stl: row.get(17)?,
            blk: row.get(18)?,
            tov: row.get(19)?,
            pf: row.get(20)?,
            plus_minus: row.get(21)?,
        },
    })
}

/// Pull league-wide logs for each season from `source` into the store.
/// A failed season is recorded and skipped; the run continues.
pub fn ingest_seasons<S: GameLogSource + ?Sized>(
    conn: &mut Connection,
    db_path: PathBuf,
    source: &S,
    seasons: &[String],
) -> Result<IngestSummary> {
    let started_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO ingest_runs(started_at, finished_at, seasons_total, seasons_succeeded, games_upserted, errors_json)
         VALUES (?1, NULL, ?2, 0, 0, '[]')",
        params![started_at, seasons.len() as i64],
    )
    .context("insert ingest run")?;
    let run_id = conn.last_insert_rowid();

    let mut per_season = Vec::new();
    let mut errors: Vec<String> = Vec::new();
    for season in seasons {
        let item = match source.fetch_season(&Entity::League, season) {
            Ok(log) => {
                let written = upsert_season(conn, season, log.games())?;
                info!(season = %season, games = written, "season stored");
                SeasonIngest {
                    season: season.clone(),
                    games_upserted: written,
                    error: None,
                }
            }
            Err(err) => {
                warn!(season = %season, error = %err, "season ingest failed");
                errors.push(format!("season {season}: {err}"));
                SeasonIngest {
                    season: season.clone(),
                    games_upserted: 0,
                    error: Some(err.to_string()),
                }
            }
        };
        per_season.push(item);
    }

    let seasons_succeeded = per_season.iter().filter(|s| s.error.is_none()).count();
    let games_upserted = per_season.iter().map(|s| s.games_upserted).sum();
    let finished_at = Utc::now().to_rfc3339();
    let errors_json = serde_json::to_string(&errors).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, seasons_succeeded = ?2, games_upserted = ?3, errors_json = ?4
         WHERE run_id = ?5",
        params![
            finished_at,
            seasons_succeeded as i64,
            games_upserted as i64,
            errors_json,
            run_id
        ],
    )
    .context("update ingest run")?;

    Ok(IngestSummary {
        db_path,
        seasons_total: seasons.len(),
        seasons_succeeded,
        games_upserted,
        per_season,
    })
}

/// Game-log source over a local store filled by `ingest_seasons`.
pub struct SqliteGameSource {
    conn: Connection,
}

impl SqliteGameSource {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(open_db(path)?))
    }
}

impl GameLogSource for SqliteGameSource {
    fn fetch_season(&self, entity: &Entity, season: &str) -> Result<SeasonLog, StatsError> {
        let games = match entity {
            Entity::League => load_season(&self.conn, season),
            Entity::Team(code) => load_team_season(&self.conn, code, season),
            Entity::Player(_) => {
                return Err(StatsError::unavailable(
                    entity,
                    season,
                    "player logs are not stored locally",
                ));
            }
        }
        .map_err(|err| StatsError::unavailable(entity, season, format!("{err:#}")))?;

        if games.is_empty() {
            return Err(StatsError::unavailable(entity, season, "no stored games"));
        }
        Ok(SeasonLog::new(entity.clone(), season, games))
    }
}

pub mod seed;
pub use seed::seed_data;

use anyhow::Result;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::env;
use std::str::FromStr;

use crate::models::*;
use crate::services::normalizer::Parameter;
use crate::services::strength::TeamMetrics;

pub async fn create_pool() -> Result<SqlitePool> {
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/pitchrank.db".to_string());

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(&database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet. Seeds demo data when the
/// database is empty.
pub async fn init_database() -> Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await?;
    seed_data(&pool).await
}

/// Called from the server so schema creation shares the main pool.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            league TEXT NOT NULL,
            crest_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            home_team_id TEXT NOT NULL,
            away_team_id TEXT NOT NULL,
            home_team_name TEXT NOT NULL,
            away_team_name TEXT NOT NULL,
            league TEXT NOT NULL,
            match_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            home_score INTEGER,
            away_score INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (home_team_id) REFERENCES teams (id),
            FOREIGN KEY (away_team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // team_metrics: one row per collected parameter; absent row = absent metric
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS team_metrics (
            team_id TEXT NOT NULL,
            season TEXT NOT NULL,
            parameter TEXT NOT NULL,
            value REAL NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (team_id, season, parameter),
            FOREIGN KEY (team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS strength_scores (
            id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL,
            season TEXT NOT NULL,
            profile TEXT NOT NULL,
            score REAL NOT NULL,
            completion REAL NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (team_id) REFERENCES teams (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_teams_league ON teams(league)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_strength_team ON strength_scores(team_id, season, profile)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

// Team operations
pub async fn insert_team(pool: &SqlitePool, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO teams
        (id, name, league, crest_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&team.id)
    .bind(&team.name)
    .bind(&team.league)
    .bind(&team.crest_url)
    .bind(team.created_at.to_rfc3339())
    .bind(team.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

fn team_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Team> {
    Ok(Team {
        id: row.get("id"),
        name: row.get("name"),
        league: row.get("league"),
        crest_url: row.get("crest_url"),
        created_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("created_at"))?
            .with_timezone(&Utc),
        updated_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("updated_at"))?
            .with_timezone(&Utc),
    })
}

pub async fn get_team_by_id(pool: &SqlitePool, team_id: &str) -> Result<Option<Team>> {
    let row = sqlx::query("SELECT * FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(team_from_row).transpose()
}

pub async fn get_all_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let rows = sqlx::query("SELECT * FROM teams ORDER BY league, name")
        .fetch_all(pool)
        .await?;

    rows.iter().map(team_from_row).collect()
}

pub async fn find_teams_by_name(pool: &SqlitePool, name: &str) -> Result<Vec<Team>> {
    let rows = sqlx::query("SELECT * FROM teams WHERE LOWER(name) LIKE LOWER(?) ORDER BY name")
        .bind(format!("%{}%", name))
        .fetch_all(pool)
        .await?;

    rows.iter().map(team_from_row).collect()
}

// Match operations
pub async fn insert_match(pool: &SqlitePool, match_data: &MatchRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO matches
        (id, home_team_id, away_team_id, home_team_name, away_team_name, league,
         match_date, status, home_score, away_score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&match_data.id)
    .bind(&match_data.home_team_id)
    .bind(&match_data.away_team_id)
    .bind(&match_data.home_team_name)
    .bind(&match_data.away_team_name)
    .bind(&match_data.league)
    .bind(match_data.match_date.to_rfc3339())
    .bind(&match_data.status)
    .bind(match_data.home_score)
    .bind(match_data.away_score)
    .bind(match_data.created_at.to_rfc3339())
    .bind(match_data.updated_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

fn match_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<MatchRecord> {
    Ok(MatchRecord {
        id: row.get("id"),
        home_team_id: row.get("home_team_id"),
        away_team_id: row.get("away_team_id"),
        home_team_name: row.get("home_team_name"),
        away_team_name: row.get("away_team_name"),
        league: row.get("league"),
        match_date: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("match_date"))?
            .with_timezone(&Utc),
        status: row.get("status"),
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        created_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("created_at"))?
            .with_timezone(&Utc),
        updated_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("updated_at"))?
            .with_timezone(&Utc),
    })
}

/// Finished matches with scores, oldest first, for ELO replay.
pub async fn get_finished_matches_ordered(
    pool: &SqlitePool,
    league: Option<&str>,
) -> Result<Vec<MatchRecord>> {
    let rows = if let Some(league) = league {
        sqlx::query(
            "SELECT * FROM matches WHERE status = 'finished' AND home_score IS NOT NULL AND league = ? ORDER BY match_date ASC",
        )
        .bind(league)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query(
            "SELECT * FROM matches WHERE status = 'finished' AND home_score IS NOT NULL ORDER BY match_date ASC",
        )
        .fetch_all(pool)
        .await?
    };

    rows.iter().map(match_from_row).collect()
}

pub async fn get_team_recent_matches(
    pool: &SqlitePool,
    team_id: &str,
    limit: i64,
) -> Result<Vec<MatchRecord>> {
    let rows = sqlx::query(
        r#"SELECT * FROM matches
           WHERE (home_team_id = ? OR away_team_id = ?) AND status = 'finished'
           ORDER BY match_date DESC LIMIT ?"#,
    )
    .bind(team_id)
    .bind(team_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(match_from_row).collect()
}

// Metric operations

pub async fn upsert_metric(
    pool: &SqlitePool,
    team_id: &str,
    season: &str,
    parameter: Parameter,
    value: f64,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"INSERT INTO team_metrics (team_id, season, parameter, value, updated_at)
           VALUES (?, ?, ?, ?, ?)
           ON CONFLICT(team_id, season, parameter) DO UPDATE SET
               value      = excluded.value,
               updated_at = excluded.updated_at"#,
    )
    .bind(team_id)
    .bind(season)
    .bind(parameter.as_str())
    .bind(value)
    .bind(&now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all stored metrics for a team/season into the scoring input shape.
/// Rows with parameter names the engine no longer knows are skipped.
pub async fn get_team_metrics(
    pool: &SqlitePool,
    team_id: &str,
    season: &str,
) -> Result<TeamMetrics> {
    let rows = sqlx::query("SELECT parameter, value FROM team_metrics WHERE team_id = ? AND season = ?")
        .bind(team_id)
        .bind(season)
        .fetch_all(pool)
        .await?;

    let mut metrics = TeamMetrics::new();
    for row in rows {
        let name: String = row.get("parameter");
        match Parameter::from_name(&name) {
            Some(parameter) => metrics.set(parameter, row.get("value")),
            None => tracing::warn!("Skipping unknown metric '{}' for team {}", name, team_id),
        }
    }

    Ok(metrics)
}

// Strength score operations

pub async fn insert_strength_record(pool: &SqlitePool, record: &StrengthRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO strength_scores
        (id, team_id, season, profile, score, completion, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.team_id)
    .bind(&record.season)
    .bind(&record.profile)
    .bind(record.score)
    .bind(record.completion)
    .bind(record.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

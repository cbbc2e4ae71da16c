use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::env;

use crate::db::{
    get_finished_matches_ordered, get_team_recent_matches, insert_match, insert_team,
    upsert_metric,
};
use crate::models::{MatchRecord, Team};
use crate::services::normalizer::Parameter;
use crate::utils::{form_points_per_match, squad_depth_from_size};

// ── football-data.org structures ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FootballDataTeams {
    pub teams: Vec<FootballTeam>,
}

#[derive(Debug, Deserialize)]
pub struct FootballTeam {
    pub id: u32,
    pub name: String,
    pub crest: Option<String>,
    #[serde(default)]
    pub squad: Vec<SquadMember>,
}

#[derive(Debug, Deserialize)]
pub struct SquadMember {
    #[allow(dead_code)]
    pub id: u32,
}

#[derive(Debug, Deserialize)]
pub struct FootballDataMatches {
    pub matches: Vec<FootballMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootballMatch {
    pub id: u32,
    pub utc_date: String,
    pub status: String,
    pub home_team: MatchTeam,
    pub away_team: MatchTeam,
    pub score: MatchScore,
}

#[derive(Debug, Deserialize)]
pub struct MatchTeam {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub full_time: Option<Score>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Score {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

// ── ELO maintenance ─────────────────────────────────────────────────────────

const ELO_BASE_RATING: f64 = 1200.0;
const ELO_K_FACTOR: f64 = 32.0;
const ELO_HOME_BONUS: f64 = 100.0;

/// Expected score for side A given both ratings.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

/// Classic ELO update for one finished match, with a home-venue bonus and a
/// goal-difference multiplier so big wins move ratings further.
pub fn update_ratings(
    home_rating: f64,
    away_rating: f64,
    home_score: i32,
    away_score: i32,
) -> (f64, f64) {
    let expected_home = expected_score(home_rating + ELO_HOME_BONUS, away_rating);
    let expected_away = 1.0 - expected_home;

    let actual_home = match home_score.cmp(&away_score) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Equal => 0.5,
        std::cmp::Ordering::Less => 0.0,
    };
    let actual_away = 1.0 - actual_home;

    let goal_diff = (home_score - away_score).abs() as f64;
    let goal_multiplier = if goal_diff <= 1.0 {
        1.0
    } else if goal_diff == 2.0 {
        1.5
    } else {
        (11.0 + goal_diff) / 8.0
    };

    (
        home_rating + ELO_K_FACTOR * goal_multiplier * (actual_home - expected_home),
        away_rating + ELO_K_FACTOR * goal_multiplier * (actual_away - expected_away),
    )
}

// ── Collector ───────────────────────────────────────────────────────────────

/// Pulls teams and matches for a competition from football-data.org and
/// derives the raw metrics the scoring engine consumes: `elo_score` (match
/// replay), `form_score` (last 5 results) and `squad_depth_score` (squad
/// headcount). Metrics it cannot observe are simply not written, which the
/// aggregator handles as partial data.
pub struct Collector {
    client: Client,
    api_key: Option<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            api_key: env::var("FOOTBALL_DATA_API_KEY").ok(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full collection pass for one competition code (e.g. "PL", "PD").
    pub async fn collect_league(&self, pool: &SqlitePool, code: &str, season: &str) -> Result<()> {
        self.fetch_teams(pool, code, season).await?;
        self.fetch_matches(pool, code).await?;
        self.rebuild_elo(pool, code, season).await?;
        self.update_form(pool, code, season).await?;
        Ok(())
    }

    async fn fetch_teams(&self, pool: &SqlitePool, code: &str, season: &str) -> Result<()> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("FOOTBALL_DATA_API_KEY not set"))?;

        tracing::info!("Fetching {} teams from football-data.org…", code);

        let url = format!("https://api.football-data.org/v4/competitions/{}/teams", code);
        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} teams API error {}: {}", code, status, body));
        }

        let data: FootballDataTeams = response.json().await?;
        let mut stored = 0usize;

        for t in data.teams {
            let team_id = format!("{}_{}", code.to_lowercase(), t.id);
            let squad_size = t.squad.len();

            insert_team(
                pool,
                &Team {
                    id: team_id.clone(),
                    name: t.name,
                    league: code.to_string(),
                    crest_url: t.crest,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                },
            )
            .await?;

            if squad_size > 0 {
                upsert_metric(
                    pool,
                    &team_id,
                    season,
                    Parameter::SquadDepthScore,
                    squad_depth_from_size(squad_size),
                )
                .await?;
            }

            stored += 1;
        }

        tracing::info!("Stored {} {} teams", stored, code);
        Ok(())
    }

    /// Fetch all matches for the competition's current season (finished +
    /// scheduled).
    async fn fetch_matches(&self, pool: &SqlitePool, code: &str) -> Result<()> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("FOOTBALL_DATA_API_KEY not set"))?;

        tracing::info!("Fetching {} matches from football-data.org…", code);

        let url = format!(
            "https://api.football-data.org/v4/competitions/{}/matches",
            code
        );
        let response = self
            .client
            .get(&url)
            .header("X-Auth-Token", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("{} matches API error {}: {}", code, status, body));
        }

        let data: FootballDataMatches = response.json().await?;
        let mut stored = 0usize;

        for m in data.matches {
            let match_date = match DateTime::parse_from_rfc3339(&m.utc_date) {
                Ok(d) => d.with_timezone(&Utc),
                Err(e) => {
                    tracing::warn!("Bad date '{}': {}", m.utc_date, e);
                    continue;
                }
            };

            let status = match m.status.as_str() {
                "FINISHED" => "finished",
                "IN_PLAY" | "PAUSED" => "live",
                _ => "scheduled", // SCHEDULED, TIMED, POSTPONED …
            };

            let prefix = code.to_lowercase();
            let record = MatchRecord {
                id: format!("{}_{}", prefix, m.id),
                home_team_id: format!("{}_{}", prefix, m.home_team.id),
                away_team_id: format!("{}_{}", prefix, m.away_team.id),
                home_team_name: m.home_team.name,
                away_team_name: m.away_team.name,
                league: code.to_string(),
                match_date,
                status: status.to_string(),
                home_score: m.score.full_time.as_ref().and_then(|s| s.home.map(|v| v as i32)),
                away_score: m.score.full_time.as_ref().and_then(|s| s.away.map(|v| v as i32)),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };

            insert_match(pool, &record).await?;
            stored += 1;
        }

        tracing::info!("Stored {} {} matches", stored, code);
        Ok(())
    }

    /// Replay finished matches in date order and store each team's final
    /// rating as its `elo_score` metric.
    async fn rebuild_elo(&self, pool: &SqlitePool, code: &str, season: &str) -> Result<()> {
        let matches = get_finished_matches_ordered(pool, Some(code)).await?;
        let mut ratings: HashMap<String, f64> = HashMap::new();

        for m in &matches {
            let (home_score, away_score) = match (m.home_score, m.away_score) {
                (Some(h), Some(a)) => (h, a),
                _ => continue,
            };

            let home = *ratings.entry(m.home_team_id.clone()).or_insert(ELO_BASE_RATING);
            let away = *ratings.entry(m.away_team_id.clone()).or_insert(ELO_BASE_RATING);

            let (new_home, new_away) = update_ratings(home, away, home_score, away_score);
            ratings.insert(m.home_team_id.clone(), new_home);
            ratings.insert(m.away_team_id.clone(), new_away);
        }

        for (team_id, rating) in &ratings {
            upsert_metric(pool, team_id, season, Parameter::EloScore, *rating).await?;
        }

        tracing::info!(
            "ELO rebuilt for {} teams from {} finished {} matches",
            ratings.len(),
            matches.len(),
            code
        );
        Ok(())
    }

    /// Derive `form_score` (points-per-match over the last 5 results) for
    /// every team seen in this competition's finished matches.
    async fn update_form(&self, pool: &SqlitePool, code: &str, season: &str) -> Result<()> {
        let matches = get_finished_matches_ordered(pool, Some(code)).await?;
        let mut team_ids: Vec<String> = matches
            .iter()
            .flat_map(|m| [m.home_team_id.clone(), m.away_team_id.clone()])
            .collect();
        team_ids.sort();
        team_ids.dedup();

        let mut updated = 0usize;
        for team_id in &team_ids {
            let recent = get_team_recent_matches(pool, team_id, 5).await?;
            let form: String = recent.iter().map(|m| result_for(m, team_id)).collect();

            if let Some(ppm) = form_points_per_match(&form) {
                upsert_metric(pool, team_id, season, Parameter::FormScore, ppm).await?;
                updated += 1;
            }
        }

        tracing::info!("Form updated for {} {} teams", updated, code);
        Ok(())
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

/// W/D/L from one team's perspective; '?' when scores are missing.
fn result_for(m: &MatchRecord, team_id: &str) -> char {
    let (home, away) = match (m.home_score, m.away_score) {
        (Some(h), Some(a)) => (h, a),
        _ => return '?',
    };
    let (own, other) = if m.home_team_id == team_id {
        (home, away)
    } else {
        (away, home)
    };
    if own > other {
        'W'
    } else if own < other {
        'L'
    } else {
        'D'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_score_symmetry() {
        let e = expected_score(1500.0, 1500.0);
        assert!((e - 0.5).abs() < 1e-12);
        let strong = expected_score(1700.0, 1300.0);
        assert!(strong > 0.9);
        assert!((strong + expected_score(1300.0, 1700.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_ratings_zero_sum() {
        let (h, a) = update_ratings(1400.0, 1400.0, 2, 0);
        assert!(h > 1400.0 && a < 1400.0);
        assert!(((h - 1400.0) + (a - 1400.0)).abs() < 1e-9);
    }

    #[test]
    fn test_goal_difference_multiplier() {
        let (narrow, _) = update_ratings(1400.0, 1400.0, 1, 0);
        let (two_goal, _) = update_ratings(1400.0, 1400.0, 2, 0);
        let (rout, _) = update_ratings(1400.0, 1400.0, 5, 0);
        assert!(two_goal > narrow);
        assert!(rout > two_goal);
    }

    #[test]
    fn test_home_bonus_dampens_expected_home_win() {
        // A home win by the favourite moves ratings less than an away win
        // by the same favourite, because the +100 bonus raises expectation.
        let (home_fav, _) = update_ratings(1500.0, 1400.0, 1, 0);
        let (_, away_fav) = update_ratings(1400.0, 1500.0, 0, 1);
        assert!((home_fav - 1500.0) < (away_fav - 1500.0));
    }

    fn finished(home_id: &str, away_id: &str, home: i32, away: i32) -> MatchRecord {
        MatchRecord {
            id: format!("t_{}_{}", home_id, away_id),
            home_team_id: home_id.to_string(),
            away_team_id: away_id.to_string(),
            home_team_name: home_id.to_string(),
            away_team_name: away_id.to_string(),
            league: "PL".to_string(),
            match_date: Utc::now(),
            status: "finished".to_string(),
            home_score: Some(home),
            away_score: Some(away),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_result_for_perspective() {
        let m = finished("a", "b", 3, 1);
        assert_eq!(result_for(&m, "a"), 'W');
        assert_eq!(result_for(&m, "b"), 'L');
        let d = finished("a", "b", 1, 1);
        assert_eq!(result_for(&d, "a"), 'D');
    }
}

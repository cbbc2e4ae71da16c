use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::services::normalizer::Parameter;
use crate::services::odds::{MatchOdds, OutcomeProbabilities};
use crate::services::strength::TeamStrength;

/// Season the collector writes metrics for when none is given.
pub const CURRENT_SEASON: &str = "2025-26";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub league: String, // competition code, e.g. "PL", "PD"
    pub crest_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRecord {
    pub id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_team_name: String,
    pub away_team_name: String,
    pub league: String,
    pub match_date: DateTime<Utc>,
    pub status: String, // "scheduled", "live", "finished"
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted scoring run for one team under one profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthRecord {
    pub id: String,
    pub team_id: String,
    pub season: String,
    pub profile: String,
    pub score: f64,
    pub completion: f64,
    pub created_at: DateTime<Utc>,
}

/// API payload for a single team's strength.
#[derive(Debug, Clone, Serialize)]
pub struct TeamStrengthView {
    pub team: Team,
    pub season: String,
    pub profile: String,
    pub score: f64,
    pub completion_percent: f64,
    pub missing_parameters: Vec<Parameter>,
}

impl TeamStrengthView {
    pub fn new(team: Team, season: &str, profile: &str, strength: &TeamStrength) -> Self {
        Self {
            team,
            season: season.to_string(),
            profile: profile.to_string(),
            score: strength.display_score(),
            completion_percent: strength.completion_percent(),
            missing_parameters: strength.missing.clone(),
        }
    }
}

/// API payload for a two-team comparison.
#[derive(Debug, Clone, Serialize)]
pub struct MatchComparison {
    pub home: TeamStrengthView,
    pub away: TeamStrengthView,
    pub same_league: bool,
    pub probabilities: OutcomeProbabilities,
    pub odds: MatchOdds,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

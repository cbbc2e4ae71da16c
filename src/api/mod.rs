use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::db::{create_pool, get_all_teams, get_team_by_id, get_team_metrics};
use crate::models::{ApiResponse, MatchComparison, Team, TeamStrengthView, CURRENT_SEASON};
use crate::services::odds::{match_probabilities, DEFAULT_MARGIN};
use crate::services::strength::aggregate;
use crate::services::ScoringProfile;

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let pool = create_pool().await?;
    crate::db::init_database_with_pool(&pool).await?;
    crate::db::seed_data(&pool).await?;

    let app = create_router().with_state(pool);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("pitchrank API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<SqlitePool> {
    Router::new()
        .route("/health", get(health_check))
        .route("/teams", get(get_teams_handler))
        .route("/teams/{id}/strength", get(get_team_strength_handler))
        .route("/compare/{home_id}/{away_id}", get(compare_handler))
        .route("/rankings", get(get_rankings_handler))
        .route("/rankings/export", post(export_rankings_handler))
        .nest_service("/downloads", ServeDir::new(EXPORTS_DIR))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("pitchrank API is running"))
}

#[derive(Deserialize)]
struct ScoringQuery {
    profile: Option<String>,
    season: Option<String>,
}

impl ScoringQuery {
    fn resolve(&self) -> Result<(ScoringProfile, String), String> {
        let name = self.profile.as_deref().unwrap_or("full");
        let profile = ScoringProfile::by_name(name)
            .ok_or_else(|| format!("Unknown profile '{}' (known: {:?})", name, ScoringProfile::NAMES))?;
        let season = self.season.clone().unwrap_or_else(|| CURRENT_SEASON.to_string());
        Ok((profile, season))
    }
}

// GET /teams - All stored teams
async fn get_teams_handler(
    State(pool): State<SqlitePool>,
) -> Result<Json<ApiResponse<Vec<Team>>>, StatusCode> {
    match get_all_teams(&pool).await {
        Ok(teams) => Ok(Json(ApiResponse::success(teams))),
        Err(e) => {
            tracing::error!("Failed to fetch teams: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// GET /teams/{id}/strength - Aggregate strength for one team
async fn get_team_strength_handler(
    State(pool): State<SqlitePool>,
    Path(team_id): Path<String>,
    Query(params): Query<ScoringQuery>,
) -> Result<Json<ApiResponse<TeamStrengthView>>, StatusCode> {
    let (profile, season) = match params.resolve() {
        Ok(r) => r,
        Err(msg) => return Ok(Json(ApiResponse::error(msg))),
    };

    let team = match get_team_by_id(&pool, &team_id).await {
        Ok(Some(team)) => team,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to fetch team {}: {}", team_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let metrics = match get_team_metrics(&pool, &team_id, &season).await {
        Ok(metrics) => metrics,
        Err(e) => {
            tracing::error!("Failed to fetch metrics for {}: {}", team_id, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match aggregate(&metrics, &profile) {
        Some(strength) => Ok(Json(ApiResponse::success(TeamStrengthView::new(
            team,
            &season,
            profile.name(),
            &strength,
        )))),
        None => Ok(Json(ApiResponse::error(format!(
            "No usable metrics for team '{}' in season {} under profile '{}'",
            team.name,
            season,
            profile.name()
        )))),
    }
}

#[derive(Deserialize)]
struct CompareQuery {
    profile: Option<String>,
    season: Option<String>,
    margin: Option<f64>,
}

// GET /compare/{home_id}/{away_id} - Outcome probabilities and odds
async fn compare_handler(
    State(pool): State<SqlitePool>,
    Path((home_id, away_id)): Path<(String, String)>,
    Query(params): Query<CompareQuery>,
) -> Result<Json<ApiResponse<MatchComparison>>, StatusCode> {
    let scoring = ScoringQuery {
        profile: params.profile.clone(),
        season: params.season.clone(),
    };
    let (profile, season) = match scoring.resolve() {
        Ok(r) => r,
        Err(msg) => return Ok(Json(ApiResponse::error(msg))),
    };

    let (home, away) = match (
        get_team_by_id(&pool, &home_id).await,
        get_team_by_id(&pool, &away_id).await,
    ) {
        (Ok(Some(home)), Ok(Some(away))) => (home, away),
        (Ok(None), _) | (_, Ok(None)) => return Err(StatusCode::NOT_FOUND),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Failed to fetch teams for comparison: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let comparison = match build_comparison(&pool, home, away, &profile, &season, params.margin).await
    {
        Ok(Ok(comparison)) => comparison,
        Ok(Err(msg)) => return Ok(Json(ApiResponse::error(msg))),
        Err(e) => {
            tracing::error!("Failed to build comparison: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(ApiResponse::success(comparison)))
}

/// Inner error = a well-formed "can't score this pairing" message for the
/// response envelope; outer error = infrastructure failure.
async fn build_comparison(
    pool: &SqlitePool,
    home: Team,
    away: Team,
    profile: &ScoringProfile,
    season: &str,
    margin: Option<f64>,
) -> anyhow::Result<Result<MatchComparison, String>> {
    let home_metrics = get_team_metrics(pool, &home.id, season).await?;
    let away_metrics = get_team_metrics(pool, &away.id, season).await?;

    let home_strength = match aggregate(&home_metrics, profile) {
        Some(s) => s,
        None => return Ok(Err(format!("No usable metrics for team '{}'", home.name))),
    };
    let away_strength = match aggregate(&away_metrics, profile) {
        Some(s) => s,
        None => return Ok(Err(format!("No usable metrics for team '{}'", away.name))),
    };

    let same_league = home.league == away.league;
    let probabilities =
        match_probabilities(home_strength.score, away_strength.score, same_league);
    let odds = probabilities.decimal_odds(margin.unwrap_or(DEFAULT_MARGIN));

    Ok(Ok(MatchComparison {
        home: TeamStrengthView::new(home, season, profile.name(), &home_strength),
        away: TeamStrengthView::new(away, season, profile.name(), &away_strength),
        same_league,
        probabilities,
        odds,
    }))
}

// GET /rankings - All scoreable teams ordered by strength
async fn get_rankings_handler(
    State(pool): State<SqlitePool>,
    Query(params): Query<ScoringQuery>,
) -> Result<Json<ApiResponse<Vec<TeamStrengthView>>>, StatusCode> {
    let (profile, season) = match params.resolve() {
        Ok(r) => r,
        Err(msg) => return Ok(Json(ApiResponse::error(msg))),
    };

    match compute_rankings(&pool, &profile, &season).await {
        Ok(rankings) => Ok(Json(ApiResponse::success(rankings))),
        Err(e) => {
            tracing::error!("Failed to compute rankings: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn compute_rankings(
    pool: &SqlitePool,
    profile: &ScoringProfile,
    season: &str,
) -> anyhow::Result<Vec<TeamStrengthView>> {
    let teams = get_all_teams(pool).await?;
    let mut scored = Vec::new();

    for team in teams {
        let metrics = get_team_metrics(pool, &team.id, season).await?;
        // Teams with no usable data are left out of the table, not shown as 0.
        if let Some(strength) = aggregate(&metrics, profile) {
            scored.push((strength.score, TeamStrengthView::new(team, season, profile.name(), &strength)));
        }
    }

    // Sort on full precision, not the rounded display score.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    Ok(scored.into_iter().map(|(_, view)| view).collect())
}

// POST /rankings/export - Write rankings to the exports directory

/// Export files land here; the `/downloads` route serves the same directory.
const EXPORTS_DIR: &str = "data/exports";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    fn parse(format: Option<&str>) -> Result<Self, String> {
        match format.unwrap_or("csv") {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("Unsupported format '{}' (use 'csv' or 'json')", other)),
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Deserialize)]
struct ExportRequest {
    profile: Option<String>,
    season: Option<String>,
    format: Option<String>,
}

#[derive(Serialize)]
struct ExportResponse {
    download_url: String,
    format: String,
    rows: usize,
    generated_at: chrono::DateTime<chrono::Utc>,
}

async fn export_rankings_handler(
    State(pool): State<SqlitePool>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ApiResponse<ExportResponse>>, StatusCode> {
    let scoring = ScoringQuery {
        profile: request.profile,
        season: request.season,
    };
    let (profile, season) = match scoring.resolve() {
        Ok(r) => r,
        Err(msg) => return Ok(Json(ApiResponse::error(msg))),
    };
    let format = match ExportFormat::parse(request.format.as_deref()) {
        Ok(f) => f,
        Err(msg) => return Ok(Json(ApiResponse::error(msg))),
    };

    match export_rankings(&pool, &profile, &season, format).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(e) => {
            tracing::error!("Failed to export rankings: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn export_filename(profile: &ScoringProfile, season: &str, format: ExportFormat) -> String {
    format!(
        "rankings_{}_{}_{}.{}",
        profile.name(),
        season,
        chrono::Utc::now().timestamp(),
        format.extension()
    )
}

/// Serialize the ranked views to the requested on-disk representation.
fn render_rankings(rankings: &[TeamStrengthView], format: ExportFormat) -> anyhow::Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record([
                "rank",
                "team_id",
                "team",
                "league",
                "score",
                "completion_percent",
                "missing_parameters",
            ])?;

            for (i, view) in rankings.iter().enumerate() {
                let missing: Vec<&str> =
                    view.missing_parameters.iter().map(|p| p.as_str()).collect();
                writer.write_record([
                    (i + 1).to_string(),
                    view.team.id.clone(),
                    view.team.name.clone(),
                    view.team.league.clone(),
                    format!("{:.3}", view.score),
                    format!("{:.1}", view.completion_percent),
                    missing.join("|"),
                ])?;
            }

            writer
                .into_inner()
                .map_err(|e| anyhow::anyhow!("CSV flush failed: {}", e))
        }
        ExportFormat::Json => Ok(serde_json::to_string_pretty(rankings)?.into_bytes()),
    }
}

async fn export_rankings(
    pool: &SqlitePool,
    profile: &ScoringProfile,
    season: &str,
    format: ExportFormat,
) -> anyhow::Result<ExportResponse> {
    let rankings = compute_rankings(pool, profile, season).await?;
    let body = render_rankings(&rankings, format)?;

    let filename = export_filename(profile, season, format);
    tokio::fs::create_dir_all(EXPORTS_DIR).await?;
    tokio::fs::write(format!("{}/{}", EXPORTS_DIR, filename), body).await?;

    Ok(ExportResponse {
        download_url: format!("/downloads/{}", filename),
        format: format.extension().to_string(),
        rows: rankings.len(),
        generated_at: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::Parameter;
    use crate::services::strength::TeamStrength;
    use chrono::Utc;

    fn sample_views() -> Vec<TeamStrengthView> {
        let team = Team {
            id: "pl_1".to_string(),
            name: "Riverton City".to_string(),
            league: "PL".to_string(),
            crest_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let strength = TeamStrength {
            score: 0.3211,
            completion: 0.7,
            missing: vec![Parameter::SquadValueScore],
        };
        vec![TeamStrengthView::new(team, "2025-26", "core", &strength)]
    }

    #[test]
    fn test_render_rankings_csv() {
        let bytes = render_rankings(&sample_views(), ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "rank,team_id,team,league,score,completion_percent,missing_parameters"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,pl_1,Riverton City,PL,0.321,70.0"));
        assert!(row.contains("squad_value_score"));
    }

    #[test]
    fn test_render_rankings_json() {
        let bytes = render_rankings(&sample_views(), ExportFormat::Json).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        // Pretty-printed, and round-trips as structured data.
        assert!(text.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["team"]["name"], "Riverton City");
        assert_eq!(rows[0]["profile"], "core");
        assert_eq!(rows[0]["missing_parameters"][0], "squad_value_score");
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("json")).unwrap(), ExportFormat::Json);
        assert!(ExportFormat::parse(Some("xlsx")).is_err());
    }

    #[test]
    fn test_export_filename_is_route_safe() {
        // Filenames are joined onto /downloads/, which serves EXPORTS_DIR;
        // they must stay a single path segment with the right extension.
        for format in [ExportFormat::Csv, ExportFormat::Json] {
            let name = export_filename(&ScoringProfile::core(), "2025-26", format);
            assert!(!name.contains('/'));
            assert!(name.starts_with("rankings_core_2025-26_"));
            assert!(name.ends_with(&format!(".{}", format.extension())));
        }
    }
}


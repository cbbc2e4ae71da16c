use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::{insert_team, upsert_metric};
use crate::models::{Team, CURRENT_SEASON};
use crate::services::normalizer::Parameter;

/// Seed a handful of demo teams with metric rows so the API and CLI have
/// something to score before any live collection has run. No-op when the
/// teams table already has data.
pub async fn seed_data(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        tracing::debug!("Seed skipped — {} teams already present", count);
        return Ok(());
    }

    // (id, name, league, metrics). Coverage varies on purpose: complete,
    // partial, and one team with nothing collected at all.
    let teams: Vec<(&str, &str, &str, Vec<(Parameter, f64)>)> = vec![
        (
            "demo_1",
            "Riverton City",
            "PL",
            vec![
                (Parameter::EloScore, 1780.0),
                (Parameter::SquadValueScore, 0.92),
                (Parameter::FormScore, 2.4),
                (Parameter::SquadDepthScore, 6.5),
                (Parameter::OffensiveRating, 0.88),
                (Parameter::DefensiveRating, 0.81),
                (Parameter::HomeAdvantage, 0.74),
                (Parameter::MotivationFactor, 0.70),
                (Parameter::TacticalMatchup, 0.65),
                (Parameter::FatigueFactor, 0.55),
                (Parameter::KeyPlayerAvailability, 0.90),
            ],
        ),
        (
            "demo_2",
            "Harbour Athletic",
            "PL",
            vec![
                (Parameter::EloScore, 1545.0),
                (Parameter::SquadValueScore, 0.48),
                (Parameter::FormScore, 1.6),
                (Parameter::SquadDepthScore, 4.8),
            ],
        ),
        (
            "demo_3",
            "Northgate United",
            "PL",
            vec![
                (Parameter::EloScore, 1410.0),
                (Parameter::FormScore, 0.8),
            ],
        ),
        (
            "demo_4",
            "Real Costa Verde",
            "PD",
            vec![
                (Parameter::EloScore, 1690.0),
                (Parameter::SquadValueScore, 0.77),
                (Parameter::FormScore, 2.0),
                (Parameter::SquadDepthScore, 5.6),
                (Parameter::OffensiveRating, 0.79),
                (Parameter::DefensiveRating, 0.72),
            ],
        ),
        // Freshly promoted side nothing has been collected for yet: scoring
        // must report "no data" for this one, never a fabricated 0.0.
        ("demo_5", "Oldfield Rovers", "PD", vec![]),
    ];

    for (id, name, league, metrics) in teams {
        insert_team(
            pool,
            &Team {
                id: id.to_string(),
                name: name.to_string(),
                league: league.to_string(),
                crest_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        )
        .await?;

        for (parameter, value) in metrics {
            upsert_metric(pool, id, CURRENT_SEASON, parameter, value).await?;
        }
    }

    tracing::info!("Seeded demo teams and metrics");
    Ok(())
}

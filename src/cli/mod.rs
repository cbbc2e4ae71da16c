use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{
    create_pool, find_teams_by_name, get_all_teams, get_team_metrics, insert_strength_record,
};
use crate::models::{StrengthRecord, Team};
use crate::services::normalizer::Parameter;
use crate::services::odds::{match_probabilities, DEFAULT_MARGIN};
use crate::services::strength::aggregate;
use crate::services::{Collector, ScoringProfile};

pub async fn collect(league: &str, season: &str) -> Result<()> {
    let pool = create_pool().await?;
    let collector = Collector::new();

    if !collector.has_api_key() {
        println!("❌ FOOTBALL_DATA_API_KEY not set — cannot collect live data");
        return Ok(());
    }

    println!("📥 Collecting {} data for season {}...", league, season);
    collector.collect_league(&pool, league, season).await?;
    println!("✅ {} collection complete!", league);

    Ok(())
}

pub async fn score(profile_name: &str, season: &str) -> Result<()> {
    let pool = create_pool().await?;
    let profile = ScoringProfile::by_name(profile_name)
        .ok_or_else(|| anyhow!("Unknown profile '{}' (known: {:?})", profile_name, ScoringProfile::NAMES))?;

    println!(
        "🧮 Scoring all teams — profile '{}', season {}...\n",
        profile.name(),
        season
    );

    let teams = get_all_teams(&pool).await?;
    if teams.is_empty() {
        println!("📭 No teams found. Try collecting data first: pitchrank collect --league PL");
        return Ok(());
    }

    let mut scored: Vec<(f64, f64, Team, Vec<Parameter>)> = Vec::new();
    let mut skipped = 0usize;

    for team in teams {
        let metrics = get_team_metrics(&pool, &team.id, season).await?;
        match aggregate(&metrics, &profile) {
            Some(strength) => {
                insert_strength_record(
                    &pool,
                    &StrengthRecord {
                        id: Uuid::new_v4().to_string(),
                        team_id: team.id.clone(),
                        season: season.to_string(),
                        profile: profile.name().to_string(),
                        score: strength.score,
                        completion: strength.completion,
                        created_at: Utc::now(),
                    },
                )
                .await?;
                scored.push((strength.score, strength.completion, team, strength.missing));
            }
            None => skipped += 1,
        }
    }

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    println!("🏆 Rankings ({} profile):", profile.name());
    for (i, (score, completion, team, missing)) in scored.iter().enumerate() {
        let coverage = if missing.is_empty() {
            String::new()
        } else {
            format!(" [{:.0}% data]", completion * 100.0)
        };
        println!(
            "{:>3}. {:<30} {:.3}{}",
            i + 1,
            team.name,
            crate::utils::round3(*score),
            coverage
        );
    }

    if skipped > 0 {
        println!("\n⚠️  {} team(s) skipped — no usable metrics for this profile", skipped);
    }

    println!("\n✅ Scored {} teams", scored.len());
    Ok(())
}

pub async fn compare(
    home_name: &str,
    away_name: &str,
    profile_name: &str,
    season: &str,
    margin: Option<f64>,
) -> Result<()> {
    let pool = create_pool().await?;
    let profile = ScoringProfile::by_name(profile_name)
        .ok_or_else(|| anyhow!("Unknown profile '{}' (known: {:?})", profile_name, ScoringProfile::NAMES))?;

    let home = match resolve_team(&pool, home_name).await? {
        Some(team) => team,
        None => return Ok(()),
    };
    let away = match resolve_team(&pool, away_name).await? {
        Some(team) => team,
        None => return Ok(()),
    };

    let home_metrics = get_team_metrics(&pool, &home.id, season).await?;
    let away_metrics = get_team_metrics(&pool, &away.id, season).await?;

    let home_strength = match aggregate(&home_metrics, &profile) {
        Some(s) => s,
        None => {
            println!("❌ No usable metrics for '{}' in season {}", home.name, season);
            return Ok(());
        }
    };
    let away_strength = match aggregate(&away_metrics, &profile) {
        Some(s) => s,
        None => {
            println!("❌ No usable metrics for '{}' in season {}", away.name, season);
            return Ok(());
        }
    };

    let same_league = home.league == away.league;
    let probs = match_probabilities(home_strength.score, away_strength.score, same_league);
    let odds = probs.decimal_odds(margin.unwrap_or(DEFAULT_MARGIN));

    println!("⚽ {} (home) vs {} (away)", home.name, away.name);
    println!(
        "   Profile: {} | Season: {} | Same league: {}\n",
        profile.name(),
        season,
        if same_league { "yes" } else { "no" }
    );
    println!(
        "   Strength: {:.3} ({:.0}% data) vs {:.3} ({:.0}% data)",
        home_strength.display_score(),
        home_strength.completion_percent(),
        away_strength.display_score(),
        away_strength.completion_percent()
    );
    println!(
        "   Probabilities: Home {:.1}% | Draw {:.1}% | Away {:.1}%",
        probs.home_win * 100.0,
        probs.draw * 100.0,
        probs.away_win * 100.0
    );
    println!(
        "   Decimal odds:  Home {:.2} | Draw {:.2} | Away {:.2}",
        odds.home, odds.draw, odds.away
    );

    Ok(())
}

pub async fn query_team(team_name: &str) -> Result<()> {
    let pool = create_pool().await?;

    println!("🔍 Searching for team: {}", team_name);

    let team = match resolve_team(&pool, team_name).await? {
        Some(team) => team,
        None => return Ok(()),
    };

    println!("\n📊 Team Details:");
    println!("   Name: {}", team.name);
    println!("   League: {}", team.league);
    println!("   Last Updated: {}", team.updated_at.format("%Y-%m-%d %H:%M:%S"));

    let season = crate::models::CURRENT_SEASON;
    let metrics = get_team_metrics(&pool, &team.id, season).await?;

    println!("\n📈 Collected metrics ({}):", season);
    let mut any = false;
    for p in Parameter::ALL {
        if let Some(value) = metrics.get(p) {
            println!("   {:<26} {:.3}", p.as_str(), value);
            any = true;
        }
    }
    if !any {
        println!("   (none)");
    }

    for profile in [ScoringProfile::core(), ScoringProfile::full()] {
        match aggregate(&metrics, &profile) {
            Some(strength) => println!(
                "\n💪 Strength ({} profile): {:.3} — {:.0}% data coverage",
                profile.name(),
                strength.display_score(),
                strength.completion_percent()
            ),
            None => println!(
                "\n💪 Strength ({} profile): no usable metrics",
                profile.name()
            ),
        }
    }

    Ok(())
}

/// Substring lookup first; on no hit, rank every stored name with
/// Jaro-Winkler and show the closest few as suggestions.
async fn resolve_team(pool: &SqlitePool, name: &str) -> Result<Option<Team>> {
    let matches = find_teams_by_name(pool, name).await?;

    if let Some(team) = matches.into_iter().next() {
        return Ok(Some(team));
    }

    println!("❌ No teams found matching '{}'", name);

    let all_teams = get_all_teams(pool).await?;
    if all_teams.is_empty() {
        println!("💡 Database is empty. Try: pitchrank collect --league PL");
        return Ok(None);
    }

    let mut ranked: Vec<(f64, &Team)> = all_teams
        .iter()
        .map(|t| {
            (
                strsim::jaro_winkler(&t.name.to_lowercase(), &name.to_lowercase()),
                t,
            )
        })
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    println!("\n💡 Did you mean:");
    for (similarity, team) in ranked.iter().take(5) {
        if *similarity > 0.6 {
            println!("   • {} ({})", team.name, team.league);
        }
    }

    Ok(None)
}

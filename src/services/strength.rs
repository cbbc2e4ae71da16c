use serde::Serialize;

use crate::services::normalizer::{normalize, Parameter};
use crate::services::profiles::ScoringProfile;
use crate::utils::round3;

/// Raw metric values for one team and season. Any parameter may be absent
/// (not yet collected); the scoring core reads this and never mutates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamMetrics {
    values: [Option<f64>; Parameter::ALL.len()],
}

impl TeamMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, parameter: Parameter, value: f64) {
        self.values[parameter.index()] = Some(value);
    }

    pub fn with(mut self, parameter: Parameter, value: f64) -> Self {
        self.set(parameter, value);
        self
    }

    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        self.values[parameter.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Aggregated strength for one team under one profile.
#[derive(Debug, Clone, Serialize)]
pub struct TeamStrength {
    /// Full-precision score; use [`TeamStrength::display_score`] for output.
    pub score: f64,
    /// `available_weight / total_weight`, in [0, 1].
    pub completion: f64,
    /// Profile parameters the team had no value for.
    pub missing: Vec<Parameter>,
}

impl TeamStrength {
    /// Score rounded to 3 decimal places for display. Comparison logic
    /// should use the full-precision `score` field.
    pub fn display_score(&self) -> f64 {
        round3(self.score)
    }

    pub fn completion_percent(&self) -> f64 {
        self.completion * 100.0
    }
}

/// Combine a team's metrics into one strength score under `profile`.
///
/// Present parameters are normalized and weighted; the running total is then
/// rescaled by `total_weight / available_weight` so partial-data teams stay
/// on the same scale as complete-data teams. The rescale assumes missing
/// data is average-valued — a deliberate modeling choice kept for
/// compatibility with the historical scores.
///
/// Returns `None` when the team has no value for any profile parameter:
/// callers must treat that as "no data", not as a zero score.
pub fn aggregate(metrics: &TeamMetrics, profile: &ScoringProfile) -> Option<TeamStrength> {
    let mut running_total = 0.0;
    let mut available_weight = 0.0;
    let mut missing = Vec::new();

    for &(parameter, weight) in profile.weights() {
        match metrics.get(parameter) {
            Some(value) => {
                running_total += weight * normalize(value, parameter);
                available_weight += weight;
            }
            None => missing.push(parameter),
        }
    }

    if available_weight == 0.0 {
        return None;
    }

    let total_weight = profile.total_weight();
    Some(TeamStrength {
        score: running_total * (total_weight / available_weight),
        completion: available_weight / total_weight,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_core_metrics() -> TeamMetrics {
        TeamMetrics::new()
            .with(Parameter::EloScore, 1600.0)
            .with(Parameter::SquadValueScore, 0.75)
            .with(Parameter::FormScore, 1.8)
            .with(Parameter::SquadDepthScore, 5.0)
    }

    #[test]
    fn test_complete_data_is_plain_weighted_sum() {
        let profile = ScoringProfile::core();
        let strength = aggregate(&complete_core_metrics(), &profile).unwrap();

        let expected: f64 = profile
            .weights()
            .iter()
            .map(|&(p, w)| w * normalize(complete_core_metrics().get(p).unwrap(), p))
            .sum();

        assert!((strength.score - expected).abs() < 1e-12);
        assert!((strength.completion - 1.0).abs() < 1e-12);
        assert!(strength.missing.is_empty());
    }

    #[test]
    fn test_partial_data_rescale_is_proportional() {
        let profile = ScoringProfile::core();
        let full = aggregate(&complete_core_metrics(), &profile).unwrap();

        // Drop squad value (weight 0.12): remaining available weight 0.28.
        let partial_metrics = TeamMetrics::new()
            .with(Parameter::EloScore, 1600.0)
            .with(Parameter::FormScore, 1.8)
            .with(Parameter::SquadDepthScore, 5.0);
        let partial = aggregate(&partial_metrics, &profile).unwrap();

        let unscaled: f64 = [
            Parameter::EloScore,
            Parameter::FormScore,
            Parameter::SquadDepthScore,
        ]
        .iter()
        .map(|&p| {
            let w = profile
                .weights()
                .iter()
                .find(|(wp, _)| *wp == p)
                .map(|(_, w)| *w)
                .unwrap();
            w * normalize(partial_metrics.get(p).unwrap(), p)
        })
        .sum();

        let expected = unscaled * (profile.total_weight() / 0.28);
        assert!((partial.score - expected).abs() < 1e-12);
        assert!((partial.completion - 0.28 / 0.40).abs() < 1e-12);
        assert_eq!(partial.missing, vec![Parameter::SquadValueScore]);

        // The rescale keeps partial and full on a comparable scale.
        assert!(partial.score > 0.0 && full.score > 0.0);
    }

    #[test]
    fn test_all_missing_yields_sentinel() {
        let profile = ScoringProfile::full();
        assert!(aggregate(&TeamMetrics::new(), &profile).is_none());
    }

    #[test]
    fn test_metrics_outside_profile_do_not_count() {
        // A core-profile run ignores advanced parameters entirely.
        let metrics = TeamMetrics::new().with(Parameter::OffensiveRating, 0.9);
        assert!(aggregate(&metrics, &ScoringProfile::core()).is_none());
    }

    #[test]
    fn test_best_possible_score_equals_total_weight() {
        let profile = ScoringProfile::full();
        let mut metrics = TeamMetrics::new();
        metrics.set(Parameter::EloScore, 2000.0);
        metrics.set(Parameter::FormScore, 3.0);
        metrics.set(Parameter::SquadDepthScore, 7.0);
        for p in [
            Parameter::SquadValueScore,
            Parameter::OffensiveRating,
            Parameter::DefensiveRating,
            Parameter::HomeAdvantage,
            Parameter::MotivationFactor,
            Parameter::TacticalMatchup,
            Parameter::FatigueFactor,
            Parameter::KeyPlayerAvailability,
        ] {
            metrics.set(p, 1.0);
        }

        let strength = aggregate(&metrics, &profile).unwrap();
        assert!((strength.score - profile.total_weight()).abs() < 1e-9);
    }

    #[test]
    fn test_idempotent() {
        let profile = ScoringProfile::core();
        let metrics = complete_core_metrics();
        let a = aggregate(&metrics, &profile).unwrap();
        let b = aggregate(&metrics, &profile).unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.completion, b.completion);
        assert_eq!(a.missing, b.missing);
    }

    #[test]
    fn test_display_rounding() {
        let strength = TeamStrength {
            score: 0.123456,
            completion: 1.0,
            missing: vec![],
        };
        assert_eq!(strength.display_score(), 0.123);
    }
}

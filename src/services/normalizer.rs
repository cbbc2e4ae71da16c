use serde::{Deserialize, Serialize};

/// The closed set of team metrics the scoring engine understands.
///
/// Serialized as snake_case strings — the same names the collector writes
/// into the `team_metrics` table and the API exposes in payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    EloScore,
    SquadValueScore,
    FormScore,
    SquadDepthScore,
    OffensiveRating,
    DefensiveRating,
    HomeAdvantage,
    MotivationFactor,
    TacticalMatchup,
    FatigueFactor,
    KeyPlayerAvailability,
}

impl Parameter {
    pub const ALL: [Parameter; 11] = [
        Parameter::EloScore,
        Parameter::SquadValueScore,
        Parameter::FormScore,
        Parameter::SquadDepthScore,
        Parameter::OffensiveRating,
        Parameter::DefensiveRating,
        Parameter::HomeAdvantage,
        Parameter::MotivationFactor,
        Parameter::TacticalMatchup,
        Parameter::FatigueFactor,
        Parameter::KeyPlayerAvailability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::EloScore => "elo_score",
            Parameter::SquadValueScore => "squad_value_score",
            Parameter::FormScore => "form_score",
            Parameter::SquadDepthScore => "squad_depth_score",
            Parameter::OffensiveRating => "offensive_rating",
            Parameter::DefensiveRating => "defensive_rating",
            Parameter::HomeAdvantage => "home_advantage",
            Parameter::MotivationFactor => "motivation_factor",
            Parameter::TacticalMatchup => "tactical_matchup",
            Parameter::FatigueFactor => "fatigue_factor",
            Parameter::KeyPlayerAvailability => "key_player_availability",
        }
    }

    /// Parse a stored parameter name. Unknown names return None so stale
    /// rows in the metrics table are skipped rather than misread.
    pub fn from_name(name: &str) -> Option<Parameter> {
        Parameter::ALL.iter().copied().find(|p| p.as_str() == name)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Affine transform `(offset, scale)` that maps a raw metric onto [0, 1].
///
/// The pairs mirror the observed raw ranges of the upstream data:
/// ELO ~1200–2000, form is points-per-match (0–3), squad depth ~3–7.
/// Squad value and everything else arrives pre-normalized.
fn transform(parameter: Parameter) -> (f64, f64) {
    match parameter {
        Parameter::EloScore => (1200.0, 800.0),
        Parameter::FormScore => (0.0, 3.0),
        Parameter::SquadDepthScore => (3.0, 4.0),
        _ => (0.0, 1.0),
    }
}

/// Map a raw metric value onto the common [0, 1] scale.
///
/// `normalized = clamp((value - offset) / scale, 0, 1)`. Out-of-range
/// inputs clamp silently; this function never fails.
pub fn normalize(value: f64, parameter: Parameter) -> f64 {
    let (offset, scale) = transform(parameter);
    ((value - offset) / scale).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elo_endpoints() {
        assert_eq!(normalize(1200.0, Parameter::EloScore), 0.0);
        assert_eq!(normalize(2000.0, Parameter::EloScore), 1.0);
        assert!((normalize(1600.0, Parameter::EloScore) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_form_endpoints() {
        assert_eq!(normalize(0.0, Parameter::FormScore), 0.0);
        assert_eq!(normalize(3.0, Parameter::FormScore), 1.0);
        assert!((normalize(1.5, Parameter::FormScore) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_squad_depth_endpoints() {
        assert_eq!(normalize(3.0, Parameter::SquadDepthScore), 0.0);
        assert_eq!(normalize(7.0, Parameter::SquadDepthScore), 1.0);
    }

    #[test]
    fn test_out_of_range_clamps() {
        assert_eq!(normalize(900.0, Parameter::EloScore), 0.0);
        assert_eq!(normalize(2400.0, Parameter::EloScore), 1.0);
        assert_eq!(normalize(-1.0, Parameter::FormScore), 0.0);
        assert_eq!(normalize(5.0, Parameter::FormScore), 1.0);
    }

    #[test]
    fn test_default_transform_is_identity_with_clamp() {
        assert_eq!(normalize(0.7, Parameter::SquadValueScore), 0.7);
        assert_eq!(normalize(0.42, Parameter::OffensiveRating), 0.42);
        assert_eq!(normalize(1.6, Parameter::TacticalMatchup), 1.0);
        assert_eq!(normalize(-0.2, Parameter::FatigueFactor), 0.0);
    }

    #[test]
    fn test_idempotent() {
        let a = normalize(1534.0, Parameter::EloScore);
        let b = normalize(1534.0, Parameter::EloScore);
        assert_eq!(a, b);
    }

    #[test]
    fn test_name_round_trip() {
        for p in Parameter::ALL {
            assert_eq!(Parameter::from_name(p.as_str()), Some(p));
        }
        assert_eq!(Parameter::from_name("goals_per_game"), None);
    }
}

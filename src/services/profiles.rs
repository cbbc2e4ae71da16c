use crate::services::normalizer::Parameter;

/// A named, immutable weight table defining which parameters contribute to
/// the aggregate strength score and by how much.
///
/// Profiles are constructed values passed as arguments — never ambient
/// global state — so the active profile is always explicit. `total_weight`
/// is the documented constant for the profile and the achievable maximum
/// score for a team with complete data.
#[derive(Debug, Clone)]
pub struct ScoringProfile {
    name: &'static str,
    weights: Vec<(Parameter, f64)>,
    total_weight: f64,
}

impl ScoringProfile {
    /// Core 4-parameter profile. Total weight 0.40.
    pub fn core() -> Self {
        Self {
            name: "core",
            weights: vec![
                (Parameter::EloScore, 0.18),
                (Parameter::SquadValueScore, 0.12),
                (Parameter::FormScore, 0.06),
                (Parameter::SquadDepthScore, 0.04),
            ],
            total_weight: 0.40,
        }
    }

    /// Full 11-parameter profile. Total weight 1.00.
    pub fn full() -> Self {
        Self {
            name: "full",
            weights: vec![
                (Parameter::EloScore, 0.18),
                (Parameter::SquadValueScore, 0.12),
                (Parameter::FormScore, 0.06),
                (Parameter::SquadDepthScore, 0.04),
                (Parameter::OffensiveRating, 0.12),
                (Parameter::DefensiveRating, 0.12),
                (Parameter::HomeAdvantage, 0.08),
                (Parameter::MotivationFactor, 0.07),
                (Parameter::TacticalMatchup, 0.08),
                (Parameter::FatigueFactor, 0.05),
                (Parameter::KeyPlayerAvailability, 0.08),
            ],
            total_weight: 1.00,
        }
    }

    /// Off-season variant of `full`: motivation carries no signal between
    /// seasons, so its 0.07 is redistributed onto the stable squad-quality
    /// parameters. Total weight stays 1.00.
    pub fn offseason() -> Self {
        Self {
            name: "offseason",
            weights: vec![
                (Parameter::EloScore, 0.21),
                (Parameter::SquadValueScore, 0.14),
                (Parameter::FormScore, 0.06),
                (Parameter::SquadDepthScore, 0.06),
                (Parameter::OffensiveRating, 0.12),
                (Parameter::DefensiveRating, 0.12),
                (Parameter::HomeAdvantage, 0.08),
                (Parameter::TacticalMatchup, 0.08),
                (Parameter::FatigueFactor, 0.05),
                (Parameter::KeyPlayerAvailability, 0.08),
            ],
            total_weight: 1.00,
        }
    }

    /// Look up a profile by its wire name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "core" => Some(Self::core()),
            "full" => Some(Self::full()),
            "offseason" => Some(Self::offseason()),
            _ => None,
        }
    }

    pub const NAMES: [&'static str; 3] = ["core", "full", "offseason"];

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn weights(&self) -> &[(Parameter, f64)] {
        &self.weights
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_sum(profile: &ScoringProfile) -> f64 {
        profile.weights().iter().map(|(_, w)| w).sum()
    }

    #[test]
    fn test_weights_sum_to_documented_total() {
        for name in ScoringProfile::NAMES {
            let profile = ScoringProfile::by_name(name).unwrap();
            assert!(
                (weight_sum(&profile) - profile.total_weight()).abs() < 1e-9,
                "{} weights do not sum to {}",
                name,
                profile.total_weight()
            );
        }
    }

    #[test]
    fn test_weights_non_negative() {
        for name in ScoringProfile::NAMES {
            let profile = ScoringProfile::by_name(name).unwrap();
            assert!(profile.weights().iter().all(|(_, w)| *w >= 0.0));
        }
    }

    #[test]
    fn test_offseason_excludes_motivation() {
        let profile = ScoringProfile::offseason();
        assert!(profile
            .weights()
            .iter()
            .all(|(p, _)| *p != Parameter::MotivationFactor));
        assert_eq!(profile.total_weight(), 1.00);
    }

    #[test]
    fn test_unknown_profile_name() {
        assert!(ScoringProfile::by_name("phase2").is_none());
    }
}

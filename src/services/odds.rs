use serde::Serialize;

use crate::utils::round2;

/// Home-side boost when both teams play in the same league/competition.
const SAME_LEAGUE_ADVANTAGE: f64 = 0.05;
/// Smaller boost for cross-competition pairings.
const CROSS_LEAGUE_ADVANTAGE: f64 = 0.03;
/// No single outcome may fall below this probability.
pub const PROBABILITY_FLOOR: f64 = 0.05;
/// Default bookmaker margin applied when converting to decimal odds.
pub const DEFAULT_MARGIN: f64 = 1.05;

/// Win/draw/loss probabilities for one fixture. Always a valid simplex:
/// the three values sum to 1.0 and each lies in [0.05, 0.95].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutcomeProbabilities {
    pub home_win: f64,
    pub draw: f64,
    pub away_win: f64,
}

impl OutcomeProbabilities {
    /// Decimal betting odds: `round(margin / probability, 2)`.
    pub fn decimal_odds(&self, margin: f64) -> MatchOdds {
        MatchOdds {
            home: round2(margin / self.home_win),
            draw: round2(margin / self.draw),
            away: round2(margin / self.away_win),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MatchOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

/// Convert two strength scores into outcome probabilities.
///
/// Base probabilities are each side's share of combined strength (0.45/0.45
/// when both strengths are zero or negative), adjusted for home advantage
/// and a draw heuristic that rises as the two strengths converge. The final
/// floor step guarantees the simplex invariant for any finite inputs,
/// including wildly mismatched strengths.
pub fn match_probabilities(
    strength_home: f64,
    strength_away: f64,
    same_league: bool,
) -> OutcomeProbabilities {
    let total = strength_home + strength_away;
    let mut home_win = if total <= 0.0 {
        0.45
    } else {
        strength_home / total
    };

    let advantage = if same_league {
        SAME_LEAGUE_ADVANTAGE
    } else {
        CROSS_LEAGUE_ADVANTAGE
    };
    home_win = (home_win + advantage).min(0.95);

    // Closer-strength teams draw more often.
    let strength_diff = (strength_home - strength_away).abs();
    let normalized_diff = (strength_diff / 50.0).min(1.0);
    let mut draw = (0.33 - normalized_diff * 0.13).clamp(0.20, 0.33);

    let sum = home_win + draw;
    if sum > 1.0 {
        home_win /= sum;
        draw /= sum;
    }

    let mut away_win = 1.0 - home_win - draw;

    if away_win < PROBABILITY_FLOOR {
        // Rescue: pin away at the floor, split the remaining 0.95 between
        // home and draw in their existing ratio.
        away_win = PROBABILITY_FLOOR;
        let home_ratio = home_win / (home_win + draw);
        home_win = (1.0 - PROBABILITY_FLOOR) * home_ratio;
        draw = (1.0 - PROBABILITY_FLOOR) * (1.0 - home_ratio);
    } else if home_win < PROBABILITY_FLOOR {
        // Mirror rescue for a vastly outgunned home side.
        home_win = PROBABILITY_FLOOR;
        let away_ratio = away_win / (away_win + draw);
        away_win = (1.0 - PROBABILITY_FLOOR) * away_ratio;
        draw = (1.0 - PROBABILITY_FLOOR) * (1.0 - away_ratio);
    }

    OutcomeProbabilities {
        home_win,
        draw,
        away_win,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid_simplex(p: &OutcomeProbabilities) {
        let sum = p.home_win + p.draw + p.away_win;
        assert!((sum - 1.0).abs() < 1e-9, "sum {} != 1", sum);
        for v in [p.home_win, p.draw, p.away_win] {
            assert!((0.05..=0.95).contains(&v), "probability {} out of range", v);
        }
    }

    #[test]
    fn test_even_same_league_matchup() {
        let p = match_probabilities(100.0, 100.0, true);
        assert!((p.home_win - 0.55).abs() < 1e-9);
        assert!((p.draw - 0.33).abs() < 1e-9);
        assert!((p.away_win - 0.12).abs() < 1e-9);
        assert_valid_simplex(&p);
    }

    #[test]
    fn test_zero_strength_fallback() {
        // total <= 0 falls back to a 0.45/0.45 base, then the usual
        // advantage and draw steps run on top.
        let p = match_probabilities(0.0, 0.0, true);
        assert!((p.home_win - 0.50).abs() < 1e-9);
        assert!((p.draw - 0.33).abs() < 1e-9);
        assert!((p.away_win - 0.17).abs() < 1e-9);
        assert_valid_simplex(&p);

        let cross = match_probabilities(0.0, 0.0, false);
        assert!((cross.home_win - 0.48).abs() < 1e-9);
        assert_valid_simplex(&cross);
    }

    #[test]
    fn test_simplex_invariant_over_grid() {
        let strengths = [
            0.0, 0.001, 0.05, 0.12, 0.4, 1.0, 5.0, 25.0, 50.0, 100.0, 1000.0,
        ];
        for &home in &strengths {
            for &away in &strengths {
                for same_league in [true, false] {
                    let p = match_probabilities(home, away, same_league);
                    assert_valid_simplex(&p);
                }
            }
        }
    }

    #[test]
    fn test_draw_shrinks_with_strength_gap() {
        let close = match_probabilities(60.0, 55.0, true);
        let far = match_probabilities(120.0, 65.0, true);
        assert!(close.draw > far.draw);
        // Gap >= 50 pins the draw at its 0.20 floor.
        assert!((far.draw - 0.20).abs() < 1e-9);
    }

    #[test]
    fn test_swap_symmetry_of_draw() {
        // The draw heuristic depends only on |diff|; home advantage is the
        // deliberately asymmetric term.
        let a = match_probabilities(80.0, 30.0, true);
        let b = match_probabilities(30.0, 80.0, true);
        assert!((a.draw - b.draw).abs() < 1e-9);
        // With equal strengths the only asymmetry left is home advantage.
        let even = match_probabilities(40.0, 40.0, false);
        assert!(even.home_win > even.away_win);
    }

    #[test]
    fn test_away_floor_rescue_preserves_ratio() {
        // A dominant home side drives the residual away probability under
        // the floor; the remaining 0.95 splits home/draw in prior ratio.
        let p = match_probabilities(1000.0, 0.5, true);
        assert!((p.away_win - PROBABILITY_FLOOR).abs() < 1e-9);
        assert_valid_simplex(&p);
        assert!(p.home_win > p.draw);
    }

    #[test]
    fn test_home_floor_rescue() {
        let p = match_probabilities(0.0, 1000.0, false);
        assert!((p.home_win - PROBABILITY_FLOOR).abs() < 1e-9);
        assert_valid_simplex(&p);
        assert!(p.away_win > p.draw);
    }

    #[test]
    fn test_decimal_odds() {
        let p = match_probabilities(100.0, 100.0, true);
        let odds = p.decimal_odds(DEFAULT_MARGIN);
        assert!((odds.home - 1.91).abs() < 1e-9); // 1.05 / 0.55
        assert!((odds.draw - 3.18).abs() < 1e-9); // 1.05 / 0.33
        assert!((odds.away - 8.75).abs() < 1e-9); // 1.05 / 0.12
    }

    #[test]
    fn test_idempotent() {
        let a = match_probabilities(72.5, 41.0, true);
        let b = match_probabilities(72.5, 41.0, true);
        assert_eq!(a.home_win, b.home_win);
        assert_eq!(a.draw, b.draw);
        assert_eq!(a.away_win, b.away_win);
    }
}

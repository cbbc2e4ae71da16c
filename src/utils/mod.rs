/// Round to 2 decimal places (odds display).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 3 decimal places (strength display).
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Points-per-match over a form string like "WDLWW" (most recent first).
/// W = 3, D = 1, L = 0; unknown characters are ignored. Returns None for an
/// empty record so callers can keep the metric absent instead of writing 0.
pub fn form_points_per_match(form: &str) -> Option<f64> {
    let mut points = 0u32;
    let mut counted = 0u32;

    for result in form.chars() {
        match result {
            'W' => {
                points += 3;
                counted += 1;
            }
            'D' => {
                points += 1;
                counted += 1;
            }
            'L' => counted += 1,
            _ => {}
        }
    }

    if counted == 0 {
        None
    } else {
        Some(points as f64 / counted as f64)
    }
}

/// Map a squad headcount onto the raw 3–7 depth scale. An 18-player squad
/// is the observed minimum (3.0), 34+ the observed maximum (7.0).
pub fn squad_depth_from_size(squad_size: usize) -> f64 {
    let size = (squad_size as f64).clamp(18.0, 34.0);
    3.0 + (size - 18.0) / 16.0 * 4.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.909), 1.91);
        assert_eq!(round2(8.7549), 8.75);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.123456), 0.123);
        assert_eq!(round3(0.9995), 1.0);
    }

    #[test]
    fn test_form_points_per_match() {
        assert_eq!(form_points_per_match("WWWWW"), Some(3.0));
        assert_eq!(form_points_per_match("LLLLL"), Some(0.0));
        assert_eq!(form_points_per_match("WDLWW"), Some(2.0)); // 10 pts / 5
        assert_eq!(form_points_per_match(""), None);
        assert_eq!(form_points_per_match("??"), None);
    }

    #[test]
    fn test_squad_depth_from_size() {
        assert_eq!(squad_depth_from_size(18), 3.0);
        assert_eq!(squad_depth_from_size(34), 7.0);
        assert_eq!(squad_depth_from_size(40), 7.0);
        assert_eq!(squad_depth_from_size(10), 3.0);
        assert!((squad_depth_from_size(26) - 5.0).abs() < 1e-12);
    }
}

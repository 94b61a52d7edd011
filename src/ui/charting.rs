/// Compute X (seconds) and Y (score) bounds for the results chart
pub fn compute_chart_params(score_coords: &[(f64, f64)], duration_secs: u32) -> (f64, f64) {
    let mut highest_score = 0.0;
    for &(_, score) in score_coords {
        if score > highest_score {
            highest_score = score;
        }
    }

    let mut span = match score_coords.last() {
        Some(p) => p.0,
        None => duration_secs as f64,
    };
    if span < 1.0 {
        span = 1.0;
    }

    // A scoreless run still gets a visible axis
    (span, highest_score.max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[], 30);
        assert_eq!(x, 30.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_tracks_peak() {
        let coords = [(0.0, 0.0), (4.0, 3.0), (15.0, 9.0)];
        let (x, y) = compute_chart_params(&coords, 15);
        assert_eq!(x, 15.0);
        assert_eq!(y, 9.0);
    }

    #[test]
    fn test_compute_chart_params_floors_span() {
        let coords = [(0.0, 0.0), (0.0, 2.0)];
        let (x, _) = compute_chart_params(&coords, 15);
        assert_eq!(x, 1.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}

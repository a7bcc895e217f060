//! Scalar trend extrapolation and growth classification.

use serde::Serialize;

use crate::models::GrowthStatus;

pub const MAX_CGPA: f64 = 10.0;

const STRONG_GROWTH_THRESHOLD: f64 = 5.0;
const DECLINE_THRESHOLD: f64 = -5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GrowthAnalysis {
    pub growth_rate: f64,
    pub status: GrowthStatus,
}

/// Extrapolates the next value of `history` with a least-squares line over
/// the index positions, clamped to the CGPA scale.
pub fn predict_next(history: &[f64]) -> f64 {
    match history {
        [] => 0.0,
        [only] => *only,
        _ => {
            let n = history.len() as f64;
            let mean_x = (n - 1.0) / 2.0;
            let mean_y = history.iter().sum::<f64>() / n;

            let (mut sxy, mut sxx) = (0.0, 0.0);
            for (i, y) in history.iter().enumerate() {
                let dx = i as f64 - mean_x;
                sxy += dx * (y - mean_y);
                sxx += dx * dx;
            }

            let slope = sxy / sxx;
            let intercept = mean_y - slope * mean_x;
            round_to(
                (slope * n + intercept).clamp(0.0, MAX_CGPA),
                2,
            )
        }
    }
}

/// Percentage change from `previous` to `current`. A zero baseline yields a
/// stable zero rate rather than a division fault.
pub fn analyze_growth(current: f64, previous: f64) -> GrowthAnalysis {
    if previous == 0.0 {
        return GrowthAnalysis {
            growth_rate: 0.0,
            status: GrowthStatus::Stable,
        };
    }

    let growth_rate = (current - previous) / previous * 100.0;
    let status = if growth_rate > STRONG_GROWTH_THRESHOLD {
        GrowthStatus::StrongGrowth
    } else if growth_rate < DECLINE_THRESHOLD {
        GrowthStatus::Declining
    } else {
        GrowthStatus::Stable
    };

    GrowthAnalysis {
        growth_rate: round_to(growth_rate, 2),
        status,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CgpaForecast {
    pub predicted_next_cgpa: f64,
    pub growth_analysis: GrowthAnalysis,
}

/// Next-semester prediction with growth measured against the latest
/// recorded semester (a zero baseline when there is none).
pub fn forecast(history: &[f64]) -> CgpaForecast {
    let predicted_next_cgpa = predict_next(history);
    let previous = history.last().copied().unwrap_or(0.0);
    CgpaForecast {
        predicted_next_cgpa,
        growth_analysis: analyze_growth(predicted_next_cgpa, previous),
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Shortest decimal form, keeping one fractional digit on whole numbers
/// (`3.0`, `62.75`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_and_single_histories() {
        assert_eq!(predict_next(&[]), 0.0);
        assert_eq!(predict_next(&[7.25]), 7.25);
    }

    #[test]
    fn extrapolates_linear_history() {
        assert_eq!(predict_next(&[6.0, 6.5, 7.0]), 7.5);
        assert_eq!(predict_next(&[8.0, 8.0]), 8.0);
    }

    #[test]
    fn clamps_to_cgpa_scale() {
        assert_eq!(predict_next(&[8.0, 9.0, 10.0]), 10.0);
        assert_eq!(predict_next(&[2.0, 1.0, 0.2]), 0.0);
    }

    #[test]
    fn growth_with_zero_baseline_is_stable() {
        let analysis = analyze_growth(8.4, 0.0);
        assert_eq!(analysis.growth_rate, 0.0);
        assert_eq!(analysis.status, GrowthStatus::Stable);
    }

    #[test]
    fn growth_classification_thresholds() {
        assert_eq!(analyze_growth(8.0, 7.0).status, GrowthStatus::StrongGrowth);
        assert_eq!(analyze_growth(7.0, 8.0).status, GrowthStatus::Declining);
        assert_eq!(analyze_growth(7.2, 7.0).status, GrowthStatus::Stable);
        assert_eq!(analyze_growth(7.2, 7.0).growth_rate, 2.86);
    }

    #[test]
    fn forecast_measures_growth_from_latest_semester() {
        let result = forecast(&[6.0, 6.5, 7.0]);
        assert_eq!(result.predicted_next_cgpa, 7.5);
        assert_eq!(result.growth_analysis.growth_rate, 7.14);
        assert_eq!(result.growth_analysis.status, GrowthStatus::StrongGrowth);

        let empty = forecast(&[]);
        assert_eq!(empty.predicted_next_cgpa, 0.0);
        assert_eq!(empty.growth_analysis.status, GrowthStatus::Stable);
    }

    #[test]
    fn whole_numbers_keep_one_decimal() {
        assert_eq!(format_decimal(3.0), "3.0");
        assert_eq!(format_decimal(40.0), "40.0");
        assert_eq!(format_decimal(62.75), "62.75");
        assert_eq!(format_decimal(0.0), "0.0");
    }

    proptest! {
        #[test]
        fn prediction_stays_on_scale(history in prop::collection::vec(-50.0f64..50.0, 0..12)) {
            let next = predict_next(&history);
            if history.len() != 1 {
                prop_assert!((0.0..=MAX_CGPA).contains(&next));
            }
        }
    }
}

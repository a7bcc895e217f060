//! Institution-wide means, the composite DNA score and early-warning counts.

use crate::models::{
    EarlyWarningStats, InstitutionalStats, PlacementForecast, RiskLevel, StudentFeatureRecord,
    StudentRecord,
};
use crate::trend::round_to;

const DNA_CGPA_WEIGHT: f64 = 30.0;
const DNA_GROWTH_WEIGHT: f64 = 20.0;
const DNA_SKILL_WEIGHT: f64 = 20.0;
const DNA_READINESS_WEIGHT: f64 = 15.0;
const DNA_STABILITY_WEIGHT: f64 = 15.0;

/// Growth index that maps onto a full growth contribution.
const GROWTH_CEILING: f64 = 5.0;

const HIGH_RISK_DROPOUT_WEIGHT: f64 = 0.8;
const MEDIUM_RISK_DROPOUT_WEIGHT: f64 = 0.3;

/// Builds the feature table. Records carrying NaN or infinite numerics are
/// left out of every aggregate.
pub fn extract_features(students: &[StudentRecord]) -> Vec<StudentFeatureRecord> {
    students
        .iter()
        .filter(|student| match student.ensure_finite() {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "excluding student from aggregates");
                false
            }
        })
        .map(StudentFeatureRecord::from)
        .collect()
}

/// Unrounded population means over the feature table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureMeans {
    pub cgpa: f64,
    pub growth: f64,
    pub skill: f64,
    pub readiness: f64,
    /// Mean of the per-student risk indicator (1.0 / 0.5 / 0.1).
    pub risk_indicator: f64,
}

impl FeatureMeans {
    pub fn of(features: &[StudentFeatureRecord]) -> Self {
        if features.is_empty() {
            return FeatureMeans::default();
        }

        let n = features.len() as f64;
        let mut means = FeatureMeans::default();
        for feature in features {
            means.cgpa += feature.cgpa;
            means.growth += feature.growth;
            means.skill += feature.skill;
            means.readiness += feature.readiness;
            means.risk_indicator += feature.risk.indicator();
        }

        FeatureMeans {
            cgpa: means.cgpa / n,
            growth: means.growth / n,
            skill: means.skill / n,
            readiness: means.readiness / n,
            risk_indicator: means.risk_indicator / n,
        }
    }
}

/// Weighted blend of the means before any bounding. Skill and readiness are
/// on a 0-100 scale; the other inputs are normalised onto [0, 1].
pub fn raw_dna_score(means: &FeatureMeans) -> f64 {
    DNA_CGPA_WEIGHT * (means.cgpa / 10.0)
        + DNA_GROWTH_WEIGHT * (means.growth / GROWTH_CEILING)
        + DNA_SKILL_WEIGHT * (means.skill / 100.0)
        + DNA_READINESS_WEIGHT * (means.readiness / 100.0)
        + DNA_STABILITY_WEIGHT * (1.0 - means.risk_indicator)
}

/// DNA score bounded to [0, 100]. Out-of-range inputs (growth above the
/// ceiling, scores above 100) are reported before clamping.
pub fn dna_score(means: &FeatureMeans) -> f64 {
    let raw = raw_dna_score(means);
    if !(0.0..=100.0).contains(&raw) {
        tracing::warn!(raw_dna_score = raw, "dna score outside [0, 100], clamping");
    }
    raw.clamp(0.0, 100.0)
}

pub fn institutional_stats(features: &[StudentFeatureRecord], means: &FeatureMeans) -> InstitutionalStats {
    if features.is_empty() {
        return InstitutionalStats::default();
    }

    InstitutionalStats {
        total_students: features.len(),
        active_students: features.len(),
        placement_readiness_avg: round_to(means.readiness, 2),
        dna_score: round_to(dna_score(means), 2),
        risk_ratio: round_to(means.risk_indicator * 100.0, 2),
        avg_growth_index: round_to(means.growth, 2),
    }
}

pub fn early_warning(features: &[StudentFeatureRecord]) -> EarlyWarningStats {
    let total = features.len();
    let high = features.iter().filter(|f| f.risk == RiskLevel::High).count();
    let medium = features.iter().filter(|f| f.risk == RiskLevel::Medium).count();

    if total == 0 {
        return EarlyWarningStats::default();
    }

    let n = total as f64;
    EarlyWarningStats {
        high_risk_count: high,
        medium_risk_count: medium,
        low_risk_percent: round_to((total - high - medium) as f64 / n * 100.0, 2),
        dropout_probability_next_6m: round_to(
            (HIGH_RISK_DROPOUT_WEIGHT * high as f64 / n + MEDIUM_RISK_DROPOUT_WEIGHT * medium as f64 / n)
                * 100.0,
            2,
        ),
    }
}

pub fn placement_forecast(means: &FeatureMeans) -> PlacementForecast {
    PlacementForecast {
        forecast_placement_percent: round_to(means.readiness * 0.9 + 5.0, 2),
        core_vs_it_ratio: "45:55".to_string(),
        avg_career_readiness: round_to(means.readiness, 2),
        skill_gap_avg: round_to(100.0 - means.skill, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(cgpa: f64, growth: f64, skill: f64, readiness: f64, risk: RiskLevel) -> StudentFeatureRecord {
        StudentFeatureRecord {
            student_id: format!("s-{cgpa}"),
            department: "CSE".to_string(),
            cgpa,
            growth,
            skill,
            readiness,
            risk,
        }
    }

    fn sample() -> Vec<StudentFeatureRecord> {
        vec![
            feature(9.0, 4.0, 90.0, 85.0, RiskLevel::Low),
            feature(8.0, 3.0, 80.0, 80.0, RiskLevel::Low),
            feature(5.0, 1.0, 40.0, 50.0, RiskLevel::High),
            feature(6.0, 2.0, 50.0, 55.0, RiskLevel::Medium),
        ]
    }

    #[test]
    fn means_of_empty_table_are_zero() {
        let means = FeatureMeans::of(&[]);
        assert_eq!(means, FeatureMeans::default());
        assert_eq!(institutional_stats(&[], &means), InstitutionalStats::default());
        assert_eq!(early_warning(&[]), EarlyWarningStats::default());
    }

    #[test]
    fn non_finite_students_are_left_out() {
        let student = |id: &str, cgpa: f64| StudentRecord {
            id: id.to_string(),
            full_name: format!("Student {id}"),
            department: Some("CSE".to_string()),
            current_cgpa: cgpa,
            growth_index: 2.0,
            skill_score: 60.0,
            career_readiness: 60.0,
            risk_level: RiskLevel::Low,
            attendance_percent: 90.0,
            failed_subjects: 0,
            cgpa_history: vec![cgpa],
            skills: Vec::new(),
        };

        let features = extract_features(&[
            student("a", f64::NAN),
            student("b", 7.0),
            student("c", f64::INFINITY),
        ]);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].student_id, "b");
    }

    #[test]
    fn early_warning_counts() {
        let stats = early_warning(&sample());
        assert_eq!(stats.high_risk_count, 1);
        assert_eq!(stats.medium_risk_count, 1);
        assert_eq!(stats.low_risk_percent, 50.0);
        assert_eq!(stats.dropout_probability_next_6m, 27.5);
    }

    #[test]
    fn dna_score_blends_means() {
        let features = sample();
        let means = FeatureMeans::of(&features);
        assert!((means.cgpa - 7.0).abs() < 1e-9);
        assert!((means.risk_indicator - 0.425).abs() < 1e-9);

        // 21 + 10 + 13 + 10.125 + 8.625
        let stats = institutional_stats(&features, &means);
        assert_eq!(stats.dna_score, 62.75);
        assert_eq!(stats.risk_ratio, 42.5);
        assert_eq!(stats.avg_growth_index, 2.5);
    }

    #[test]
    fn dna_score_is_clamped_for_extreme_growth() {
        let features = vec![feature(10.0, 12.0, 100.0, 100.0, RiskLevel::Low)];
        let means = FeatureMeans::of(&features);
        assert!(raw_dna_score(&means) > 100.0);
        assert_eq!(dna_score(&means), 100.0);
    }

    #[test]
    fn perfect_inputs_reach_upper_bound() {
        let means = FeatureMeans {
            cgpa: 10.0,
            growth: 5.0,
            skill: 100.0,
            readiness: 100.0,
            risk_indicator: 0.0,
        };
        assert!((raw_dna_score(&means) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn placement_forecast_from_readiness() {
        let forecast = placement_forecast(&FeatureMeans::of(&sample()));
        assert_eq!(forecast.forecast_placement_percent, 65.75);
        assert_eq!(forecast.skill_gap_avg, 35.0);
    }
}

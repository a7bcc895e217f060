use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;
use crate::trend::round_to;

const HIGH_RISK_THRESHOLD: f64 = 0.6;
const MEDIUM_RISK_THRESHOLD: f64 = 0.3;
const FAILED_SUBJECT_CAP: u32 = 3;

/// Behavioural and academic signals feeding the risk heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RiskSignals {
    pub attendance_percent: f64,
    /// Change in CGPA between the two most recent semesters.
    pub cgpa_trend: f64,
    pub failed_subjects: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
}

/// Rule-based scorer. Stands in for a trained model and must stay available
/// as the baseline behind the same interface.
pub fn score(signals: &RiskSignals) -> RiskAssessment {
    let total = attendance_weight(signals.attendance_percent)
        + trend_weight(signals.cgpa_trend)
        + failure_weight(signals.failed_subjects);
    let risk_score = round_to(total.clamp(0.0, 1.0), 2);

    RiskAssessment {
        risk_score,
        risk_level: level_for(risk_score),
    }
}

pub fn attendance_weight(attendance_percent: f64) -> f64 {
    if attendance_percent < 75.0 {
        0.4
    } else if attendance_percent < 85.0 {
        0.2
    } else {
        0.0
    }
}

pub fn trend_weight(cgpa_trend: f64) -> f64 {
    if cgpa_trend < -0.5 {
        0.3
    } else if cgpa_trend < 0.0 {
        0.1
    } else {
        0.0
    }
}

pub fn failure_weight(failed_subjects: u32) -> f64 {
    match failed_subjects {
        0 => 0.0,
        n => 0.3 * f64::from(n.min(FAILED_SUBJECT_CAP)) / f64::from(FAILED_SUBJECT_CAP),
    }
}

pub fn level_for(risk_score: f64) -> RiskLevel {
    if risk_score > HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else if risk_score > MEDIUM_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Semester-over-semester CGPA change from a history, oldest first.
pub fn cgpa_trend(history: &[f64]) -> f64 {
    match history {
        [.., previous, last] => last - previous,
        _ => 0.0,
    }
}

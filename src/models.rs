use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Coarse student risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Numeric weight used when averaging risk across a population.
    pub fn indicator(&self) -> f64 {
        match self {
            RiskLevel::High => 1.0,
            RiskLevel::Medium => 0.5,
            RiskLevel::Low => 0.1,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(EngineError::InvalidRiskLevel(other.to_string())),
        }
    }
}

/// Source data for one student as held by the student repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub full_name: String,
    pub department: Option<String>,
    pub current_cgpa: f64,
    pub growth_index: f64,
    pub skill_score: f64,
    pub career_readiness: f64,
    pub risk_level: RiskLevel,
    pub attendance_percent: f64,
    pub failed_subjects: u32,
    /// Semester CGPAs, oldest first.
    pub cgpa_history: Vec<f64>,
    pub skills: Vec<String>,
}

impl StudentRecord {
    /// Rejects NaN or infinite numerics, naming the first offending field.
    pub fn ensure_finite(&self) -> Result<(), EngineError> {
        let scalars = [
            ("current_cgpa", self.current_cgpa),
            ("growth_index", self.growth_index),
            ("skill_score", self.skill_score),
            ("career_readiness", self.career_readiness),
            ("attendance_percent", self.attendance_percent),
        ];
        let history = self.cgpa_history.iter().map(|value| ("cgpa_history", *value));

        match scalars.into_iter().chain(history).find(|(_, value)| !value.is_finite()) {
            Some((field, _)) => Err(EngineError::NonFiniteValue {
                student_id: self.id.clone(),
                field,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffRecord {
    pub id: String,
    pub full_name: Option<String>,
    pub department: Option<String>,
    pub consistency_score: f64,
    pub feedback_rating: f64,
}

/// Per-student features consumed by the aggregate pipeline. Recomputed on
/// every report and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFeatureRecord {
    pub student_id: String,
    pub department: String,
    pub cgpa: f64,
    pub growth: f64,
    pub skill: f64,
    pub readiness: f64,
    pub risk: RiskLevel,
}

pub const UNASSIGNED_DEPARTMENT: &str = "Unassigned";

impl From<&StudentRecord> for StudentFeatureRecord {
    fn from(record: &StudentRecord) -> Self {
        StudentFeatureRecord {
            student_id: record.id.clone(),
            department: record
                .department
                .clone()
                .filter(|dept| !dept.trim().is_empty())
                .unwrap_or_else(|| UNASSIGNED_DEPARTMENT.to_string()),
            cgpa: record.current_cgpa,
            growth: record.growth_index,
            skill: record.skill_score,
            readiness: record.career_readiness,
            risk: record.risk_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerSuggestion {
    pub role: String,
    /// Rendered on the wire as `fit: "<n>% Match"`.
    #[serde(rename = "fit", with = "match_text")]
    pub fit_percent: i32,
    pub icon: String,
}

mod match_text {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    const SUFFIX: &str = "% Match";

    pub fn serialize<S: Serializer>(fit: &i32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{fit}{SUFFIX}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.trim()
            .strip_suffix(SUFFIX)
            .and_then(|number| number.trim().parse().ok())
            .ok_or_else(|| D::Error::custom(format!("expected \"<n>{SUFFIX}\", got {text:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RecommendedCourses {
    pub strong: Vec<String>,
    pub weak: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthStatus {
    #[serde(rename = "Strong Growth")]
    StrongGrowth,
    Stable,
    Declining,
}

impl GrowthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStatus::StrongGrowth => "Strong Growth",
            GrowthStatus::Stable => "Stable",
            GrowthStatus::Declining => "Declining",
        }
    }
}

impl fmt::Display for GrowthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GrowthStatus {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Strong Growth" => Ok(GrowthStatus::StrongGrowth),
            "Stable" => Ok(GrowthStatus::Stable),
            "Declining" => Ok(GrowthStatus::Declining),
            other => Err(EngineError::InvalidGrowthStatus(other.to_string())),
        }
    }
}

/// Predictive bundle kept per student.
///
/// Every field is optional so the store can tell "never populated" apart from
/// a real value. Merges only ever fill gaps; see [`InsightProfile::fill_missing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InsightProfile {
    pub student_id: String,
    pub risk_score: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub cgpa_prediction: Option<f64>,
    pub growth_status: Option<GrowthStatus>,
    pub skill_gap_percent: Option<f64>,
    pub missing_skills: Option<BTreeSet<String>>,
    #[serde(default)]
    pub career_suggestions: Vec<CareerSuggestion>,
    pub recommended_courses: Option<RecommendedCourses>,
    /// Baseline scores, written once when the profile is created.
    pub consistency_index: Option<f64>,
    pub skill_gap_score: Option<f64>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl InsightProfile {
    pub fn empty(student_id: &str) -> Self {
        InsightProfile {
            student_id: student_id.to_string(),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.risk_score.is_some()
            && self.risk_level.is_some()
            && self.cgpa_prediction.is_some()
            && self.growth_status.is_some()
            && self.skill_gap_percent.is_some()
            && self.missing_skills.is_some()
            && !self.career_suggestions.is_empty()
            && self.recommended_courses.is_some()
    }

    /// Copies every field of `patch` into `self` that is currently empty.
    /// Baseline scores are create-only and are never touched here.
    pub fn fill_missing(&mut self, patch: &InsightProfile) {
        fill(&mut self.risk_score, &patch.risk_score);
        fill(&mut self.risk_level, &patch.risk_level);
        fill(&mut self.cgpa_prediction, &patch.cgpa_prediction);
        fill(&mut self.growth_status, &patch.growth_status);
        fill(&mut self.skill_gap_percent, &patch.skill_gap_percent);
        fill(&mut self.missing_skills, &patch.missing_skills);
        fill(&mut self.recommended_courses, &patch.recommended_courses);
        if self.career_suggestions.is_empty() {
            self.career_suggestions = patch.career_suggestions.clone();
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
    if slot.is_none() {
        *slot = value.clone();
    }
}

/// Base student record with its insight profile laid over it.
#[derive(Debug, Clone, Serialize)]
pub struct StudentDetail {
    #[serde(flatten)]
    pub student: StudentRecord,
    pub insights: InsightProfile,
}

// ---- aggregate report wire types ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InstitutionalStats {
    pub total_students: usize,
    pub active_students: usize,
    pub placement_readiness_avg: f64,
    pub dna_score: f64,
    pub risk_ratio: f64,
    pub avg_growth_index: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EarlyWarningStats {
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_percent: f64,
    pub dropout_probability_next_6m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCluster {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
    pub description: String,
    pub rank: usize,
    /// (cgpa, growth, skill); absent for a cluster with no members.
    pub centroid: Option<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeptPerformanceRank {
    pub department: String,
    pub avg_cgpa: f64,
    pub avg_growth: f64,
    pub placement_readiness: f64,
    pub skill_score: f64,
    pub risk_percent: f64,
    pub overall_rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlacementForecast {
    pub forecast_placement_percent: f64,
    pub core_vs_it_ratio: String,
    pub avg_career_readiness: f64,
    pub skill_gap_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacultyImpactRank {
    pub name: String,
    pub dept: String,
    pub feedback_consistency: f64,
    pub improvement_impact: f64,
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResourceOptimization {
    pub faculty_load_percent: f64,
    pub lab_utilization_percent: f64,
    pub remedial_need_percent: f64,
    pub coaching_demand: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlanStrategy {
    pub label: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlanStep {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicActionPlan {
    pub executive_summary: String,
    pub roi_efficiency: String,
    pub strategies: Vec<ActionPlanStrategy>,
    pub resource_label: String,
    pub resource_value: String,
    pub roadmap: Vec<ActionPlanStep>,
    pub insight_quote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub institutional: InstitutionalStats,
    pub early_warning: EarlyWarningStats,
    pub performance_clusters: Vec<PerformanceCluster>,
    pub department_ranking: Vec<DeptPerformanceRank>,
    pub placement_forecast: PlacementForecast,
    pub faculty_impact: Vec<FacultyImpactRank>,
    pub resource_opt: ResourceOptimization,
    pub weekly_insight: String,
    pub action_plan: DynamicActionPlan,
}

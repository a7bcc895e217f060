use std::collections::HashMap;

use crate::models::{DeptPerformanceRank, RiskLevel, StudentFeatureRecord};
use crate::trend::round_to;

const CGPA_WEIGHT: f64 = 2.0;
const GROWTH_WEIGHT: f64 = 10.0;
const READINESS_WEIGHT: f64 = 1.0;
const TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Default, Clone)]
struct DepartmentTotals {
    students: usize,
    cgpa: f64,
    growth: f64,
    readiness: f64,
    skill: f64,
    high_risk: usize,
}

#[derive(Debug, Clone)]
struct DepartmentAverages {
    department: String,
    cgpa: f64,
    growth: f64,
    readiness: f64,
    skill: f64,
    risk_percent: f64,
}

impl DepartmentAverages {
    fn composite(&self) -> f64 {
        CGPA_WEIGHT * self.cgpa + GROWTH_WEIGHT * self.growth + READINESS_WEIGHT * self.readiness
    }
}

/// Ranks departments by a weighted composite of averaged cgpa, growth and
/// readiness. Equal composites share a dense rank; the output is best first,
/// with ties kept in order of first appearance.
pub fn rank_departments(features: &[StudentFeatureRecord]) -> Vec<DeptPerformanceRank> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<&str, DepartmentTotals> = HashMap::new();

    for feature in features {
        let entry = totals.entry(feature.department.as_str()).or_insert_with(|| {
            order.push(feature.department.clone());
            DepartmentTotals::default()
        });
        entry.students += 1;
        entry.cgpa += feature.cgpa;
        entry.growth += feature.growth;
        entry.readiness += feature.readiness;
        entry.skill += feature.skill;
        if feature.risk == RiskLevel::High {
            entry.high_risk += 1;
        }
    }

    let mut averages: Vec<DepartmentAverages> = order
        .into_iter()
        .filter_map(|department| {
            let t = totals.get(department.as_str())?;
            let n = t.students as f64;
            Some(DepartmentAverages {
                cgpa: t.cgpa / n,
                growth: t.growth / n,
                readiness: t.readiness / n,
                skill: t.skill / n,
                risk_percent: t.high_risk as f64 / n * 100.0,
                department,
            })
        })
        .collect();

    averages.sort_by(|a, b| b.composite().total_cmp(&a.composite()));

    let mut ranked = Vec::with_capacity(averages.len());
    let mut rank = 0usize;
    let mut previous: Option<f64> = None;
    for dept in averages {
        let composite = dept.composite();
        if previous.map_or(true, |p| (p - composite).abs() > TIE_EPSILON) {
            rank += 1;
        }
        previous = Some(composite);

        ranked.push(DeptPerformanceRank {
            avg_cgpa: round_to(dept.cgpa, 2),
            avg_growth: round_to(dept.growth, 2),
            placement_readiness: round_to(dept.readiness, 2),
            skill_score: round_to(dept.skill, 2),
            risk_percent: round_to(dept.risk_percent, 2),
            overall_rank: rank,
            department: dept.department,
        });
    }

    tracing::debug!(departments = ranked.len(), "department ranking complete");
    ranked
}

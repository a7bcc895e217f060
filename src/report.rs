use std::fmt::Write;

use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::action_plan;
use crate::aggregate::{self, FeatureMeans};
use crate::cluster;
use crate::error::Result;
use crate::insight;
use crate::models::{
    DashboardOverview, FacultyImpactRank, ResourceOptimization, StaffRecord, StudentRecord,
};
use crate::ranking;
use crate::store::{StaffDirectory, StudentRepository};
use crate::trend::round_to;

pub const FACULTY_SAMPLE_SIZE: usize = 5;
const COACHING_DEMAND: &str = "High for Mathematics and ML";
const REMEDIAL_MULTIPLIER: f64 = 1.5;

/// Builds the institution-wide report from a student snapshot and a staff
/// sample. An empty snapshot yields a neutral report.
pub fn build_overview(students: &[StudentRecord], staff: &[StaffRecord]) -> DashboardOverview {
    let features = aggregate::extract_features(students);
    let means = FeatureMeans::of(&features);
    let institutional = aggregate::institutional_stats(&features, &means);
    let early_warning = aggregate::early_warning(&features);

    let (performance_clusters, department_ranking) = if features.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        rayon::join(
            || cluster::performance_clusters(&features),
            || ranking::rank_departments(&features),
        )
    };

    let faculty_impact = if features.is_empty() {
        Vec::new()
    } else {
        staff.iter().map(faculty_impact).collect()
    };

    let resource_opt = if features.is_empty() {
        ResourceOptimization::default()
    } else {
        resource_optimization(
            features.len(),
            early_warning.dropout_probability_next_6m,
        )
    };

    let placement_forecast = if features.is_empty() {
        Default::default()
    } else {
        aggregate::placement_forecast(&means)
    };

    tracing::info!(
        students = features.len(),
        departments = department_ranking.len(),
        dna_score = institutional.dna_score,
        risk_ratio = institutional.risk_ratio,
        "overview built"
    );

    DashboardOverview {
        weekly_insight: action_plan::weekly_insight(&department_ranking),
        action_plan: action_plan::generate(&institutional),
        institutional,
        early_warning,
        performance_clusters,
        department_ranking,
        placement_forecast,
        faculty_impact,
        resource_opt,
    }
}

/// Fetches a snapshot from the collaborators and builds the report.
pub async fn generate_overview<R, D>(repo: &R, staff: &D) -> Result<DashboardOverview>
where
    R: StudentRepository + ?Sized,
    D: StaffDirectory + ?Sized,
{
    let students = repo.fetch_all().await?;
    let staff = staff.sample(FACULTY_SAMPLE_SIZE).await?;
    Ok(build_overview(&students, &staff))
}

pub fn faculty_impact(staff: &StaffRecord) -> FacultyImpactRank {
    let mut rng = insight::rng_for(&staff.id);
    FacultyImpactRank {
        name: staff.full_name.clone().unwrap_or_else(|| "Faculty".to_string()),
        dept: staff.department.clone().unwrap_or_default(),
        feedback_consistency: round_to(staff.consistency_score * 100.0, 2),
        improvement_impact: round_to(rng.gen_range(70.0..=95.0), 2),
        impact_score: round_to(
            staff.consistency_score * 40.0 + staff.feedback_rating * 12.0,
            2,
        ),
    }
}

fn resource_optimization(total_students: usize, dropout_probability: f64) -> ResourceOptimization {
    let mut rng = ChaCha8Rng::seed_from_u64(total_students as u64);
    ResourceOptimization {
        faculty_load_percent: round_to(rng.gen_range(65.0..=85.0), 2),
        lab_utilization_percent: round_to(rng.gen_range(70.0..=90.0), 2),
        remedial_need_percent: round_to(dropout_probability * REMEDIAL_MULTIPLIER, 2),
        coaching_demand: COACHING_DEMAND.to_string(),
    }
}

pub fn render_markdown(overview: &DashboardOverview, generated_on: NaiveDate) -> String {
    let mut output = String::new();
    let stats = &overview.institutional;

    let _ = writeln!(output, "# Institutional Insight Report");
    let _ = writeln!(
        output,
        "Generated on {} for {} students",
        generated_on, stats.total_students
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Institutional Health");
    let _ = writeln!(output, "- DNA score: {:.2}", stats.dna_score);
    let _ = writeln!(output, "- Risk ratio: {:.2}%", stats.risk_ratio);
    let _ = writeln!(output, "- Average growth index: {:.2}", stats.avg_growth_index);
    let _ = writeln!(
        output,
        "- Placement readiness: {:.2}",
        stats.placement_readiness_avg
    );

    let warning = &overview.early_warning;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Early Warning");
    let _ = writeln!(
        output,
        "- {} high risk, {} medium risk ({:.2}% low risk)",
        warning.high_risk_count, warning.medium_risk_count, warning.low_risk_percent
    );
    let _ = writeln!(
        output,
        "- Dropout probability (next 6 months): {:.2}%",
        warning.dropout_probability_next_6m
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance Clusters");
    if overview.performance_clusters.is_empty() {
        let _ = writeln!(output, "No students to cluster.");
    } else {
        for cluster in &overview.performance_clusters {
            let _ = writeln!(
                output,
                "- {}: {} students ({:.2}%) - {}",
                cluster.name, cluster.count, cluster.percentage, cluster.description
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Department Ranking");
    if overview.department_ranking.is_empty() {
        let _ = writeln!(output, "No departments ranked.");
    } else {
        for dept in &overview.department_ranking {
            let _ = writeln!(
                output,
                "{}. {} (CGPA {:.2}, growth {:.2}, readiness {:.2}, {:.2}% high risk)",
                dept.overall_rank,
                dept.department,
                dept.avg_cgpa,
                dept.avg_growth,
                dept.placement_readiness,
                dept.risk_percent
            );
        }
    }

    let forecast = &overview.placement_forecast;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Placement Forecast");
    let _ = writeln!(
        output,
        "- Forecast placement: {:.2}% (core vs IT {})",
        forecast.forecast_placement_percent, forecast.core_vs_it_ratio
    );
    let _ = writeln!(output, "- Average skill gap: {:.2}", forecast.skill_gap_avg);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Faculty Impact");
    if overview.faculty_impact.is_empty() {
        let _ = writeln!(output, "No faculty sampled.");
    } else {
        for faculty in &overview.faculty_impact {
            let _ = writeln!(
                output,
                "- {} ({}) impact {:.2}, consistency {:.2}%",
                faculty.name, faculty.dept, faculty.impact_score, faculty.feedback_consistency
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Insight");
    let _ = writeln!(output, "{}", overview.weekly_insight);

    let plan = &overview.action_plan;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Action Plan: {}", plan.executive_summary);
    let _ = writeln!(
        output,
        "ROI efficiency {} | {}: {}",
        plan.roi_efficiency, plan.resource_label, plan.resource_value
    );
    for strategy in &plan.strategies {
        let _ = writeln!(output, "- **{}**: {}", strategy.label, strategy.detail);
    }
    for step in &plan.roadmap {
        let _ = writeln!(output, "- {}: {}", step.title, step.detail);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "> {}", plan.insight_quote);

    output
}

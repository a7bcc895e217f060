//! Narrative action plan derived from aggregate thresholds.
//!
//! Strategy selection is a table of named rules so each threshold and the
//! text it selects can be read, and tested, in one place.

use crate::models::{
    ActionPlanStep, ActionPlanStrategy, DeptPerformanceRank, DynamicActionPlan,
    InstitutionalStats,
};
use crate::trend::format_decimal;

pub const RISK_RATIO_THRESHOLD: f64 = 15.0;
pub const DNA_SCORE_THRESHOLD: f64 = 75.0;
const MAX_TARGETED_STUDENTS: usize = 50;
const RESOURCE_LAKHS_PER_STUDENT: f64 = 0.15;

const EXECUTIVE_SUMMARY: &str = "Closing the Skill Gap & Improving DNA Score";
const RESOURCE_LABEL: &str = "Digital Infrastructure";

#[derive(Debug, Clone, Copy)]
struct Strategy {
    label: &'static str,
    detail: &'static str,
}

const INTENSIVE_INTERVENTION: Strategy = Strategy {
    label: "Intensive Care Unit (ICU)",
    detail: "Daily 1:1 check-ins for students in the 'Critical Zone' cluster.",
};
const PROACTIVE_MENTORSHIP: Strategy = Strategy {
    label: "Proactive Mentorship",
    detail: "Bi-weekly peer-led workshops for underperforming students.",
};
const SKILL_RECONSTRUCTION: Strategy = Strategy {
    label: "Skill DNA Reconstruction",
    detail: "Revised curriculum focus on fundamental engineering principles.",
};
const ADVANCED_TRACK: Strategy = Strategy {
    label: "Advanced Honors Track",
    detail: "Integrate industry-level certifications for 'High Achiever' clusters.",
};
const INFRASTRUCTURE_EXPANSION: Strategy = Strategy {
    label: "Digital Lab Expansion",
    detail: "Upgrade 30% of existing labs with specialized AI/ML server nodes.",
};

/// A threshold test and the strategy chosen on each side of it.
struct StrategyRule {
    name: &'static str,
    triggered: fn(&InstitutionalStats) -> bool,
    when_triggered: Strategy,
    otherwise: Strategy,
}

const STRATEGY_RULES: &[StrategyRule] = &[
    StrategyRule {
        name: "risk_ratio_above_threshold",
        triggered: |stats| stats.risk_ratio > RISK_RATIO_THRESHOLD,
        when_triggered: INTENSIVE_INTERVENTION,
        otherwise: PROACTIVE_MENTORSHIP,
    },
    StrategyRule {
        name: "dna_score_below_threshold",
        triggered: |stats| stats.dna_score < DNA_SCORE_THRESHOLD,
        when_triggered: SKILL_RECONSTRUCTION,
        otherwise: ADVANCED_TRACK,
    },
];

const ALWAYS_APPLIED: &[Strategy] = &[INFRASTRUCTURE_EXPANSION];

impl From<Strategy> for ActionPlanStrategy {
    fn from(strategy: Strategy) -> Self {
        ActionPlanStrategy {
            label: strategy.label.to_string(),
            detail: strategy.detail.to_string(),
        }
    }
}

pub fn strategies(stats: &InstitutionalStats) -> Vec<ActionPlanStrategy> {
    STRATEGY_RULES
        .iter()
        .map(|rule| {
            let triggered = (rule.triggered)(stats);
            tracing::trace!(rule = rule.name, triggered, "action plan rule evaluated");
            if triggered {
                rule.when_triggered
            } else {
                rule.otherwise
            }
        })
        .chain(ALWAYS_APPLIED.iter().copied())
        .map(ActionPlanStrategy::from)
        .collect()
}

pub fn roadmap(total_students: usize) -> Vec<ActionPlanStep> {
    let step = |title: &str, detail: String| ActionPlanStep {
        title: title.to_string(),
        detail,
    };
    vec![
        step(
            "Phase 1: Target",
            format!(
                "Identify the top {} at-risk students for immediate counseling.",
                total_students.min(MAX_TARGETED_STUDENTS)
            ),
        ),
        step(
            "Phase 2: Deploy",
            "Launch the new dynamic learning portal for autonomous progress tracking.".to_string(),
        ),
        step(
            "Phase 3: Verify",
            "Assess improvement index after the mid-semester evaluation cycle.".to_string(),
        ),
    ]
}

/// Expected efficiency gain, truncated to whole percent and signed.
pub fn roi_efficiency(risk_ratio: f64) -> String {
    format!("{:+}%", (25.0 - risk_ratio / 2.0).trunc() as i64)
}

pub fn generate(stats: &InstitutionalStats) -> DynamicActionPlan {
    DynamicActionPlan {
        executive_summary: EXECUTIVE_SUMMARY.to_string(),
        roi_efficiency: roi_efficiency(stats.risk_ratio),
        strategies: strategies(stats),
        resource_label: RESOURCE_LABEL.to_string(),
        resource_value: format!(
            "₹ {:.1}L",
            stats.total_students as f64 * RESOURCE_LAKHS_PER_STUDENT
        ),
        roadmap: roadmap(stats.total_students),
        insight_quote: format!(
            "With a Growth Index of {}, we have a strong foundation to increase institutional ROI by targeting the current {}% risk gap.",
            format_decimal(stats.avg_growth_index),
            format_decimal(stats.risk_ratio)
        ),
    }
}

/// One-line summary naming the best and worst ranked departments.
pub fn weekly_insight(ranking: &[DeptPerformanceRank]) -> String {
    let best = ranking.first().map_or("N/A", |r| r.department.as_str());
    let worst = ranking.last().map_or("N/A", |r| r.department.as_str());
    format!(
        "{best} department shows strong placement readiness but {worst} requires focused remedial intervention in Core Engineering subjects."
    )
}

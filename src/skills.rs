use std::collections::BTreeSet;

use serde::Serialize;

use crate::trend::round_to;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillGap {
    pub gap_percentage: f64,
    /// Lower-cased names of required skills the student lacks.
    pub missing_skills: BTreeSet<String>,
    pub match_count: usize,
    pub total_required: usize,
}

/// Compares possessed skills against a required set. Names are matched
/// case-insensitively; an empty requirement means no gap.
pub fn analyze_gap<C, R>(current: C, required: R) -> SkillGap
where
    C: IntoIterator,
    C::Item: AsRef<str>,
    R: IntoIterator,
    R::Item: AsRef<str>,
{
    let current: BTreeSet<String> = current.into_iter().map(|s| normalize(s.as_ref())).collect();
    let required: BTreeSet<String> = required.into_iter().map(|s| normalize(s.as_ref())).collect();

    let missing_skills: BTreeSet<String> = required.difference(&current).cloned().collect();
    let total_required = required.len();
    let gap_percentage = if total_required == 0 {
        0.0
    } else {
        round_to(missing_skills.len() as f64 / total_required as f64 * 100.0, 2)
    };

    SkillGap {
        gap_percentage,
        match_count: total_required - missing_skills.len(),
        missing_skills,
        total_required,
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_requirement_has_no_gap() {
        let gap = analyze_gap(["Python"], Vec::<String>::new());
        assert_eq!(gap.gap_percentage, 0.0);
        assert_eq!(gap.match_count, 0);
        assert_eq!(gap.total_required, 0);
    }

    #[test]
    fn full_overlap_ignores_case() {
        let gap = analyze_gap(["python", "SQL", "Git"], ["Python", "sql"]);
        assert_eq!(gap.gap_percentage, 0.0);
        assert!(gap.missing_skills.is_empty());
        assert_eq!(gap.match_count, 2);
    }

    #[test]
    fn partial_overlap() {
        let gap = analyze_gap(["Python"], ["Python", "Docker", "Kubernetes"]);
        assert_eq!(gap.gap_percentage, 66.67);
        assert_eq!(gap.match_count, 1);
        assert_eq!(gap.total_required, 3);
        assert!(gap.missing_skills.contains("docker"));
        assert!(gap.missing_skills.contains("kubernetes"));
    }

    #[test]
    fn duplicate_requirements_collapse() {
        let gap = analyze_gap(Vec::<&str>::new(), ["SQL", "sql", "Sql"]);
        assert_eq!(gap.total_required, 1);
        assert_eq!(gap.gap_percentage, 100.0);
    }
}

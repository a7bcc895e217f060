//! Deterministic per-student insight generation.
//!
//! Each student gets a PRNG seeded from their identifier, so career and
//! course suggestions are reproducible for an unchanged record. Results reach
//! the store through a merge-only upsert that never overwrites populated
//! fields.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::catalog;
use crate::error::{EngineError, Result};
use crate::models::{
    CareerSuggestion, InsightProfile, RecommendedCourses, StudentDetail, StudentRecord,
};
use crate::risk::{self, RiskSignals};
use crate::skills;
use crate::store::{InsightStore, StudentRepository};
use crate::trend::{self, round_to};

const SEED_MODULUS: u64 = 10_000;
const MAX_SUGGESTIONS: usize = 3;
const MAX_FIT_PERCENT: i32 = 98;
const STRONG_SUBJECTS: usize = 3;
const WEAK_SUBJECTS: usize = 2;

/// Interprets the identifier's bytes as one big-endian integer and reduces
/// it modulo 10000.
pub fn seed_for(identifier: &str) -> u64 {
    identifier
        .as_bytes()
        .iter()
        .fold(0u64, |acc, byte| (acc * 256 + u64::from(*byte)) % SEED_MODULUS)
}

pub fn rng_for(identifier: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed_for(identifier))
}

/// Output of one generator pass, before it is merged into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedInsights {
    pub career_suggestions: Vec<CareerSuggestion>,
    pub recommended_courses: RecommendedCourses,
    pub consistency_index: f64,
    pub skill_gap_score: f64,
}

pub fn generate(student: &StudentRecord) -> GeneratedInsights {
    let mut rng = rng_for(&student.id);
    let department = student.department.as_deref();

    let roles = catalog::career_roles(department);
    if roles.fallback {
        tracing::debug!(
            student_id = %student.id,
            department = ?department,
            "using default career table"
        );
    }
    let career_suggestions = suggest_careers(&mut rng, &roles.entries, student.current_cgpa);

    let mut subjects = catalog::subjects(department).entries;
    subjects.shuffle(&mut rng);
    let recommended_courses = split_courses(&subjects);

    let consistency_index = round_to(rng.gen_range(0.6..=0.95), 2);
    let skill_gap_score = round_to(rng.gen_range(10.0..=40.0), 1);

    GeneratedInsights {
        career_suggestions,
        recommended_courses,
        consistency_index,
        skill_gap_score,
    }
}

fn suggest_careers<R: Rng>(rng: &mut R, roles: &[&str], cgpa: f64) -> Vec<CareerSuggestion> {
    let base_match = (cgpa * 8.0).floor() as i32 + 10;
    let mut pool = roles.to_vec();
    let take = MAX_SUGGESTIONS.min(pool.len());
    let (picked, _) = pool.partial_shuffle(&mut *rng, take);

    picked
        .iter()
        .map(|role| {
            let fit_percent = (base_match + rng.gen_range(-5..=10)).min(MAX_FIT_PERCENT);
            let icon = catalog::CAREER_ICONS
                .choose(&mut *rng)
                .copied()
                .unwrap_or(catalog::CAREER_ICONS[0]);
            CareerSuggestion {
                role: role.to_string(),
                fit_percent,
                icon: icon.to_string(),
            }
        })
        .collect()
}

fn split_courses(shuffled: &[&str]) -> RecommendedCourses {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let strong_end = STRONG_SUBJECTS.min(shuffled.len());
    let weak_end = (STRONG_SUBJECTS + WEAK_SUBJECTS).min(shuffled.len());
    RecommendedCourses {
        strong: owned(&shuffled[..strong_end]),
        weak: owned(&shuffled[strong_end..weak_end]),
    }
}

impl GeneratedInsights {
    pub fn into_patch(self, student_id: &str) -> InsightProfile {
        InsightProfile {
            career_suggestions: self.career_suggestions,
            recommended_courses: Some(self.recommended_courses),
            consistency_index: Some(self.consistency_index),
            skill_gap_score: Some(self.skill_gap_score),
            ..InsightProfile::empty(student_id)
        }
    }
}

/// Writes generator output for `student` through the merge-only upsert.
pub async fn apply<S: InsightStore + ?Sized>(
    store: &S,
    student: &StudentRecord,
) -> Result<InsightProfile> {
    let patch = generate(student).into_patch(&student.id);
    store.upsert_merge(&student.id, patch).await
}

/// Fills the predictive fields of a patch from the student's own record.
pub fn predictive_patch(student: &StudentRecord, mut patch: InsightProfile) -> InsightProfile {
    let assessment = risk::score(&RiskSignals {
        attendance_percent: student.attendance_percent,
        cgpa_trend: risk::cgpa_trend(&student.cgpa_history),
        failed_subjects: student.failed_subjects,
    });

    let history = if student.cgpa_history.is_empty() {
        vec![student.current_cgpa]
    } else {
        student.cgpa_history.clone()
    };
    let prediction = trend::predict_next(&history);
    let previous = history.last().copied().unwrap_or(student.current_cgpa);
    let growth = trend::analyze_growth(prediction, previous);

    let required = catalog::required_skills(student.department.as_deref());
    let gap = skills::analyze_gap(&student.skills, required);

    patch.risk_score = Some(assessment.risk_score);
    patch.risk_level = Some(assessment.risk_level);
    patch.cgpa_prediction = Some(prediction);
    patch.growth_status = Some(growth.status);
    patch.skill_gap_percent = Some(gap.gap_percentage);
    patch.missing_skills = Some(gap.missing_skills);
    patch
}

/// Loads a student, completes their profile if anything is missing, and
/// returns the profile laid over the base record.
pub async fn inspect_student<R, S>(repo: &R, store: &S, student_id: &str) -> Result<StudentDetail>
where
    R: StudentRepository + ?Sized,
    S: InsightStore + ?Sized,
{
    let student = repo
        .fetch_one(student_id)
        .await?
        .ok_or_else(|| EngineError::StudentNotFound(student_id.to_string()))?;

    let insights = match store.get(student_id).await? {
        Some(profile) if profile.is_complete() => profile,
        existing => {
            tracing::info!(
                student_id,
                created = existing.is_none(),
                "completing insight profile"
            );
            let patch = generate(&student).into_patch(&student.id);
            store
                .upsert_merge(&student.id, predictive_patch(&student, patch))
                .await?
        }
    };

    Ok(StudentDetail { student, insights })
}

/// Completes profiles for every student. Individual failures are logged and
/// skipped; the count of profiles written is returned.
pub async fn bulk_generate<R, S>(repo: &R, store: &S) -> Result<usize>
where
    R: StudentRepository + ?Sized,
    S: InsightStore + ?Sized,
{
    let students = repo.fetch_all().await?;
    tracing::info!(students = students.len(), "generating insights");

    let mut written = 0usize;
    for student in &students {
        let patch = predictive_patch(student, generate(student).into_patch(&student.id));
        match store.upsert_merge(&student.id, patch).await {
            Ok(_) => written += 1,
            Err(err) => {
                tracing::warn!(student_id = %student.id, error = %err, "insight generation failed")
            }
        }
    }

    tracing::info!(written, "bulk insight generation complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;
    use crate::store::{MemoryInsightStore, MemoryStudentRepository};

    fn student(id: &str, department: Option<&str>, cgpa: f64) -> StudentRecord {
        StudentRecord {
            id: id.to_string(),
            full_name: "Kavya R".to_string(),
            department: department.map(str::to_string),
            current_cgpa: cgpa,
            growth_index: 2.0,
            skill_score: 80.0,
            career_readiness: 70.0,
            risk_level: RiskLevel::Low,
            attendance_percent: 82.0,
            failed_subjects: 2,
            cgpa_history: vec![7.0, 7.4, 7.8],
            skills: vec!["Python".to_string(), "git".to_string()],
        }
    }

    #[test]
    fn seed_matches_big_endian_interpretation() {
        // "ab" = 0x6162 = 24930
        assert_eq!(seed_for("ab"), 4930);
        assert_eq!(seed_for(""), 0);
        assert!(seed_for("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2") < SEED_MODULUS);
    }

    #[test]
    fn generation_is_reproducible() {
        let record = student("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc", Some("CSE"), 8.2);
        let first = generate(&record);
        let second = generate(&record);
        assert_eq!(first, second);
    }

    #[test]
    fn suggestions_are_distinct_and_bounded() {
        let record = student("s-42", Some("ECE"), 9.9);
        let insights = generate(&record);
        assert_eq!(insights.career_suggestions.len(), 3);

        let mut roles: Vec<_> = insights.career_suggestions.iter().map(|c| &c.role).collect();
        roles.sort();
        roles.dedup();
        assert_eq!(roles.len(), 3);

        let base = (9.9f64 * 8.0).floor() as i32 + 10;
        for suggestion in &insights.career_suggestions {
            assert!(suggestion.fit_percent <= MAX_FIT_PERCENT);
            assert!(suggestion.fit_percent >= base - 5);
            assert!(catalog::CAREER_ICONS.contains(&suggestion.icon.as_str()));
        }
    }

    #[test]
    fn courses_split_into_strong_and_weak() {
        let insights = generate(&student("s-7", Some("MECH"), 7.0));
        assert_eq!(insights.recommended_courses.strong.len(), 3);
        assert_eq!(insights.recommended_courses.weak.len(), 2);
        assert!((0.6..=0.95).contains(&insights.consistency_index));
        assert!((10.0..=40.0).contains(&insights.skill_gap_score));
    }

    #[test]
    fn unknown_department_uses_default_tables() {
        let insights = generate(&student("s-8", Some("AGRI"), 7.0));
        let cse_roles = catalog::career_roles(Some("CSE")).entries;
        assert!(insights
            .career_suggestions
            .iter()
            .all(|c| cse_roles.contains(&c.role.as_str())));
    }

    #[tokio::test]
    async fn existing_suggestions_are_left_alone() {
        let store = MemoryInsightStore::new();
        let record = student("s-1", Some("CSE"), 8.0);
        let existing = CareerSuggestion {
            role: "Hand-picked Role".to_string(),
            fit_percent: 50,
            icon: "🔧".to_string(),
        };
        store.put(InsightProfile {
            career_suggestions: vec![existing.clone()],
            ..InsightProfile::empty("s-1")
        });

        let profile = apply(&store, &record).await.unwrap();
        assert_eq!(profile.career_suggestions, vec![existing]);
        assert_eq!(
            profile.recommended_courses,
            Some(generate(&record).recommended_courses)
        );
        assert_eq!(profile.consistency_index, None);
    }

    #[tokio::test]
    async fn repeated_application_is_idempotent() {
        let store = MemoryInsightStore::new();
        let record = student("s-2", Some("EEE"), 6.4);
        let first = apply(&store, &record).await.unwrap();
        let second = apply(&store, &record).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn inspection_completes_profile() {
        let record = student("s-3", Some("CSE"), 7.8);
        let repo = MemoryStudentRepository::new(vec![record]);
        let store = MemoryInsightStore::new();

        let detail = inspect_student(&repo, &store, "s-3").await.unwrap();
        let insights = &detail.insights;
        assert!(insights.is_complete());
        assert_eq!(insights.risk_level, Some(RiskLevel::Medium));
        assert_eq!(insights.cgpa_prediction, Some(8.2));
        assert_eq!(insights.skill_gap_percent, Some(60.0));

        let again = inspect_student(&repo, &store, "s-3").await.unwrap();
        assert_eq!(again.insights, detail.insights);
    }

    #[tokio::test]
    async fn inspection_of_unknown_student_fails() {
        let repo = MemoryStudentRepository::new(vec![]);
        let store = MemoryInsightStore::new();
        let err = inspect_student(&repo, &store, "missing").await.unwrap_err();
        assert!(matches!(err, EngineError::StudentNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn bulk_generation_covers_every_student() {
        let repo = MemoryStudentRepository::new(vec![
            student("a", Some("CSE"), 8.0),
            student("b", None, 6.0),
        ]);
        let store = MemoryInsightStore::new();
        assert_eq!(bulk_generate(&repo, &store).await.unwrap(), 2);
        assert_eq!(store.len(), 2);
    }
}

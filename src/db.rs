use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::models::{
    CareerSuggestion, GrowthStatus, InsightProfile, RecommendedCourses, RiskLevel, StaffRecord,
    StudentRecord,
};
use crate::store::{InsightStore, StaffDirectory, StudentRepository};

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// PostgreSQL-backed student repository, staff directory and insight store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

const STUDENT_COLUMNS: &str = "id, full_name, department, current_cgpa, growth_index, \
     skill_score, career_readiness, risk_level, attendance_percent, failed_subjects, \
     cgpa_history, skills";

const PROFILE_COLUMNS: &str = "student_id, risk_score, risk_level, cgpa_prediction, \
     growth_status, skill_gap_percent, missing_skills, career_suggestions, \
     recommended_courses, consistency_index, skill_gap_score, generated_at";

fn student_from_row(row: &PgRow) -> Result<StudentRecord> {
    let risk_text: String = row.try_get("risk_level")?;
    let risk_level = risk_text.parse().unwrap_or_else(|_| {
        tracing::warn!(risk_level = %risk_text, "unknown risk level, treating as Low");
        RiskLevel::Low
    });
    let failed_subjects: i32 = row.try_get("failed_subjects")?;

    let student = StudentRecord {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        department: row.try_get("department")?,
        current_cgpa: row.try_get("current_cgpa")?,
        growth_index: row.try_get("growth_index")?,
        skill_score: row.try_get("skill_score")?,
        career_readiness: row.try_get("career_readiness")?,
        risk_level,
        attendance_percent: row.try_get("attendance_percent")?,
        failed_subjects: failed_subjects.max(0) as u32,
        cgpa_history: row.try_get("cgpa_history")?,
        skills: row.try_get("skills")?,
    };
    student.ensure_finite()?;
    Ok(student)
}

fn profile_from_row(row: &PgRow) -> Result<InsightProfile> {
    let risk_level: Option<String> = row.try_get("risk_level")?;
    let growth_status: Option<String> = row.try_get("growth_status")?;
    let missing_skills: Option<Vec<String>> = row.try_get("missing_skills")?;
    let career_suggestions: Option<String> = row.try_get("career_suggestions")?;
    let recommended_courses: Option<String> = row.try_get("recommended_courses")?;
    let generated_at: Option<DateTime<Utc>> = row.try_get("generated_at")?;

    Ok(InsightProfile {
        student_id: row.try_get("student_id")?,
        risk_score: row.try_get("risk_score")?,
        risk_level: risk_level
            .map(|text| text.parse::<RiskLevel>())
            .transpose()?,
        cgpa_prediction: row.try_get("cgpa_prediction")?,
        growth_status: growth_status
            .map(|text| text.parse::<GrowthStatus>())
            .transpose()?,
        skill_gap_percent: row.try_get("skill_gap_percent")?,
        missing_skills: missing_skills.map(|skills| skills.into_iter().collect::<BTreeSet<_>>()),
        career_suggestions: career_suggestions
            .map(|json| serde_json::from_str::<Vec<CareerSuggestion>>(&json))
            .transpose()?
            .unwrap_or_default(),
        recommended_courses: recommended_courses
            .map(|json| serde_json::from_str::<RecommendedCourses>(&json))
            .transpose()?,
        consistency_index: row.try_get("consistency_index")?,
        skill_gap_score: row.try_get("skill_gap_score")?,
        generated_at,
    })
}

#[async_trait]
impl StudentRepository for PgStore {
    async fn fetch_all(&self) -> Result<Vec<StudentRecord>> {
        let query = format!(
            "SELECT {STUDENT_COLUMNS} FROM academic_insights.students ORDER BY full_name, id"
        );
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        tracing::debug!(rows = rows.len(), "fetched student snapshot");

        let mut students = Vec::with_capacity(rows.len());
        for row in &rows {
            match student_from_row(row) {
                Ok(student) => students.push(student),
                Err(err @ EngineError::NonFiniteValue { .. }) => {
                    tracing::warn!(error = %err, "skipping student with non-finite scores");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(students)
    }

    async fn fetch_one(&self, student_id: &str) -> Result<Option<StudentRecord>> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM academic_insights.students WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(student_from_row).transpose()
    }
}

#[async_trait]
impl StaffDirectory for PgStore {
    async fn sample(&self, limit: usize) -> Result<Vec<StaffRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, full_name, department, consistency_score, feedback_rating
            FROM academic_insights.staff
            ORDER BY id
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut staff = Vec::with_capacity(rows.len());
        for row in rows {
            staff.push(StaffRecord {
                id: row.try_get("id")?,
                full_name: row.try_get("full_name")?,
                department: row.try_get("department")?,
                consistency_score: row.try_get("consistency_score")?,
                feedback_rating: row.try_get("feedback_rating")?,
            });
        }
        Ok(staff)
    }
}

#[async_trait]
impl InsightStore for PgStore {
    async fn get(&self, student_id: &str) -> Result<Option<InsightProfile>> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM academic_insights.insight_profiles WHERE student_id = $1"
        );
        let row = sqlx::query(&query)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn get_or_create(&self, student_id: &str) -> Result<InsightProfile> {
        self.upsert_merge(student_id, InsightProfile::empty(student_id))
            .await
    }

    async fn upsert_merge(
        &self,
        student_id: &str,
        patch: InsightProfile,
    ) -> Result<InsightProfile> {
        let career_suggestions = if patch.career_suggestions.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&patch.career_suggestions)?)
        };
        let recommended_courses = patch
            .recommended_courses
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let missing_skills: Option<Vec<String>> = patch
            .missing_skills
            .as_ref()
            .map(|skills| skills.iter().cloned().collect());

        // Baseline scores are only written on insert.
        let query = format!(
            r#"
            INSERT INTO academic_insights.insight_profiles
            (student_id, risk_score, risk_level, cgpa_prediction, growth_status,
             skill_gap_percent, missing_skills, career_suggestions, recommended_courses,
             consistency_index, skill_gap_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (student_id) DO UPDATE SET
                risk_score = COALESCE(insight_profiles.risk_score, EXCLUDED.risk_score),
                risk_level = COALESCE(insight_profiles.risk_level, EXCLUDED.risk_level),
                cgpa_prediction = COALESCE(insight_profiles.cgpa_prediction, EXCLUDED.cgpa_prediction),
                growth_status = COALESCE(insight_profiles.growth_status, EXCLUDED.growth_status),
                skill_gap_percent = COALESCE(insight_profiles.skill_gap_percent, EXCLUDED.skill_gap_percent),
                missing_skills = COALESCE(insight_profiles.missing_skills, EXCLUDED.missing_skills),
                career_suggestions = COALESCE(insight_profiles.career_suggestions, EXCLUDED.career_suggestions),
                recommended_courses = COALESCE(insight_profiles.recommended_courses, EXCLUDED.recommended_courses)
            RETURNING {PROFILE_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(student_id)
            .bind(patch.risk_score)
            .bind(patch.risk_level.map(|level| level.as_str()))
            .bind(patch.cgpa_prediction)
            .bind(patch.growth_status.map(|status| status.as_str()))
            .bind(patch.skill_gap_percent)
            .bind(missing_skills)
            .bind(career_suggestions)
            .bind(recommended_courses)
            .bind(patch.consistency_index)
            .bind(patch.skill_gap_score)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(student_id, "insight profile upserted");
        profile_from_row(&row)
    }
}

pub async fn seed(pool: &PgPool) -> Result<()> {
    let students = vec![
        (
            "3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2",
            "Ashwin N",
            "CSE",
            9.1,
            4.2,
            91.0,
            86.0,
            RiskLevel::Low,
            94.0,
            0,
            vec![8.4, 8.7, 9.1],
            vec!["Python", "SQL", "Git"],
        ),
        (
            "0c22f1f1-9184-4fd4-9b21-28c68a6a89dc",
            "Priya G",
            "CSE",
            7.8,
            2.9,
            78.0,
            74.0,
            RiskLevel::Low,
            86.0,
            0,
            vec![7.2, 7.5, 7.8],
            vec!["Python", "Data Structures"],
        ),
        (
            "d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2",
            "Rahul S",
            "ECE",
            5.6,
            0.8,
            48.0,
            52.0,
            RiskLevel::High,
            68.0,
            3,
            vec![6.4, 6.0, 5.6],
            vec!["Embedded C"],
        ),
        (
            "8e3b2c4d-5f61-4a7b-9c8d-0e1f2a3b4c5d",
            "Ananya R",
            "ECE",
            6.7,
            1.9,
            61.0,
            63.0,
            RiskLevel::Medium,
            79.0,
            1,
            vec![6.9, 6.8, 6.7],
            vec!["IoT", "VLSI"],
        ),
        (
            "1a2b3c4d-5e6f-4711-8899-aabbccddeeff",
            "Karthik M",
            "MECH",
            7.2,
            2.4,
            70.0,
            68.0,
            RiskLevel::Low,
            88.0,
            0,
            vec![6.8, 7.0, 7.2],
            vec!["CAD/CAM", "Robotics"],
        ),
    ];

    for (
        id,
        name,
        department,
        cgpa,
        growth,
        skill,
        readiness,
        risk,
        attendance,
        failed,
        history,
        skills,
    ) in students
    {
        let skills: Vec<String> = skills.into_iter().map(str::to_string).collect();
        upsert_student(
            pool,
            &StudentRecord {
                id: id.to_string(),
                full_name: name.to_string(),
                department: Some(department.to_string()),
                current_cgpa: cgpa,
                growth_index: growth,
                skill_score: skill,
                career_readiness: readiness,
                risk_level: risk,
                attendance_percent: attendance,
                failed_subjects: failed,
                cgpa_history: history,
                skills,
            },
        )
        .await?;
    }

    let staff = vec![
        ("b7e1f0a4-0d5e-4c61-9a57-1f2e3d4c5b6a", "Meera K", "CSE", 0.92, 4.7),
        ("c8f2a1b5-1e6f-4d72-8b68-2a3f4e5d6c7b", "Vikram A", "ECE", 0.81, 4.1),
        ("d9a3b2c6-2f70-4e83-9c79-3b4a5f6e7d8c", "Lakshmi V", "MECH", 0.77, 3.9),
    ];

    for (id, name, department, consistency, rating) in staff {
        sqlx::query(
            r#"
            INSERT INTO academic_insights.staff
            (id, full_name, department, consistency_score, feedback_rating)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                department = EXCLUDED.department,
                consistency_score = EXCLUDED.consistency_score,
                feedback_rating = EXCLUDED.feedback_rating
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(department)
        .bind(consistency)
        .bind(rating)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn upsert_student(pool: &PgPool, student: &StudentRecord) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO academic_insights.students
        (id, full_name, department, current_cgpa, growth_index, skill_score,
         career_readiness, risk_level, attendance_percent, failed_subjects,
         cgpa_history, skills)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            department = EXCLUDED.department,
            current_cgpa = EXCLUDED.current_cgpa,
            growth_index = EXCLUDED.growth_index,
            skill_score = EXCLUDED.skill_score,
            career_readiness = EXCLUDED.career_readiness,
            risk_level = EXCLUDED.risk_level,
            attendance_percent = EXCLUDED.attendance_percent,
            failed_subjects = EXCLUDED.failed_subjects,
            cgpa_history = EXCLUDED.cgpa_history,
            skills = EXCLUDED.skills
        "#,
    )
    .bind(&student.id)
    .bind(&student.full_name)
    .bind(&student.department)
    .bind(student.current_cgpa)
    .bind(student.growth_index)
    .bind(student.skill_score)
    .bind(student.career_readiness)
    .bind(student.risk_level.as_str())
    .bind(student.attendance_percent)
    .bind(i32::try_from(student.failed_subjects).unwrap_or(i32::MAX))
    .bind(&student.cgpa_history)
    .bind(&student.skills)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    id: Option<String>,
    full_name: String,
    department: Option<String>,
    current_cgpa: f64,
    growth_index: f64,
    skill_score: f64,
    career_readiness: f64,
    risk_level: String,
    attendance_percent: f64,
    failed_subjects: u32,
    /// `;`-separated semester CGPAs, oldest first.
    cgpa_history: Option<String>,
    /// `;`-separated skill names.
    skills: Option<String>,
}

impl CsvRow {
    fn into_record(self) -> Result<StudentRecord> {
        let cgpa_history = split_list(self.cgpa_history.as_deref())
            .into_iter()
            .filter_map(|value| match value.parse::<f64>() {
                Ok(parsed) => Some(parsed),
                Err(_) => {
                    tracing::warn!(student = %self.full_name, value = %value, "skipping unparseable cgpa");
                    None
                }
            })
            .collect();

        let student = StudentRecord {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            risk_level: self.risk_level.parse()?,
            department: self.department.filter(|dept| !dept.trim().is_empty()),
            current_cgpa: self.current_cgpa,
            growth_index: self.growth_index,
            skill_score: self.skill_score,
            career_readiness: self.career_readiness,
            attendance_percent: self.attendance_percent,
            failed_subjects: self.failed_subjects,
            cgpa_history,
            skills: split_list(self.skills.as_deref()),
            full_name: self.full_name,
        };
        student.ensure_finite()?;
        Ok(student)
    }
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_students_csv(csv_path: &std::path::Path) -> Result<Vec<StudentRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut students = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        students.push(result?.into_record()?);
    }
    Ok(students)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> Result<usize> {
    let students = read_students_csv(csv_path)?;
    let mut imported = 0usize;

    for student in &students {
        if upsert_student(pool, student).await? > 0 {
            imported += 1;
        }
    }

    tracing::info!(imported, path = %csv_path.display(), "student import complete");
    Ok(imported)
}

use academic_insight_engine::models::{RiskLevel, StaffRecord, StudentRecord};
use academic_insight_engine::store::{
    InsightStore, MemoryInsightStore, MemoryStaffDirectory, MemoryStudentRepository,
};
use academic_insight_engine::{insight, report, EngineError};

fn student(
    id: &str,
    department: &str,
    cgpa: f64,
    growth: f64,
    skill: f64,
    readiness: f64,
    risk_level: RiskLevel,
) -> StudentRecord {
    StudentRecord {
        id: id.to_string(),
        full_name: format!("Student {id}"),
        department: Some(department.to_string()),
        current_cgpa: cgpa,
        growth_index: growth,
        skill_score: skill,
        career_readiness: readiness,
        risk_level,
        attendance_percent: 90.0,
        failed_subjects: 0,
        cgpa_history: vec![cgpa - 0.2, cgpa],
        skills: vec!["Python".to_string(), "SQL".to_string()],
    }
}

fn cohort() -> Vec<StudentRecord> {
    vec![
        student("s-1", "CSE", 9.0, 4.0, 90.0, 85.0, RiskLevel::Low),
        student("s-2", "CSE", 8.0, 3.0, 80.0, 80.0, RiskLevel::Low),
        student("s-3", "ECE", 5.0, 1.0, 40.0, 50.0, RiskLevel::High),
        student("s-4", "ECE", 6.0, 2.0, 50.0, 55.0, RiskLevel::Medium),
    ]
}

fn faculty() -> Vec<StaffRecord> {
    vec![StaffRecord {
        id: "f-1".to_string(),
        full_name: Some("Meera K".to_string()),
        department: Some("CSE".to_string()),
        consistency_score: 0.85,
        feedback_rating: 4.2,
    }]
}

#[tokio::test]
async fn four_student_cohort_overview() {
    let repo = MemoryStudentRepository::new(cohort());
    let staff = MemoryStaffDirectory::new(faculty());

    let overview = report::generate_overview(&repo, &staff).await.unwrap();

    let warning = &overview.early_warning;
    assert_eq!(warning.high_risk_count, 1);
    assert_eq!(warning.medium_risk_count, 1);
    assert_eq!(warning.low_risk_percent, 50.0);

    let stats = &overview.institutional;
    assert_eq!(stats.total_students, 4);
    assert_eq!(stats.dna_score, 62.75);
    assert_eq!(stats.risk_ratio, 42.5);
    assert_eq!(stats.avg_growth_index, 2.5);

    let departments: Vec<_> = overview
        .department_ranking
        .iter()
        .map(|d| (d.department.as_str(), d.overall_rank))
        .collect();
    assert_eq!(departments, vec![("CSE", 1), ("ECE", 2)]);
    assert_eq!(overview.department_ranking[1].risk_percent, 50.0);

    assert_eq!(overview.performance_clusters.len(), 4);
    assert_eq!(
        overview
            .performance_clusters
            .iter()
            .map(|c| c.count)
            .sum::<usize>(),
        4
    );
    assert_eq!(overview.performance_clusters[0].name, "High Achievers");
    assert_eq!(
        overview.performance_clusters[3].description,
        "Group with average CGPA of 5.0"
    );

    assert_eq!(overview.placement_forecast.forecast_placement_percent, 65.75);
    assert_eq!(overview.placement_forecast.skill_gap_avg, 35.0);
    assert_eq!(overview.faculty_impact.len(), 1);
    assert!(overview.weekly_insight.starts_with("CSE department"));

    let labels: Vec<_> = overview
        .action_plan
        .strategies
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Intensive Care Unit (ICU)",
            "Skill DNA Reconstruction",
            "Digital Lab Expansion"
        ]
    );
    assert_eq!(overview.action_plan.roi_efficiency, "+3%");
}

#[tokio::test]
async fn overview_serializes_wire_field_names() {
    let repo = MemoryStudentRepository::new(cohort());
    let staff = MemoryStaffDirectory::new(faculty());
    let overview = report::generate_overview(&repo, &staff).await.unwrap();

    let json = serde_json::to_value(&overview).unwrap();
    for field in [
        "institutional",
        "early_warning",
        "performance_clusters",
        "department_ranking",
        "placement_forecast",
        "faculty_impact",
        "resource_opt",
        "weekly_insight",
        "action_plan",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
}

#[tokio::test]
async fn inspection_completes_profile_once() {
    let repo = MemoryStudentRepository::new(cohort());
    let store = MemoryInsightStore::new();

    let first = insight::inspect_student(&repo, &store, "s-3").await.unwrap();
    assert_eq!(first.student.department.as_deref(), Some("ECE"));
    assert!(first.insights.is_complete());
    assert_eq!(first.insights.career_suggestions.len(), 3);

    let second = insight::inspect_student(&repo, &store, "s-3").await.unwrap();
    assert_eq!(first.insights, second.insights);
    assert_eq!(store.len(), 1);

    let stored = store.get("s-3").await.unwrap().unwrap();
    assert_eq!(stored, first.insights);
}

#[tokio::test]
async fn inspecting_unknown_student_fails() {
    let repo = MemoryStudentRepository::new(cohort());
    let store = MemoryInsightStore::new();

    let err = insight::inspect_student(&repo, &store, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StudentNotFound(id) if id == "missing"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn non_finite_record_is_left_out_of_overview() {
    let mut students = cohort();
    students.push(student("s-5", "ECE", f64::NAN, 2.0, 60.0, 60.0, RiskLevel::Low));
    let repo = MemoryStudentRepository::new(students);
    let staff = MemoryStaffDirectory::new(faculty());

    let overview = report::generate_overview(&repo, &staff).await.unwrap();
    assert_eq!(overview.institutional.total_students, 4);
    assert_eq!(overview.institutional.dna_score, 62.75);
    assert_eq!(
        overview
            .performance_clusters
            .iter()
            .map(|c| c.count)
            .sum::<usize>(),
        4
    );
}

#[tokio::test]
async fn profile_json_renders_fit_as_match_text() {
    let repo = MemoryStudentRepository::new(cohort());
    let store = MemoryInsightStore::new();

    let detail = insight::inspect_student(&repo, &store, "s-1").await.unwrap();
    let json = serde_json::to_value(&detail).unwrap();
    let fit = json["insights"]["career_suggestions"][0]["fit"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(fit.ends_with("% Match"), "unexpected fit text {fit}");
    assert_eq!(json["full_name"], "Student s-1");
}

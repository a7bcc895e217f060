//! Collaborator contracts consumed by the engine, with in-memory
//! implementations used by tests and embedding callers.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::Result;
use crate::models::{InsightProfile, StaffRecord, StudentRecord};

/// Read-only view over persisted student records.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<StudentRecord>>;

    async fn fetch_one(&self, student_id: &str) -> Result<Option<StudentRecord>>;
}

/// Per-student insight profiles with merge-only writes.
#[async_trait]
pub trait InsightStore: Send + Sync {
    async fn get(&self, student_id: &str) -> Result<Option<InsightProfile>>;

    /// Returns the stored profile, inserting an empty one if none exists.
    async fn get_or_create(&self, student_id: &str) -> Result<InsightProfile>;

    /// Atomically creates the profile from `patch` when absent; otherwise
    /// fills only the fields that are currently empty.
    async fn upsert_merge(&self, student_id: &str, patch: InsightProfile)
        -> Result<InsightProfile>;
}

#[async_trait]
pub trait StaffDirectory: Send + Sync {
    async fn sample(&self, limit: usize) -> Result<Vec<StaffRecord>>;
}

#[derive(Debug, Default)]
pub struct MemoryStudentRepository {
    students: Vec<StudentRecord>,
}

impl MemoryStudentRepository {
    pub fn new(students: Vec<StudentRecord>) -> Self {
        MemoryStudentRepository { students }
    }
}

#[async_trait]
impl StudentRepository for MemoryStudentRepository {
    async fn fetch_all(&self) -> Result<Vec<StudentRecord>> {
        Ok(self.students.clone())
    }

    async fn fetch_one(&self, student_id: &str) -> Result<Option<StudentRecord>> {
        Ok(self.students.iter().find(|s| s.id == student_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStaffDirectory {
    staff: Vec<StaffRecord>,
}

impl MemoryStaffDirectory {
    pub fn new(staff: Vec<StaffRecord>) -> Self {
        MemoryStaffDirectory { staff }
    }
}

#[async_trait]
impl StaffDirectory for MemoryStaffDirectory {
    async fn sample(&self, limit: usize) -> Result<Vec<StaffRecord>> {
        Ok(self.staff.iter().take(limit).cloned().collect())
    }
}

/// Profiles keyed by student id. Each read-modify-write runs under the
/// map's entry guard for that key.
#[derive(Debug, Default)]
pub struct MemoryInsightStore {
    profiles: DashMap<String, InsightProfile>,
}

impl MemoryInsightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a profile as-is, replacing anything stored.
    pub fn put(&self, profile: InsightProfile) {
        self.profiles.insert(profile.student_id.clone(), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl InsightStore for MemoryInsightStore {
    async fn get(&self, student_id: &str) -> Result<Option<InsightProfile>> {
        Ok(self.profiles.get(student_id).map(|entry| entry.value().clone()))
    }

    async fn get_or_create(&self, student_id: &str) -> Result<InsightProfile> {
        let entry = self
            .profiles
            .entry(student_id.to_string())
            .or_insert_with(|| InsightProfile {
                generated_at: Some(Utc::now()),
                ..InsightProfile::empty(student_id)
            });
        Ok(entry.value().clone())
    }

    async fn upsert_merge(
        &self,
        student_id: &str,
        patch: InsightProfile,
    ) -> Result<InsightProfile> {
        let entry = self
            .profiles
            .entry(student_id.to_string())
            .and_modify(|existing| existing.fill_missing(&patch))
            .or_insert_with(|| InsightProfile {
                student_id: student_id.to_string(),
                generated_at: Some(Utc::now()),
                ..patch.clone()
            });
        Ok(entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CareerSuggestion, RecommendedCourses};
    use std::sync::Arc;

    fn patch(role: &str) -> InsightProfile {
        InsightProfile {
            career_suggestions: vec![CareerSuggestion {
                role: role.to_string(),
                fit_percent: 75,
                icon: "🧠".to_string(),
            }],
            recommended_courses: Some(RecommendedCourses::default()),
            consistency_index: Some(0.8),
            ..InsightProfile::empty("s-1")
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_preserves() {
        let store = MemoryInsightStore::new();
        let created = store.upsert_merge("s-1", patch("AI Engineer")).await.unwrap();
        assert_eq!(created.consistency_index, Some(0.8));
        assert!(created.generated_at.is_some());

        let mut second = patch("Data Scientist");
        second.consistency_index = Some(0.61);
        let merged = store.upsert_merge("s-1", second).await.unwrap();
        assert_eq!(merged.career_suggestions[0].role, "AI Engineer");
        assert_eq!(merged.consistency_index, Some(0.8));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_or_create_inserts_empty_profile() {
        let store = MemoryInsightStore::new();
        assert!(store.get("s-9").await.unwrap().is_none());
        let profile = store.get_or_create("s-9").await.unwrap();
        assert!(profile.career_suggestions.is_empty());
        assert!(store.get("s-9").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_upserts_keep_first_writer() {
        let store = Arc::new(MemoryInsightStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .upsert_merge("s-1", patch(&format!("Role {i}")))
                    .await
                    .unwrap()
            }));
        }

        let mut roles = Vec::new();
        for handle in handles {
            roles.push(handle.await.unwrap().career_suggestions[0].role.clone());
        }

        let stored = store.get("s-1").await.unwrap().unwrap();
        let first = &stored.career_suggestions[0].role;
        assert!(roles.iter().all(|role| role == first));
    }
}

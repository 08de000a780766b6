// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! Project repository.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Datastore, StorageError, StorageResult};

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Work in progress
    Active,
    /// Paused
    OnHold,
    /// Delivered/closed
    Done,
}

/// Project record persisted in the datastore.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredProject {
    /// Unique project identifier (UUID)
    pub project_id: String,
    /// Project name
    pub name: String,
    /// Client the project is for
    pub client: String,
    /// Lifecycle status
    pub status: ProjectStatus,
    /// Planned start date
    pub start_date: NaiveDate,
    /// Planned or actual end date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Free-form notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl StoredProject {
    /// Create a new active project.
    pub fn new(name: String, client: String, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            project_id: uuid::Uuid::new_v4().to_string(),
            name,
            client,
            status: ProjectStatus::Active,
            start_date,
            end_date: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository for project records.
pub struct ProjectRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new ProjectRepository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    /// Get a project by ID.
    pub fn get(&self, project_id: &str) -> StorageResult<StoredProject> {
        let path = self.datastore.paths().project(project_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("Project {project_id}")));
        }
        self.datastore.read_json(path)
    }

    /// Persist a new project.
    pub fn create(&self, project: &StoredProject) -> StorageResult<()> {
        let path = self.datastore.paths().project(&project.project_id);
        if self.datastore.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "Project {}",
                project.project_id
            )));
        }
        self.datastore.write_json(path, project)
    }

    /// Update an existing project.
    pub fn update(&self, project: &StoredProject) -> StorageResult<()> {
        let path = self.datastore.paths().project(&project.project_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "Project {}",
                project.project_id
            )));
        }
        self.datastore.write_json(path, project)
    }

    /// Delete a project.
    pub fn delete(&self, project_id: &str) -> StorageResult<()> {
        let path = self.datastore.paths().project(project_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("Project {project_id}")));
        }
        self.datastore.delete(path)
    }

    /// List all projects, newest started first.
    pub fn list_all(&self) -> StorageResult<Vec<StoredProject>> {
        let ids = self
            .datastore
            .list_files(self.datastore.paths().projects_dir(), "json")?;

        let mut projects = Vec::new();
        for id in &ids {
            if let Ok(project) = self.get(id) {
                projects.push(project);
            }
        }
        projects.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn test_datastore() -> (Datastore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut ds = Datastore::new(StoragePaths::new(tmp.path()));
        ds.initialize().expect("Failed to initialize");
        (ds, tmp)
    }

    fn project(name: &str, day: u32) -> StoredProject {
        StoredProject::new(
            name.to_string(),
            "PT Example".to_string(),
            NaiveDate::from_ymd_opt(2026, 8, day).unwrap(),
        )
    }

    #[test]
    fn crud_round_trip() {
        let (ds, _tmp) = test_datastore();
        let repo = ProjectRepository::new(&ds);

        let mut p = project("Warehouse rollout", 1);
        repo.create(&p).unwrap();

        p.status = ProjectStatus::Done;
        p.end_date = NaiveDate::from_ymd_opt(2026, 9, 1);
        repo.update(&p).unwrap();

        let loaded = repo.get(&p.project_id).unwrap();
        assert_eq!(loaded.status, ProjectStatus::Done);
        assert!(loaded.end_date.is_some());

        repo.delete(&p.project_id).unwrap();
        assert!(matches!(
            repo.get(&p.project_id),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn create_duplicate_fails() {
        let (ds, _tmp) = test_datastore();
        let repo = ProjectRepository::new(&ds);

        let p = project("A", 1);
        repo.create(&p).unwrap();
        assert!(matches!(
            repo.create(&p),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn list_sorts_newest_first() {
        let (ds, _tmp) = test_datastore();
        let repo = ProjectRepository::new(&ds);

        repo.create(&project("Old", 1)).unwrap();
        repo.create(&project("New", 20)).unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all[0].name, "New");
    }
}

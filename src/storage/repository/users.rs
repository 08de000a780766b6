// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Ichibot Production

//! User repository.
//!
//! Users double as employee records. The full name, base salary and birth
//! date columns are sensitive and persist encrypted with companion lookup
//! hashes; the username stays plaintext because it is the login key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{Datastore, StorageError, StorageResult};
use crate::auth::Role;
use crate::crypto::FieldCipher;

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Account can log in
    Active,
    /// Login disabled (e.g., pending review)
    Suspended,
    /// Soft-deleted (record retained)
    Deleted,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// User record persisted in the datastore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredUser {
    /// Unique user identifier (UUID)
    pub user_id: String,
    /// Login username (plaintext, unique)
    pub username: String,
    /// Encrypted full name
    pub full_name_enc: String,
    /// Lookup hash of the full name
    pub full_name_hash: String,
    /// Argon2 password hash
    pub password_hash: String,
    /// Authorization role
    pub role: Role,
    /// Job position/title
    pub position: String,
    /// Encrypted base monthly salary (decimal string)
    pub base_salary_enc: String,
    /// Encrypted birth date (YYYY-MM-DD), if provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date_enc: Option<String>,
    /// Account status
    pub status: UserStatus,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Response returned to API clients (decrypted, never includes secrets).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// Unique user identifier
    pub user_id: String,
    /// Login username
    pub username: String,
    /// Decrypted full name
    pub full_name: String,
    /// Authorization role
    pub role: Role,
    /// Job position/title
    pub position: String,
    /// Decrypted base salary, only present for admin/HR callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<String>,
    /// Decrypted birth date, only present for admin/HR callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    /// Account status
    pub status: UserStatus,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl StoredUser {
    /// Build the client-facing view, decrypting what the caller may see.
    pub fn to_response(&self, cipher: &FieldCipher, include_sensitive: bool) -> UserResponse {
        UserResponse {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            full_name: cipher.decrypt(&self.full_name_enc),
            role: self.role,
            position: self.position.clone(),
            base_salary: include_sensitive.then(|| cipher.decrypt(&self.base_salary_enc)),
            birth_date: if include_sensitive {
                self.birth_date_enc.as_deref().map(|d| cipher.decrypt(d))
            } else {
                None
            },
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Repository for user records.
pub struct UserRepository<'a> {
    datastore: &'a Datastore,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository.
    pub fn new(datastore: &'a Datastore) -> Self {
        Self { datastore }
    }

    /// Check if a user exists.
    pub fn exists(&self, user_id: &str) -> bool {
        self.datastore.exists(self.datastore.paths().user(user_id))
    }

    /// Get a user by ID.
    pub fn get(&self, user_id: &str) -> StorageResult<StoredUser> {
        let path = self.datastore.paths().user(user_id);
        if !self.datastore.exists(&path) {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        self.datastore.read_json(path)
    }

    /// Create a new user.
    ///
    /// The username must be unique across non-deleted users.
    pub fn create(&self, user: &StoredUser) -> StorageResult<()> {
        if self.exists(&user.user_id) {
            return Err(StorageError::AlreadyExists(format!("User {}", user.user_id)));
        }
        if self.find_by_username(&user.username)?.is_some() {
            return Err(StorageError::AlreadyExists(format!(
                "Username {}",
                user.username
            )));
        }

        self.datastore
            .write_json(self.datastore.paths().user(&user.user_id), user)
    }

    /// Update an existing user.
    pub fn update(&self, user: &StoredUser) -> StorageResult<()> {
        if !self.exists(&user.user_id) {
            return Err(StorageError::NotFound(format!("User {}", user.user_id)));
        }
        self.datastore
            .write_json(self.datastore.paths().user(&user.user_id), user)
    }

    /// Soft-delete a user (mark as deleted but retain the record).
    pub fn soft_delete(&self, user_id: &str) -> StorageResult<()> {
        let mut user = self.get(user_id)?;
        user.status = UserStatus::Deleted;
        user.updated_at = Utc::now();
        self.update(&user)
    }

    /// List all users, including suspended and deleted.
    pub fn list_all(&self) -> StorageResult<Vec<StoredUser>> {
        let ids = self
            .datastore
            .list_files(self.datastore.paths().users_dir(), "json")?;

        let mut users = Vec::new();
        for id in &ids {
            if let Ok(user) = self.get(id) {
                users.push(user);
            }
        }
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    /// Find a non-deleted user by username.
    pub fn find_by_username(&self, username: &str) -> StorageResult<Option<StoredUser>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|u| u.username == username && u.status != UserStatus::Deleted))
    }

    /// Equality search on the encrypted full-name column via its lookup hash.
    pub fn find_by_full_name(
        &self,
        cipher: &FieldCipher,
        full_name: &str,
    ) -> StorageResult<Vec<StoredUser>> {
        let hash = cipher.lookup_hash(full_name);
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|u| u.full_name_hash == hash && u.status != UserStatus::Deleted)
            .collect())
    }
}

//! # Branch Repository
//!
//! Database operations for branches. A branch owns its products and
//! sales; deleting one cascades to both (the schema enforces it).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::validation::validate_name;
use tally_core::{Branch, CoreError};

/// Repository for branch database operations.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    /// Lists all branches ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Branch>> {
        let branches = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, name, location, created_at
            FROM branches
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(branches)
    }

    /// Gets a branch by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            SELECT id, name, location, created_at
            FROM branches
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Creates a new branch.
    pub async fn insert(&self, name: &str, location: &str) -> DbResult<Branch> {
        validate_name(name).map_err(CoreError::from)?;

        let branch = Branch {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            location: location.to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %branch.id, name = %branch.name, "Inserting branch");

        sqlx::query(
            r#"
            INSERT INTO branches (id, name, location, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(&branch.location)
        .bind(branch.created_at)
        .execute(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Updates a branch's name and location.
    pub async fn update(&self, id: &str, name: &str, location: &str) -> DbResult<()> {
        validate_name(name).map_err(CoreError::from)?;

        debug!(id = %id, "Updating branch");

        let result = sqlx::query(
            r#"
            UPDATE branches SET name = ?2, location = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(location)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        Ok(())
    }

    /// Deletes a branch.
    ///
    /// The schema cascades to the branch's products and sales.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting branch");

        let result = sqlx::query("DELETE FROM branches WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", id));
        }

        Ok(())
    }

    /// Counts branches (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM branches")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_branch_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.branches();

        let branch = repo.insert("Osu Branch", "Oxford Street").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        let fetched = repo.get_by_id(&branch.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Osu Branch");
        assert_eq!(fetched.location, "Oxford Street");

        repo.update(&branch.id, "Osu Main", "Oxford Street, Accra")
            .await
            .unwrap();
        let updated = repo.get_by_id(&branch.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Osu Main");

        repo.delete(&branch.id).await.unwrap();
        assert!(repo.get_by_id(&branch.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.branches().insert("", "Nowhere").await.unwrap_err();
        assert!(matches!(
            err,
            crate::DbError::Domain(tally_core::CoreError::Validation(_))
        ));
        assert_eq!(db.branches().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_branch_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .branches()
            .update("no-such-id", "Name", "Location")
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.branches();

        repo.insert("Tema Branch", "Community 1").await.unwrap();
        repo.insert("Accra Branch", "High Street").await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Accra Branch", "Tema Branch"]);
    }
}

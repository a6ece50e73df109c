//! Database repository for CRUD operations.
//!
//! Uses prepared statements; every operation is a single round trip to the pool
//! except updates, which read the current row and write back the merged values.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Admin, CreateMagazineRequest, Magazine, UpdateMagazineRequest};
use crate::period::MonthWindow;

const MAGAZINE_COLUMNS: &str =
    "id, image_file, owner, title, description, likes, is_published, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check that the store answers queries.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close every pooled connection. Pending queries finish first.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ==================== ADMIN DIRECTORY ====================

    /// Look up an admin by identity.
    pub async fn find_admin(&self, id: &str) -> Result<Option<Admin>, AppError> {
        let row = sqlx::query("SELECT id FROM admins WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(admin_from_row))
    }

    /// Insert an admin unless one with this identity exists. Returns whether a row was added.
    pub async fn ensure_admin(&self, id: &str) -> Result<bool, AppError> {
        let now = db_time(&Utc::now());
        let result = sqlx::query("INSERT OR IGNORE INTO admins (id, created_at) VALUES (?, ?)")
            .bind(id)
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== MAGAZINE OPERATIONS ====================

    /// List magazines created inside the window, oldest first.
    pub async fn list_magazines_between(
        &self,
        window: &MonthWindow,
    ) -> Result<Vec<Magazine>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM magazines WHERE created_at >= ? AND created_at < ? ORDER BY created_at, id",
            MAGAZINE_COLUMNS
        ))
        .bind(db_time(&window.start))
        .bind(db_time(&window.end))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(magazine_from_row).collect()
    }

    /// Get a magazine by ID.
    pub async fn get_magazine(&self, id: &str) -> Result<Option<Magazine>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM magazines WHERE id = ?",
            MAGAZINE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(magazine_from_row).transpose()
    }

    /// Create a new magazine.
    pub async fn create_magazine(
        &self,
        request: &CreateMagazineRequest,
    ) -> Result<Magazine, AppError> {
        let id = request
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let now = Utc::now().trunc_subsecs(6);
        let created_at = request
            .created_at
            .map(|t| t.trunc_subsecs(6))
            .unwrap_or(now);
        let likes = request.likes.unwrap_or(0);
        let is_published = request.is_published.unwrap_or(false);

        // A missing title binds NULL and fails the NOT NULL constraint
        sqlx::query(
            "INSERT INTO magazines (id, image_file, owner, title, description, likes, is_published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.image_file)
        .bind(&request.owner)
        .bind(&request.title)
        .bind(&request.description)
        .bind(likes)
        .bind(is_published as i32)
        .bind(db_time(&created_at))
        .bind(db_time(&now))
        .execute(&self.pool)
        .await?;

        Ok(Magazine {
            id,
            image_file: request.image_file.clone(),
            owner: request.owner.clone(),
            title: request.title.clone().unwrap_or_default(),
            description: request.description.clone(),
            likes,
            is_published,
            created_at,
            updated_at: now,
        })
    }

    /// Merge the supplied fields onto an existing magazine. Last write wins.
    pub async fn update_magazine(
        &self,
        id: &str,
        request: &UpdateMagazineRequest,
    ) -> Result<Magazine, AppError> {
        let existing = self
            .get_magazine(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Magazine not found".to_string()))?;

        let now = Utc::now().trunc_subsecs(6);
        let image_file = request.image_file.clone().unwrap_or(existing.image_file);
        let owner = request.owner.clone().unwrap_or(existing.owner);
        // An explicit null title binds NULL and fails the NOT NULL constraint
        let title = request.title.clone().unwrap_or(Some(existing.title));
        let description = request.description.clone().unwrap_or(existing.description);
        let likes = request.likes.unwrap_or(existing.likes);
        let is_published = request.is_published.unwrap_or(existing.is_published);
        let created_at = request
            .created_at
            .map(|t| t.trunc_subsecs(6))
            .unwrap_or(existing.created_at);

        let result = sqlx::query(
            "UPDATE magazines SET image_file = ?, owner = ?, title = ?, description = ?, likes = ?, is_published = ?, created_at = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&image_file)
        .bind(&owner)
        .bind(&title)
        .bind(&description)
        .bind(likes)
        .bind(is_published as i32)
        .bind(db_time(&created_at))
        .bind(db_time(&now))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Deleted between read and write
            return Err(AppError::NotFound("Magazine not found".to_string()));
        }

        Ok(Magazine {
            id: existing.id,
            image_file,
            owner,
            title: title.unwrap_or_default(),
            description,
            likes,
            is_published,
            created_at,
            updated_at: now,
        })
    }

    /// Permanently delete a magazine.
    pub async fn delete_magazine(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM magazines WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Magazine not found".to_string()));
        }

        Ok(())
    }
}

// Helper functions for row conversion

/// Fixed-width UTC text so that string order in SQLite equals time order.
fn db_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_db_time(s: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            tracing::error!("Corrupt timestamp {:?} in database: {}", s, e);
            AppError::Internal(format!("Corrupt timestamp: {}", e))
        })
}

fn admin_from_row(row: &sqlx::sqlite::SqliteRow) -> Admin {
    Admin { id: row.get("id") }
}

fn magazine_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Magazine, AppError> {
    let is_published: i32 = row.get("is_published");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Magazine {
        id: row.get("id"),
        image_file: row.get("image_file"),
        owner: row.get("owner"),
        title: row.get("title"),
        description: row.get("description"),
        likes: row.get("likes"),
        is_published: is_published != 0,
        created_at: parse_db_time(&created_at)?,
        updated_at: parse_db_time(&updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let repo = Repository::new(pool);
        repo.ensure_admin("adminA").await.unwrap();
        (repo, temp_dir)
    }

    fn request(id: &str, created_at: Option<DateTime<Utc>>) -> CreateMagazineRequest {
        CreateMagazineRequest {
            id: Some(id.to_string()),
            owner: Some("adminA".to_string()),
            title: Some(format!("Issue {}", id)),
            created_at,
            ..Default::default()
        }
    }

    #[test]
    fn test_db_time_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let b = a + Duration::microseconds(1);
        assert_eq!(db_time(&a), "2024-02-01T00:00:00.000000Z");
        assert!(db_time(&a) < db_time(&b));
        assert_eq!(parse_db_time(&db_time(&b)).unwrap(), b);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (repo, _dir) = repo().await;
        assert!(!repo.ensure_admin("adminA").await.unwrap());
        assert!(repo.ensure_admin("adminB").await.unwrap());
        assert!(repo.find_admin("adminB").await.unwrap().is_some());
        assert!(repo.find_admin("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_between_respects_window_edges() {
        let (repo, _dir) = repo().await;
        let window = MonthWindow::containing(&Utc.with_ymd_and_hms(2024, 2, 14, 12, 0, 0).unwrap())
            .unwrap();

        repo.create_magazine(&request("first", Some(window.start))).await.unwrap();
        repo.create_magazine(&request("last", Some(window.end - Duration::microseconds(1))))
            .await
            .unwrap();
        repo.create_magazine(&request("before", Some(window.start - Duration::seconds(1))))
            .await
            .unwrap();
        repo.create_magazine(&request("after", Some(window.end))).await.unwrap();

        let ids: Vec<String> = repo
            .list_magazines_between(&window)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["first".to_string(), "last".to_string()]);
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (repo, _dir) = repo().await;
        let before = Utc::now() - Duration::seconds(1);
        let created = repo
            .create_magazine(&CreateMagazineRequest {
                title: Some("Untitled".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(uuid::Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.likes, 0);
        assert!(!created.is_published);
        assert!(created.created_at >= before);

        let fetched = repo.get_magazine(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_create_without_title_is_store_failure() {
        let (repo, _dir) = repo().await;
        let err = repo
            .create_magazine(&CreateMagazineRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_create_with_unknown_owner_is_store_failure() {
        let (repo, _dir) = repo().await;
        let mut req = request("m1", None);
        req.owner = Some("ghost".to_string());
        let err = repo.create_magazine(&req).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let (repo, _dir) = repo().await;
        repo.create_magazine(&request("m1", None)).await.unwrap();
        let err = repo.create_magazine(&request("m1", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let (repo, _dir) = repo().await;
        let err = repo
            .update_magazine("missing", &UpdateMagazineRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = repo.delete_magazine("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let (repo, _dir) = repo().await;
        assert!(repo.health_check().await.is_ok());
        repo.close().await;
        assert!(repo.health_check().await.is_err());
    }
}

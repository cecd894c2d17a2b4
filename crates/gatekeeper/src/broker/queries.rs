//! Permission table queries.

use gatekeeper_core::db::{DatabaseError, unix_timestamp};
use gatekeeper_core::{GroupView, Permissions};
use sqlx::{Pool, Sqlite};

use super::BrokerError;

/// A stored permission record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PermissionRow {
    pub subject_id: String,
    pub grantee_id: String,
    pub permissions: String,
    pub updated_at: i64,
}

impl PermissionRow {
    pub fn decode(&self) -> Result<Permissions, BrokerError> {
        Permissions::from_json(self.permissions.as_bytes()).map_err(|e| {
            BrokerError::Corrupt(format!(
                "{} -> {}: {e}",
                self.grantee_id, self.subject_id
            ))
        })
    }
}

// =========================================================================
// Reads
// =========================================================================

pub async fn get_record(
    pool: &Pool<Sqlite>,
    grantee_id: &str,
    subject_id: &str,
) -> Result<Option<PermissionRow>, DatabaseError> {
    Ok(sqlx::query_as::<_, PermissionRow>(
        "SELECT * FROM permissions WHERE subject_id = ? AND grantee_id = ?",
    )
    .bind(subject_id)
    .bind(grantee_id)
    .fetch_optional(pool)
    .await?)
}

/// Records granted over `subject_id`.
pub async fn list_for_subject(
    pool: &Pool<Sqlite>,
    subject_id: &str,
) -> Result<Vec<PermissionRow>, DatabaseError> {
    Ok(sqlx::query_as::<_, PermissionRow>(
        "SELECT * FROM permissions WHERE subject_id = ? ORDER BY grantee_id",
    )
    .bind(subject_id)
    .fetch_all(pool)
    .await?)
}

/// Records held by `grantee_id`.
pub async fn list_for_grantee(
    pool: &Pool<Sqlite>,
    grantee_id: &str,
) -> Result<Vec<PermissionRow>, DatabaseError> {
    Ok(sqlx::query_as::<_, PermissionRow>(
        "SELECT * FROM permissions WHERE grantee_id = ? ORDER BY subject_id",
    )
    .bind(grantee_id)
    .fetch_all(pool)
    .await?)
}

// =========================================================================
// Writes
// =========================================================================

pub async fn upsert_record(
    pool: &Pool<Sqlite>,
    grantee_id: &str,
    subject_id: &str,
    permissions: &str,
) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO permissions (subject_id, grantee_id, permissions, updated_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(subject_id, grantee_id) DO UPDATE SET permissions = excluded.permissions, updated_at = excluded.updated_at",
    )
    .bind(subject_id)
    .bind(grantee_id)
    .bind(permissions)
    .bind(unix_timestamp())
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether a record was removed.
pub async fn delete_record(
    pool: &Pool<Sqlite>,
    grantee_id: &str,
    subject_id: &str,
) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM permissions WHERE subject_id = ? AND grantee_id = ?")
        .bind(subject_id)
        .bind(grantee_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Fold rows into a view keyed by `key`, seeded with the addressed user's
/// implicit root entry.
pub fn group_view(
    rows: &[PermissionRow],
    own_id: &str,
    key: impl Fn(&PermissionRow) -> &str,
) -> Result<GroupView, BrokerError> {
    let mut view = GroupView::new();
    view.insert(own_id.to_string(), Permissions::root());
    for row in rows.iter().filter(|row| key(row) != own_id) {
        let permissions = row.decode()?;
        if !permissions.is_empty() {
            view.insert(key(row).to_string(), permissions);
        }
    }
    Ok(view)
}

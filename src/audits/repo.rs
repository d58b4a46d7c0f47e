use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Scheduled visit. `location` is free text, deliberately not a reference
/// into the client registry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Audit {
    pub id: Uuid,
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_date: OffsetDateTime,
    pub location: String,
    pub auditor_id: Uuid,
    pub status: AuditStatus,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

pub(crate) const AUDIT_COLUMNS: &str =
    "id, title, scheduled_date, location, auditor_id, status, notes, created_at, updated_at";

/// Full collection, soonest first; search and status filtering happen in
/// memory on top of this.
pub async fn list_audits(db: &PgPool) -> anyhow::Result<Vec<Audit>> {
    let rows = sqlx::query_as::<_, Audit>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits ORDER BY scheduled_date ASC"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_audit(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Audit>> {
    let row = sqlx::query_as::<_, Audit>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn update_audit(
    db: &PgPool,
    id: Uuid,
    title: &str,
    scheduled_date: OffsetDateTime,
    location: &str,
    notes: Option<&str>,
) -> anyhow::Result<Option<Audit>> {
    let row = sqlx::query_as::<_, Audit>(&format!(
        r#"
        UPDATE audits
        SET title = $2, scheduled_date = $3, location = $4, notes = $5, updated_at = now()
        WHERE id = $1
        RETURNING {AUDIT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(title)
    .bind(scheduled_date)
    .bind(location)
    .bind(notes)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

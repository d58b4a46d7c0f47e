use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo::{Profile, PROFILE_COLUMNS};

/// All auditor profiles ordered by name; filtering happens in memory.
pub async fn list_auditors(db: &PgPool) -> anyhow::Result<Vec<Profile>> {
    let rows = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = 'auditor' ORDER BY name"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Flip is_active, returning the updated profile.
pub async fn toggle_active(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Profile>> {
    let row = sqlx::query_as::<_, Profile>(&format!(
        r#"
        UPDATE profiles
        SET is_active = NOT is_active
        WHERE id = $1 AND role = 'auditor'
        RETURNING {PROFILE_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Delete an auditor. Audits referencing the profile make the FK restrict
/// the delete; the caller maps that to the linked-records error.
pub async fn delete_auditor(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM profiles WHERE id = $1 AND role = 'auditor'")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

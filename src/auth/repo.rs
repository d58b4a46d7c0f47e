use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Capability set checked per operation; admin-only routes extract
/// `RequireAdmin` instead of branching in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Auditor,
}

/// Profile record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub whatsapp: Option<String>,
    pub role: Role,
    pub is_active: bool,
    /// Currently assigned pending audits; maintained transactionally by the
    /// audit lifecycle.
    pub audit_count: i32,
    pub max_audits: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub(crate) const PROFILE_COLUMNS: &str = "id, name, email, password_hash, whatsapp, role, is_active, \
                               audit_count, max_audits, created_at";

impl Profile {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(profile)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        whatsapp: Option<&str>,
        role: Role,
    ) -> Result<Profile, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (name, email, password_hash, whatsapp, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(whatsapp)
        .bind(role)
        .fetch_one(db)
        .await
    }
}

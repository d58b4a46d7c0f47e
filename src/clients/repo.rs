use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::clients::dto::ClientPayload;

/// Establishment being audited. Independent lifecycle from audits; the
/// audit's location stays free text on purpose.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub business_hours: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub max_audits_per_month: i32,
    pub requires_special_training: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

const CLIENT_COLUMNS: &str = "id, name, address, city, state, postal_code, contact_name, \
                              contact_email, contact_phone, business_hours, notes, is_active, \
                              max_audits_per_month, requires_special_training, created_at, \
                              updated_at";

pub async fn list_clients(db: &PgPool) -> anyhow::Result<Vec<Client>> {
    let rows = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_client(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Client>> {
    let row = sqlx::query_as::<_, Client>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert_client(db: &PgPool, payload: &ClientPayload) -> anyhow::Result<Client> {
    let row = sqlx::query_as::<_, Client>(&format!(
        r#"
        INSERT INTO clients (name, address, city, state, postal_code, contact_name,
                             contact_email, contact_phone, business_hours, notes,
                             is_active, max_audits_per_month, requires_special_training)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {CLIENT_COLUMNS}
        "#
    ))
    .bind(&payload.name)
    .bind(&payload.address)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.postal_code)
    .bind(&payload.contact_name)
    .bind(&payload.contact_email)
    .bind(&payload.contact_phone)
    .bind(&payload.business_hours)
    .bind(&payload.notes)
    .bind(payload.is_active)
    .bind(payload.max_audits_per_month)
    .bind(payload.requires_special_training)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn update_client(
    db: &PgPool,
    id: Uuid,
    payload: &ClientPayload,
) -> anyhow::Result<Option<Client>> {
    let row = sqlx::query_as::<_, Client>(&format!(
        r#"
        UPDATE clients
        SET name = $2, address = $3, city = $4, state = $5, postal_code = $6,
            contact_name = $7, contact_email = $8, contact_phone = $9,
            business_hours = $10, notes = $11, is_active = $12,
            max_audits_per_month = $13, requires_special_training = $14,
            updated_at = now()
        WHERE id = $1
        RETURNING {CLIENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.address)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.postal_code)
    .bind(&payload.contact_name)
    .bind(&payload.contact_email)
    .bind(&payload.contact_phone)
    .bind(&payload.business_hours)
    .bind(&payload.notes)
    .bind(payload.is_active)
    .bind(payload.max_audits_per_month)
    .bind(payload.requires_special_training)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete_client(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

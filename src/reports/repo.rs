use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

/// Fixed consumption checklist filled during the visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionChecklist {
    #[serde(default)]
    pub entrada: bool,
    #[serde(default)]
    pub prato_principal: bool,
    #[serde(default)]
    pub bebida: bool,
    #[serde(default)]
    pub sobremesa: bool,
}

/// Fixed checklist of the four mandatory photo subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotosChecklist {
    #[serde(default)]
    pub atendentes: bool,
    #[serde(default)]
    pub fachada: bool,
    #[serde(default)]
    pub nota_fiscal: bool,
    #[serde(default)]
    pub banheiro: bool,
}

/// One report per audit, inserted in the same transaction that flips the
/// audit to completed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditReport {
    pub id: Uuid,
    pub audit_id: Uuid,
    pub arrival_time: String,
    pub departure_time: String,
    pub total_value: f64,
    pub receipt_number: String,
    pub consumption_checklist: Json<ConsumptionChecklist>,
    pub photos_checklist: Json<PhotosChecklist>,
    pub notes: String,
    pub nonconformities: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Photo evidence blob reference, keyed under the audit's namespace.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditPhoto {
    pub id: Uuid,
    pub audit_id: Uuid,
    pub storage_key: String,
    pub url: String,
    pub photo_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const REPORT_COLUMNS: &str = "id, audit_id, arrival_time, departure_time, total_value, \
                              receipt_number, consumption_checklist, photos_checklist, notes, \
                              nonconformities, created_at";

const PHOTO_COLUMNS: &str = "id, audit_id, storage_key, url, photo_type, created_at";

pub async fn find_report_by_audit(
    db: &PgPool,
    audit_id: Uuid,
) -> anyhow::Result<Option<AuditReport>> {
    let row = sqlx::query_as::<_, AuditReport>(&format!(
        "SELECT {REPORT_COLUMNS} FROM audit_reports WHERE audit_id = $1"
    ))
    .bind(audit_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list_photos(db: &PgPool, audit_id: Uuid) -> anyhow::Result<Vec<AuditPhoto>> {
    let rows = sqlx::query_as::<_, AuditPhoto>(&format!(
        "SELECT {PHOTO_COLUMNS} FROM audit_photos WHERE audit_id = $1 ORDER BY created_at ASC"
    ))
    .bind(audit_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_photos_tx(
    tx: &mut Transaction<'_, Postgres>,
    audit_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM audit_photos WHERE audit_id = $1")
            .bind(audit_id)
            .fetch_one(&mut **tx)
            .await?;
    Ok(count)
}

/// Insert a photo row within the upload transaction.
pub async fn insert_photo_tx(
    tx: &mut Transaction<'_, Postgres>,
    photo_id: Uuid,
    audit_id: Uuid,
    storage_key: &str,
    url: &str,
    photo_type: &str,
) -> Result<AuditPhoto, sqlx::Error> {
    sqlx::query_as::<_, AuditPhoto>(&format!(
        r#"
        INSERT INTO audit_photos (id, audit_id, storage_key, url, photo_type)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {PHOTO_COLUMNS}
        "#
    ))
    .bind(photo_id)
    .bind(audit_id)
    .bind(storage_key)
    .bind(url)
    .bind(photo_type)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_photo(
    db: &PgPool,
    audit_id: Uuid,
    photo_id: Uuid,
) -> anyhow::Result<Option<AuditPhoto>> {
    let row = sqlx::query_as::<_, AuditPhoto>(&format!(
        "SELECT {PHOTO_COLUMNS} FROM audit_photos WHERE id = $1 AND audit_id = $2"
    ))
    .bind(photo_id)
    .bind(audit_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete_photo(db: &PgPool, photo_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM audit_photos WHERE id = $1")
        .bind(photo_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

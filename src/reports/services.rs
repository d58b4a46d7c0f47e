use bytes::Bytes;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audits::repo::{Audit, AuditStatus, AUDIT_COLUMNS};
use crate::errors::ApiError;
use crate::reports::dto::SubmitReportRequest;
use crate::reports::repo::{self, AuditPhoto, AuditReport};
use crate::state::AppState;

pub const MAX_PHOTOS: i64 = 4;
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// One incoming multipart file part.
pub struct PhotoUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

pub(crate) fn ext_from_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Photos can only change while the visit is still open.
fn photo_mutation_gate(status: AuditStatus) -> Result<(), ApiError> {
    if status != AuditStatus::Pending {
        return Err(ApiError::Conflict(
            "Apenas auditorias pendentes podem ter fotos alteradas".into(),
        ));
    }
    Ok(())
}

fn photo_cap_gate(existing: i64, incoming: usize) -> Result<(), ApiError> {
    if existing + incoming as i64 > MAX_PHOTOS {
        return Err(ApiError::validation(
            "Limite máximo de 4 fotos por relatório",
        ));
    }
    Ok(())
}

/// Submission gate over the locked audit row and its photo count.
fn submission_gate(status: AuditStatus, photos: i64) -> Result<(), ApiError> {
    match status {
        AuditStatus::Pending => {}
        AuditStatus::Completed => {
            return Err(ApiError::Conflict(
                "Já existe um relatório para esta auditoria".into(),
            ))
        }
        AuditStatus::Cancelled => {
            return Err(ApiError::Conflict("Esta auditoria foi cancelada".into()))
        }
    }
    if photos != MAX_PHOTOS {
        return Err(ApiError::validation(
            "É necessário enviar todas as fotos obrigatórias",
        ));
    }
    Ok(())
}

/// Submit the visit report. The insert, the status flip to completed and the
/// release of the auditor's slot happen in one transaction, so a crash in
/// between cannot leave a completed audit without a report or vice versa.
pub async fn submit_report(
    db: &PgPool,
    audit_id: Uuid,
    req: &SubmitReportRequest,
) -> Result<AuditReport, ApiError> {
    req.validate()?;

    let mut tx = db.begin().await?;

    let audit = sqlx::query_as::<_, Audit>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1 FOR UPDATE"
    ))
    .bind(audit_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(ApiError::not_found)?;

    let photos = repo::count_photos_tx(&mut tx, audit_id).await?;
    if let Err(e) = submission_gate(audit.status, photos) {
        warn!(audit_id = %audit_id, status = ?audit.status, photos, "report submission rejected");
        return Err(e);
    }

    let report = sqlx::query_as::<_, AuditReport>(
        r#"
        INSERT INTO audit_reports
            (audit_id, arrival_time, departure_time, total_value, receipt_number,
             consumption_checklist, photos_checklist, notes, nonconformities)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, audit_id, arrival_time, departure_time, total_value, receipt_number,
                  consumption_checklist, photos_checklist, notes, nonconformities, created_at
        "#,
    )
    .bind(audit_id)
    .bind(req.arrival_time.trim())
    .bind(req.departure_time.trim())
    .bind(req.total_value)
    .bind(req.receipt_number.trim())
    .bind(sqlx::types::Json(&req.consumption_checklist))
    .bind(sqlx::types::Json(&req.photos_checklist))
    .bind(req.notes.trim())
    .bind(req.nonconformities.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE audits SET status = 'completed', updated_at = now() WHERE id = $1")
        .bind(audit_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE profiles SET audit_count = GREATEST(audit_count - 1, 0) WHERE id = $1")
        .bind(audit.auditor_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(audit_id = %audit_id, report_id = %report.id, "report submitted, audit completed");
    Ok(report)
}

/// Upload photo evidence for an audit. The audit row is locked and the
/// existing rows re-counted inside the same transaction that inserts the new
/// ones, so two concurrent batches cannot both slip under the cap. Blobs are
/// written while the lock is held; a failed write removes the blobs already
/// stored in this batch before returning.
pub async fn upload_photos(
    state: &AppState,
    audit_id: Uuid,
    uploads: Vec<PhotoUpload>,
) -> Result<Vec<AuditPhoto>, ApiError> {
    if uploads.is_empty() {
        return Err(ApiError::validation("Nenhum arquivo enviado"));
    }

    let mut staged = Vec::with_capacity(uploads.len());
    for upload in &uploads {
        if upload.body.len() > MAX_PHOTO_BYTES {
            let name = upload.file_name.as_deref().unwrap_or("enviado");
            return Err(ApiError::validation(format!(
                "Arquivo {name} excede o limite de 10MB"
            )));
        }
        let ext = ext_from_mime(&upload.content_type)
            .ok_or_else(|| ApiError::validation("Formato de imagem não suportado"))?;
        let photo_id = Uuid::new_v4();
        staged.push((photo_id, format!("{audit_id}/{photo_id}.{ext}")));
    }

    let mut tx = state.db.begin().await?;

    let audit = sqlx::query_as::<_, Audit>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1 FOR UPDATE"
    ))
    .bind(audit_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(ApiError::not_found)?;
    photo_mutation_gate(audit.status)?;

    let existing = repo::count_photos_tx(&mut tx, audit_id).await?;
    photo_cap_gate(existing, uploads.len())?;

    for (index, ((_, key), upload)) in staged.iter().zip(&uploads).enumerate() {
        if let Err(e) = state
            .storage
            .put_object(key, upload.body.clone(), &upload.content_type)
            .await
        {
            for (_, stored) in &staged[..index] {
                if let Err(cleanup) = state.storage.delete_object(stored).await {
                    warn!(error = %cleanup, key = %stored, "orphaned blob after failed upload");
                }
            }
            return Err(ApiError::Internal(e));
        }
    }

    let mut photos = Vec::with_capacity(staged.len());
    for (photo_id, key) in &staged {
        let url = state.storage.public_url(key);
        let photo =
            repo::insert_photo_tx(&mut tx, *photo_id, audit_id, key, &url, "evidence").await?;
        photos.push(photo);
    }
    tx.commit().await?;

    info!(audit_id = %audit_id, count = photos.len(), "photos uploaded");
    Ok(photos)
}

/// Remove a single photo: the blob goes first, then the row. Only pending
/// audits accept the removal; the checklist state is untouched.
pub async fn remove_photo(
    state: &AppState,
    audit_id: Uuid,
    photo_id: Uuid,
) -> Result<(), ApiError> {
    let audit = crate::audits::repo::find_audit(&state.db, audit_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(ApiError::not_found)?;
    photo_mutation_gate(audit.status)?;

    let photo = repo::find_photo(&state.db, audit_id, photo_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(ApiError::not_found)?;

    state
        .storage
        .delete_object(&photo.storage_key)
        .await
        .map_err(ApiError::Internal)?;

    repo::delete_photo(&state.db, photo_id).await?;
    info!(audit_id = %audit_id, photo_id = %photo_id, "photo removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_image_mimes_map_to_extensions() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/pdf"), None);
        assert_eq!(ext_from_mime("text/plain"), None);
    }

    #[test]
    fn cap_counts_existing_rows_against_the_incoming_batch() {
        assert!(photo_cap_gate(0, 4).is_ok());
        assert!(photo_cap_gate(2, 2).is_ok());
        let err = photo_cap_gate(2, 3).unwrap_err();
        assert_eq!(err.to_string(), "Limite máximo de 4 fotos por relatório");
        assert!(photo_cap_gate(4, 1).is_err());
    }

    #[test]
    fn photos_are_frozen_once_the_audit_leaves_pending() {
        assert!(photo_mutation_gate(AuditStatus::Pending).is_ok());
        for status in [AuditStatus::Completed, AuditStatus::Cancelled] {
            assert!(matches!(
                photo_mutation_gate(status),
                Err(ApiError::Conflict(_))
            ));
        }
    }

    #[test]
    fn submission_requires_exactly_four_photos() {
        for photos in [0, 3, 5] {
            let err = submission_gate(AuditStatus::Pending, photos).unwrap_err();
            assert_eq!(
                err.to_string(),
                "É necessário enviar todas as fotos obrigatórias"
            );
        }
        assert!(submission_gate(AuditStatus::Pending, 4).is_ok());
    }

    #[test]
    fn submission_conflicts_match_the_audit_state() {
        let err = submission_gate(AuditStatus::Completed, 4).unwrap_err();
        assert_eq!(err.to_string(), "Já existe um relatório para esta auditoria");
        let err = submission_gate(AuditStatus::Cancelled, 4).unwrap_err();
        assert_eq!(err.to_string(), "Esta auditoria foi cancelada");
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected_before_any_blob_write() {
        let state = AppState::fake();
        let audit_id = Uuid::new_v4();
        let uploads = vec![PhotoUpload {
            file_name: Some("fachada.jpg".into()),
            content_type: "image/jpeg".into(),
            body: Bytes::from(vec![0u8; MAX_PHOTO_BYTES + 1]),
        }];

        let err = upload_photos(&state, audit_id, uploads).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.contains("fachada.jpg")));

        let keys = state.storage.list_keys(&format!("{audit_id}/")).await.unwrap();
        assert!(keys.is_empty());
    }
}

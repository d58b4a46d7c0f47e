use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::audits::repo::{find_audit, Audit};
use crate::auth::repo::{Profile, Role};
use crate::auth::services::CurrentUser;
use crate::errors::ApiError;
use crate::reports::dto::SubmitReportRequest;
use crate::reports::repo::{self, AuditPhoto, AuditReport};
use crate::reports::services::{self, PhotoUpload, MAX_PHOTOS, MAX_PHOTO_BYTES};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audits/:id/report", post(submit_report))
        .route("/audits/:id/photos", get(list_photos).post(upload_photos))
        .route(
            "/audits/:id/photos/:photo_id",
            axum::routing::delete(delete_photo),
        )
        // Four photos of up to 10MB each plus multipart framing.
        .layer(DefaultBodyLimit::max(MAX_PHOTOS as usize * MAX_PHOTO_BYTES + 1024 * 1024))
}

/// Report and photo operations belong to the assigned auditor; admins may
/// act on any audit.
fn authorize(profile: &Profile, audit: &Audit) -> Result<(), ApiError> {
    if profile.role == Role::Admin || audit.auditor_id == profile.id {
        Ok(())
    } else {
        Err(ApiError::forbidden())
    }
}

async fn load_audit(state: &AppState, id: Uuid) -> Result<Audit, ApiError> {
    find_audit(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(ApiError::not_found)
}

#[instrument(skip(state, profile, req))]
async fn submit_report(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitReportRequest>,
) -> Result<(StatusCode, Json<AuditReport>), ApiError> {
    let audit = load_audit(&state, id).await?;
    authorize(&profile, &audit)?;
    let report = services::submit_report(&state.db, id, &req).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[instrument(skip(state, profile))]
async fn list_photos(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditPhoto>>, ApiError> {
    let audit = load_audit(&state, id).await?;
    authorize(&profile, &audit)?;
    let photos = repo::list_photos(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(photos))
}

#[instrument(skip(state, profile, multipart))]
async fn upload_photos(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<AuditPhoto>>), ApiError> {
    let audit = load_audit(&state, id).await?;
    authorize(&profile, &audit)?;

    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.to_string()))?
    {
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::validation("Formato de imagem não suportado"))?;
        let file_name = field.file_name().map(str::to_string);
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(e.to_string()))?;
        uploads.push(PhotoUpload {
            file_name,
            content_type,
            body,
        });
    }

    let photos = services::upload_photos(&state, id, uploads).await?;
    Ok((StatusCode::CREATED, Json(photos)))
}

#[instrument(skip(state, profile))]
async fn delete_photo(
    State(state): State<AppState>,
    CurrentUser(profile): CurrentUser,
    Path((id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let audit = load_audit(&state, id).await?;
    authorize(&profile, &audit)?;
    services::remove_photo(&state, id, photo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audits::repo::AuditStatus;
    use time::OffsetDateTime;

    fn profile(role: Role, id: Uuid) -> Profile {
        Profile {
            id,
            name: "Maria Souza".into(),
            email: "maria@exemplo.com".into(),
            password_hash: "x".into(),
            whatsapp: None,
            role,
            is_active: true,
            audit_count: 0,
            max_audits: 3,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn audit_for(auditor_id: Uuid) -> Audit {
        let now = OffsetDateTime::now_utc();
        Audit {
            id: Uuid::new_v4(),
            title: "Auditoria Centro".into(),
            scheduled_date: now,
            location: "Rua Augusta, 500".into(),
            auditor_id,
            status: AuditStatus::Pending,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn assigned_auditor_and_admin_are_authorized() {
        let auditor_id = Uuid::new_v4();
        let audit = audit_for(auditor_id);
        assert!(authorize(&profile(Role::Auditor, auditor_id), &audit).is_ok());
        assert!(authorize(&profile(Role::Admin, Uuid::new_v4()), &audit).is_ok());
    }

    #[test]
    fn another_auditor_is_forbidden() {
        let audit = audit_for(Uuid::new_v4());
        let err = authorize(&profile(Role::Auditor, Uuid::new_v4()), &audit).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}

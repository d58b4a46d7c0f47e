use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::Month;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    audits::{
        calendar,
        dto::{
            validate_audit_fields, AuditDetails, AuditorSummary, CalendarDay, CalendarQuery,
            CalendarResponse, CreateAuditRequest, UpdateAuditRequest,
        },
        repo::{self, Audit, AuditStatus},
        services,
    },
    auth::{
        repo::Profile,
        services::{CurrentUser, RequireAdmin},
    },
    errors::ApiError,
    filtering::{self, Filterable, ListQuery},
    reports,
    state::AppState,
};

impl Filterable for Audit {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.location.as_str()]
    }

    // On audit lists "active" means still pending.
    fn is_active_like(&self) -> bool {
        self.status == AuditStatus::Pending
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/audits", get(list_audits).post(create_audit))
        .route("/audits/calendar", get(calendar_view))
        .route(
            "/audits/:id",
            get(get_audit).put(update_audit).delete(delete_audit),
        )
        .route("/audits/:id/cancel", post(cancel_audit))
}

#[instrument(skip(state, _user))]
pub async fn list_audits(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Audit>>, ApiError> {
    let audits = repo::list_audits(&state.db).await?;
    Ok(Json(filtering::apply(audits, &query)))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_audit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<CreateAuditRequest>,
) -> Result<(StatusCode, Json<Audit>), ApiError> {
    validate_audit_fields(&payload.title, &payload.location)?;
    let audit = services::create_audit(&state.db, &payload).await?;
    info!(admin_id = %admin.id, audit_id = %audit.id, "audit scheduled");
    Ok((StatusCode::CREATED, Json(audit)))
}

#[instrument(skip(state, _user))]
pub async fn get_audit(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AuditDetails>, ApiError> {
    let audit = repo::find_audit(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;

    let auditor = Profile::find_by_id(&state.db, audit.auditor_id)
        .await?
        .map(|p| AuditorSummary {
            id: p.id,
            name: p.name,
            email: p.email,
        });
    let report = reports::repo::find_report_by_audit(&state.db, id).await?;
    let photos = reports::repo::list_photos(&state.db, id).await?;

    Ok(Json(AuditDetails {
        audit,
        auditor,
        report,
        photos,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_audit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAuditRequest>,
) -> Result<Json<Audit>, ApiError> {
    validate_audit_fields(&payload.title, &payload.location)?;
    let audit = repo::update_audit(
        &state.db,
        id,
        payload.title.trim(),
        payload.scheduled_date,
        payload.location.trim(),
        payload.notes.as_deref(),
    )
    .await?
    .ok_or_else(ApiError::not_found)?;
    info!(admin_id = %admin.id, audit_id = %id, "audit updated");
    Ok(Json(audit))
}

#[instrument(skip(state, admin))]
pub async fn cancel_audit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Audit>, ApiError> {
    let audit = services::cancel_audit(&state.db, id).await?;
    info!(admin_id = %admin.id, audit_id = %id, "audit cancelled by admin");
    Ok(Json(audit))
}

#[instrument(skip(state, admin))]
pub async fn delete_audit(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    services::delete_audit(&state, id).await?;
    info!(admin_id = %admin.id, audit_id = %id, "audit deleted by admin");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[instrument(skip(state, _user))]
pub async fn calendar_view(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, ApiError> {
    let month = Month::try_from(query.month).map_err(|_| ApiError::validation("Mês inválido"))?;
    let grid = calendar::month_grid(query.year, month)
        .map_err(|_| ApiError::validation("Data inválida"))?;

    let audits = repo::list_audits(&state.db).await?;
    let audits = filtering::apply(
        audits,
        &ListQuery {
            search: query.search.clone(),
            filter: query.filter,
        },
    );

    let days: Vec<CalendarDay> = grid
        .iter()
        .map(|day| CalendarDay {
            date: day.to_string(),
            in_month: day.year() == query.year && day.month() == month,
            audits: calendar::day_audits(&audits, *day)
                .into_iter()
                .cloned()
                .collect(),
        })
        .collect();

    let weeks = days.chunks(7).map(|week| week.to_vec()).collect();
    Ok(Json(CalendarResponse {
        year: query.year,
        month: query.month,
        weeks,
    }))
}

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auditors::{
        dto::{CreateAuditorRequest, CreateAuditorResponse},
        repo, services,
    },
    auth::{
        handlers::validate_signup,
        repo::{Profile, Role},
        services::{hash_password, CurrentUser, RequireAdmin},
        PublicProfile,
    },
    errors::ApiError,
    filtering::{self, Filterable, ListQuery},
    state::AppState,
};

impl Filterable for Profile {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str()];
        if let Some(phone) = &self.whatsapp {
            fields.push(phone.as_str());
        }
        fields
    }

    fn is_active_like(&self) -> bool {
        self.is_active
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auditors", get(list_auditors))
        .route("/auditors", post(create_auditor))
        .route("/auditors/:id/status", patch(toggle_status))
        .route("/auditors/:id", delete(delete_auditor))
}

#[instrument(skip(state, _user))]
pub async fn list_auditors(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PublicProfile>>, ApiError> {
    let auditors = repo::list_auditors(&state.db).await?;
    let filtered = filtering::apply(auditors, &query);
    Ok(Json(filtered.into_iter().map(PublicProfile::from).collect()))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_auditor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(mut payload): Json<CreateAuditorRequest>,
) -> Result<Json<CreateAuditorResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    validate_signup(
        &payload.name,
        &payload.email,
        &payload.password,
        payload.whatsapp.as_deref(),
    )?;

    if Profile::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Este email já está em uso".into()));
    }

    let hash = hash_password(&payload.password)?;
    let whatsapp = payload.whatsapp.as_deref().filter(|p| !p.is_empty());

    let auditor = Profile::create(
        &state.db,
        payload.name.trim(),
        &payload.email,
        &hash,
        whatsapp,
        Role::Auditor,
    )
    .await?;

    let invite = whatsapp.map(|phone| {
        services::whatsapp_invite(
            phone,
            &auditor.name,
            &auditor.email,
            &payload.password,
            &state.config.app_origin,
        )
    });

    info!(admin_id = %admin.id, auditor_id = %auditor.id, "auditor created");
    Ok(Json(CreateAuditorResponse {
        auditor: auditor.into(),
        invite,
    }))
}

#[instrument(skip(state, admin))]
pub async fn toggle_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicProfile>, ApiError> {
    let profile = repo::toggle_active(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    info!(admin_id = %admin.id, auditor_id = %id, is_active = profile.is_active, "auditor status toggled");
    Ok(Json(profile.into()))
}

#[instrument(skip(state, admin))]
pub async fn delete_auditor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repo::delete_auditor(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::not_found());
    }
    info!(admin_id = %admin.id, auditor_id = %id, "auditor deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

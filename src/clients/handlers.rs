use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::services::{CurrentUser, RequireAdmin},
    clients::{
        dto::ClientPayload,
        repo::{self, Client},
    },
    errors::ApiError,
    filtering::{self, Filterable, ListQuery},
    state::AppState,
};

impl Filterable for Client {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.city.as_str(), self.address.as_str()]
    }

    fn is_active_like(&self) -> bool {
        self.is_active
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/clients", post(create_client))
        .route("/clients/:id", get(get_client))
        .route("/clients/:id", put(update_client))
        .route("/clients/:id", delete(delete_client))
}

#[instrument(skip(state, _user))]
pub async fn list_clients(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let clients = repo::list_clients(&state.db).await?;
    Ok(Json(filtering::apply(clients, &query)))
}

#[instrument(skip(state, _user))]
pub async fn get_client(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError> {
    let client = repo::find_client(&state.db, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(client))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_client(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, ApiError> {
    payload.validate()?;
    let client = repo::insert_client(&state.db, &payload).await?;
    info!(admin_id = %admin.id, client_id = %client.id, "client created");
    Ok(Json(client))
}

#[instrument(skip(state, admin, payload))]
pub async fn update_client(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, ApiError> {
    payload.validate()?;
    let client = repo::update_client(&state.db, id, &payload)
        .await?
        .ok_or_else(ApiError::not_found)?;
    info!(admin_id = %admin.id, client_id = %id, "client updated");
    Ok(Json(client))
}

#[instrument(skip(state, admin))]
pub async fn delete_client(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = repo::delete_client(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::not_found());
    }
    info!(admin_id = %admin.id, client_id = %id, "client deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}

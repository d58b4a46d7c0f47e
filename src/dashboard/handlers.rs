use axum::{extract::State, routing::get, Json, Router};
use time::OffsetDateTime;
use tracing::instrument;

use crate::audits::repo::list_audits;
use crate::auth::services::CurrentUser;
use crate::dashboard::services::{summarize, DashboardSummary};
use crate::errors::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[instrument(skip(state, _user))]
pub async fn dashboard(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<DashboardSummary>, ApiError> {
    let audits = list_audits(&state.db).await?;
    Ok(Json(summarize(&audits, OffsetDateTime::now_utc())))
}

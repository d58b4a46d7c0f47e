use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicProfile, RefreshRequest, RegisterRequest},
        repo::{Profile, Role},
        services::{
            hash_password, is_valid_email, is_valid_whatsapp, verify_password, CurrentUser, JwtKeys,
        },
    },
    errors::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    whatsapp: Option<&str>,
) -> Result<(), ApiError> {
    if name.trim().len() < 3 {
        return Err(ApiError::validation("Nome deve ter no mínimo 3 caracteres"));
    }
    if !is_valid_email(email) {
        return Err(ApiError::validation("Email inválido"));
    }
    if password.len() < 6 {
        return Err(ApiError::validation("Senha deve ter no mínimo 6 caracteres"));
    }
    if let Some(phone) = whatsapp {
        if !phone.is_empty() && !is_valid_whatsapp(phone) {
            return Err(ApiError::validation("Formato inválido. Use (00) 00000-0000"));
        }
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    validate_signup(
        &payload.name,
        &payload.email,
        &payload.password,
        payload.whatsapp.as_deref(),
    )?;

    // Ensure email is not taken
    if Profile::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Este email já está em uso".into()));
    }

    let hash = hash_password(&payload.password)?;
    let whatsapp = payload.whatsapp.as_deref().filter(|p| !p.is_empty());

    // Public signup always creates auditors.
    let profile = Profile::create(
        &state.db,
        payload.name.trim(),
        &payload.email,
        &hash,
        whatsapp,
        Role::Auditor,
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(profile.id)?;
    let refresh_token = keys.sign_refresh(profile.id)?;

    info!(user_id = %profile.id, email = %profile.email, "auditor registered");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: profile.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        return Err(ApiError::validation("Email inválido"));
    }

    let profile = Profile::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    if !verify_password(&payload.password, &profile.password_hash)? {
        warn!(email = %payload.email, user_id = %profile.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    if !profile.is_active {
        warn!(user_id = %profile.id, "login blocked for inactive profile");
        return Err(ApiError::Forbidden(
            "Sua conta está inativa. Entre em contato com o administrador.".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(profile.id)?;
    let refresh_token = keys.sign_refresh(profile.id)?;

    info!(user_id = %profile.id, email = %profile.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: profile.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::InvalidCredentials)?;

    let profile = Profile::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(ApiError::not_found)?;

    // Issue new pair
    let access_token = keys.sign_access(profile.id)?;
    let refresh_token = keys.sign_refresh(profile.id)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: profile.into(),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(profile): CurrentUser) -> Json<PublicProfile> {
    Json(profile.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_validation_rules() {
        assert!(validate_signup("Maria", "maria@exemplo.com", "segredo", None).is_ok());
        assert!(matches!(
            validate_signup("Ma", "maria@exemplo.com", "segredo", None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_signup("Maria", "sem-arroba", "segredo", None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            validate_signup("Maria", "maria@exemplo.com", "curta", None),
            Err(ApiError::Validation(_))
        ));
        assert!(validate_signup(
            "Maria",
            "maria@exemplo.com",
            "segredo",
            Some("(11) 98765-4321")
        )
        .is_ok());
        assert!(matches!(
            validate_signup("Maria", "maria@exemplo.com", "segredo", Some("11987654321")),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn public_profile_hides_password_hash() {
        let profile = PublicProfile {
            id: uuid::Uuid::new_v4(),
            name: "Maria Silva".into(),
            email: "maria@exemplo.com".into(),
            whatsapp: None,
            role: Role::Auditor,
            is_active: true,
            audit_count: 0,
            max_audits: 3,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("maria@exemplo.com"));
        assert!(!json.contains("password"));
    }
}

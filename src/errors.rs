use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// User-facing error taxonomy. Every variant carries the localized message
/// the client renders; anything unrecognized collapses into `Internal` with
/// a generic fallback.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Email ou senha incorretos")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Ocorreu um erro inesperado. Tente novamente.")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Você não tem permissão para realizar esta ação".into())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Nenhum registro encontrado".into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!(error = %source, "internal error");
        }
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(e)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => Self::not_found(),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // unique_violation
                Some("23505") => {
                    let constraint = db.constraint().unwrap_or_default();
                    if constraint.contains("profiles_email") {
                        Self::Conflict("Este email já está em uso".into())
                    } else if constraint.contains("audit_reports_audit_id") {
                        Self::Conflict("Já existe um relatório para esta auditoria".into())
                    } else {
                        Self::Internal(e.into())
                    }
                }
                // foreign_key_violation
                Some("23503") => Self::Conflict(
                    "Não é possível excluir este registro pois existem dados vinculados".into(),
                ),
                // insufficient_privilege
                Some("42501") => Self::forbidden(),
                _ => Self::Internal(e.into()),
            },
            _ => Self::Internal(e.into()),
        }
    }
}

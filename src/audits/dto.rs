use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::audits::repo::Audit;
use crate::errors::ApiError;
use crate::reports::repo::{AuditPhoto, AuditReport};

#[derive(Debug, Deserialize)]
pub struct CreateAuditRequest {
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_date: OffsetDateTime,
    pub location: String,
    pub auditor_id: Uuid,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAuditRequest {
    pub title: String,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_date: OffsetDateTime,
    pub location: String,
    pub notes: Option<String>,
}

pub(crate) fn validate_audit_fields(title: &str, location: &str) -> Result<(), ApiError> {
    if title.trim().len() < 3 {
        return Err(ApiError::validation("Título deve ter no mínimo 3 caracteres"));
    }
    if location.trim().len() < 3 {
        return Err(ApiError::validation(
            "Localização deve ter no mínimo 3 caracteres",
        ));
    }
    Ok(())
}

/// Assigned auditor as shown on the audit details screen.
#[derive(Debug, Serialize)]
pub struct AuditorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuditDetails {
    #[serde(flatten)]
    pub audit: Audit,
    pub auditor: Option<AuditorSummary>,
    pub report: Option<AuditReport>,
    pub photos: Vec<AuditPhoto>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: i32,
    /// 1..=12
    pub month: u8,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filter: crate::filtering::StatusFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    /// ISO calendar date, e.g. "2024-03-15".
    pub date: String,
    /// Whether the day belongs to the reference month or is a leading or
    /// trailing day of an adjacent one.
    pub in_month: bool,
    pub audits: Vec<Audit>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u8,
    pub weeks: Vec<Vec<CalendarDay>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_fields_have_minimum_lengths() {
        assert!(validate_audit_fields("Auditoria SP", "Av. Paulista, 1000").is_ok());
        assert!(validate_audit_fields("Au", "Av. Paulista, 1000").is_err());
        assert!(validate_audit_fields("Auditoria SP", "SP").is_err());
    }
}

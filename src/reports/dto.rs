use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::errors::ApiError;
use crate::reports::repo::{ConsumptionChecklist, PhotosChecklist};

lazy_static! {
    static ref TIME_RE: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
}

#[derive(Debug, Deserialize)]
pub struct SubmitReportRequest {
    pub arrival_time: String,
    pub departure_time: String,
    pub total_value: f64,
    pub receipt_number: String,
    #[serde(default)]
    pub consumption_checklist: ConsumptionChecklist,
    #[serde(default)]
    pub photos_checklist: PhotosChecklist,
    pub notes: String,
    pub nonconformities: Option<String>,
}

impl SubmitReportRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !TIME_RE.is_match(self.arrival_time.trim()) {
            return Err(ApiError::validation("Horário de chegada inválido"));
        }
        if !TIME_RE.is_match(self.departure_time.trim()) {
            return Err(ApiError::validation("Horário de saída inválido"));
        }
        if !self.total_value.is_finite() || self.total_value < 0.0 {
            return Err(ApiError::validation("Valor total inválido"));
        }
        if self.receipt_number.trim().is_empty() {
            return Err(ApiError::validation(
                "Número da nota fiscal é obrigatório",
            ));
        }
        if self.notes.trim().is_empty() {
            return Err(ApiError::validation("Observações são obrigatórias"));
        }
        Ok(())
    }
}

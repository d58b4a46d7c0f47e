use serde::Deserialize;

use crate::auth::services::is_valid_email;
use crate::errors::ApiError;

/// Create/update body for a client establishment.
#[derive(Debug, Deserialize)]
pub struct ClientPayload {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub business_hours: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_max_audits_per_month")]
    pub max_audits_per_month: i32,
    #[serde(default)]
    pub requires_special_training: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_audits_per_month() -> i32 {
    4
}

impl ClientPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().len() < 3 {
            return Err(ApiError::validation("Nome deve ter no mínimo 3 caracteres"));
        }
        if self.address.trim().len() < 3 {
            return Err(ApiError::validation(
                "Endereço deve ter no mínimo 3 caracteres",
            ));
        }
        if self.city.trim().len() < 2 {
            return Err(ApiError::validation("Cidade deve ter no mínimo 2 caracteres"));
        }
        if self.state.trim().len() != 2 {
            return Err(ApiError::validation("Estado deve ter 2 caracteres"));
        }
        if let Some(email) = self.contact_email.as_deref() {
            if !email.is_empty() && !is_valid_email(email) {
                return Err(ApiError::validation("Email inválido"));
            }
        }
        if self.max_audits_per_month < 1 {
            return Err(ApiError::validation("Mínimo de 1 auditoria por mês"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> ClientPayload {
        ClientPayload {
            name: "Restaurante Central".into(),
            address: "Av. Paulista, 1000".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            postal_code: None,
            contact_name: None,
            contact_email: None,
            contact_phone: None,
            business_hours: None,
            notes: None,
            is_active: true,
            max_audits_per_month: 4,
            requires_special_training: false,
        }
    }

    #[test]
    fn accepts_valid_payload() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn state_must_be_two_letters() {
        let mut p = payload();
        p.state = "SPO".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn monthly_quota_has_a_floor() {
        let mut p = payload();
        p.max_audits_per_month = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn empty_contact_email_is_allowed() {
        let mut p = payload();
        p.contact_email = Some(String::new());
        assert!(p.validate().is_ok());
        p.contact_email = Some("sem-arroba".into());
        assert!(p.validate().is_err());
    }
}

use crate::auditors::dto::WhatsAppInvite;

/// Build the access-credentials invite sent to a freshly created auditor.
pub fn whatsapp_invite(
    phone: &str,
    name: &str,
    email: &str,
    password: &str,
    origin: &str,
) -> WhatsAppInvite {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let message = format!(
        "Olá {name}! Você foi cadastrado(a) como auditor no sistema Job Auditoria.\n\n\
         Seus dados de acesso são:\n\
         Email: {email}\n\
         Senha: {password}\n\n\
         Acesse o sistema em: {origin}"
    );
    WhatsAppInvite {
        phone: digits,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_normalizes_phone_to_digits() {
        let invite = whatsapp_invite(
            "(11) 98765-4321",
            "Maria",
            "maria@exemplo.com",
            "segredo1",
            "http://localhost:8080",
        );
        assert_eq!(invite.phone, "11987654321");
        assert!(invite.message.contains("Olá Maria!"));
        assert!(invite.message.contains("Email: maria@exemplo.com"));
        assert!(invite.message.contains("Senha: segredo1"));
        assert!(invite.message.ends_with("http://localhost:8080"));
    }
}

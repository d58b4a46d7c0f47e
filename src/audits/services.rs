use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audits::dto::CreateAuditRequest;
use crate::audits::repo::{Audit, AuditStatus, AUDIT_COLUMNS};
use crate::auth::repo::{Profile, Role, PROFILE_COLUMNS};
use crate::errors::ApiError;
use crate::state::AppState;

/// Assignment rule: the candidate must be an existing auditor profile,
/// active, and under quota at the moment of assignment.
fn assignment_gate(candidate: Option<Profile>) -> Result<Profile, ApiError> {
    let auditor = match candidate {
        Some(p) if p.role == Role::Auditor => p,
        _ => return Err(ApiError::NotFound("Auditor não encontrado".into())),
    };
    if !auditor.is_active {
        return Err(ApiError::Conflict("Este auditor está inativo".into()));
    }
    if auditor.audit_count >= auditor.max_audits {
        return Err(ApiError::Conflict(
            "Este auditor já atingiu o limite máximo de auditorias".into(),
        ));
    }
    Ok(auditor)
}

/// Create an audit. Runs in one transaction with the auditor row locked so
/// the counter and the insert cannot race.
pub async fn create_audit(db: &PgPool, req: &CreateAuditRequest) -> Result<Audit, ApiError> {
    let mut tx = db.begin().await?;

    let candidate = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1 FOR UPDATE"
    ))
    .bind(req.auditor_id)
    .fetch_optional(&mut *tx)
    .await?;

    let auditor = match assignment_gate(candidate) {
        Ok(auditor) => auditor,
        Err(e) => {
            warn!(auditor_id = %req.auditor_id, error = %e, "audit assignment rejected");
            return Err(e);
        }
    };

    sqlx::query("UPDATE profiles SET audit_count = audit_count + 1 WHERE id = $1")
        .bind(auditor.id)
        .execute(&mut *tx)
        .await?;

    let audit = sqlx::query_as::<_, Audit>(&format!(
        r#"
        INSERT INTO audits (title, scheduled_date, location, auditor_id, status, notes)
        VALUES ($1, $2, $3, $4, 'pending', $5)
        RETURNING {AUDIT_COLUMNS}
        "#
    ))
    .bind(req.title.trim())
    .bind(req.scheduled_date)
    .bind(req.location.trim())
    .bind(auditor.id)
    .bind(req.notes.as_deref())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!(audit_id = %audit.id, auditor_id = %auditor.id, "audit created");
    Ok(audit)
}

/// Admin cancellation; only pending audits cancel, and the assigned
/// auditor's counter is released in the same transaction.
pub async fn cancel_audit(db: &PgPool, id: Uuid) -> Result<Audit, ApiError> {
    let mut tx = db.begin().await?;

    let audit = sqlx::query_as::<_, Audit>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(ApiError::not_found)?;

    if audit.status != AuditStatus::Pending {
        return Err(ApiError::Conflict(
            "Apenas auditorias pendentes podem ser canceladas".into(),
        ));
    }

    let audit = sqlx::query_as::<_, Audit>(&format!(
        r#"
        UPDATE audits SET status = 'cancelled', updated_at = now()
        WHERE id = $1
        RETURNING {AUDIT_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE profiles SET audit_count = GREATEST(audit_count - 1, 0) WHERE id = $1")
        .bind(audit.auditor_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(audit_id = %id, "audit cancelled");
    Ok(audit)
}

/// Deletion cascade: the report and photo rows go with the audit row in a
/// single transaction (FK `ON DELETE CASCADE`); blobs under the audit's
/// namespace are removed afterwards. A failure while removing blobs is
/// surfaced, but the database is already consistent at that point.
pub async fn delete_audit(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    let mut tx = state.db.begin().await?;

    let audit = sqlx::query_as::<_, Audit>(&format!(
        "SELECT {AUDIT_COLUMNS} FROM audits WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(ApiError::not_found)?;

    if audit.status == AuditStatus::Pending {
        sqlx::query("UPDATE profiles SET audit_count = GREATEST(audit_count - 1, 0) WHERE id = $1")
            .bind(audit.auditor_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("DELETE FROM audits WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    remove_photo_blobs(state, id).await?;
    info!(audit_id = %id, "audit deleted");
    Ok(())
}

/// Remove every blob stored under `{audit_id}/`.
pub async fn remove_photo_blobs(state: &AppState, audit_id: Uuid) -> anyhow::Result<()> {
    let prefix = format!("{audit_id}/");
    let keys = state
        .storage
        .list_keys(&prefix)
        .await
        .context("list audit photo blobs")?;
    for key in keys {
        state
            .storage
            .delete_object(&key)
            .await
            .with_context(|| format!("delete blob {key}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use time::OffsetDateTime;

    fn auditor(role: Role, is_active: bool, audit_count: i32, max_audits: i32) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            name: "Carlos Lima".into(),
            email: "carlos@exemplo.com".into(),
            password_hash: "x".into(),
            whatsapp: None,
            role,
            is_active,
            audit_count,
            max_audits,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn assignment_accepts_an_active_auditor_under_quota() {
        let candidate = auditor(Role::Auditor, true, 2, 3);
        let id = candidate.id;
        let accepted = assignment_gate(Some(candidate)).unwrap();
        assert_eq!(accepted.id, id);
    }

    #[test]
    fn assignment_rejects_missing_or_non_auditor_profiles() {
        let err = assignment_gate(None).unwrap_err();
        assert_eq!(err.to_string(), "Auditor não encontrado");

        let err = assignment_gate(Some(auditor(Role::Admin, true, 0, 3))).unwrap_err();
        assert_eq!(err.to_string(), "Auditor não encontrado");
    }

    #[test]
    fn assignment_rejects_an_inactive_auditor() {
        let err = assignment_gate(Some(auditor(Role::Auditor, false, 0, 3))).unwrap_err();
        assert_eq!(err.to_string(), "Este auditor está inativo");
    }

    #[test]
    fn assignment_rejects_an_auditor_at_quota() {
        let err = assignment_gate(Some(auditor(Role::Auditor, true, 3, 3))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Este auditor já atingiu o limite máximo de auditorias"
        );
        assert!(matches!(
            assignment_gate(Some(auditor(Role::Auditor, true, 4, 3))),
            Err(ApiError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn remove_photo_blobs_empties_the_audit_namespace() {
        let state = AppState::fake();
        let audit_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();

        for key in [
            format!("{audit_id}/a.jpg"),
            format!("{audit_id}/b.jpg"),
            format!("{other_id}/keep.jpg"),
        ] {
            state
                .storage
                .put_object(&key, Bytes::from_static(b"img"), "image/jpeg")
                .await
                .unwrap();
        }

        remove_photo_blobs(&state, audit_id).await.unwrap();

        let gone = state.storage.list_keys(&format!("{audit_id}/")).await.unwrap();
        assert!(gone.is_empty());
        let kept = state.storage.list_keys(&format!("{other_id}/")).await.unwrap();
        assert_eq!(kept.len(), 1);
    }
}

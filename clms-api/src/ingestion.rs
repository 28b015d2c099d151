//! Capture/ingestion gateway: the shared validation core behind the
//! internal create form and the deduplicated external capture webhook.

use crate::database::leads as leads_db;
use crate::database::AsyncDbConnection;
use shared_types::{
    CaptureLeadRequest, CaptureLeadResponse, CreateLeadRequest, Lead, LeadPriority, LeadStatus,
};

pub const AUTO_CAPTURE_SOURCE: &str = "Auto-Capture";
pub const AUTO_CAPTURE_COMPANY: &str = "External Lead";
pub const AUTO_CAPTURE_NOTE: &str = "Lead auto-captured from external source";
const FIELD_FALLBACK: &str = "N/A";
const SYSTEM_ENTRY_TYPE: &str = "System";

#[derive(Debug)]
pub enum IngestError {
    Validation(String),
    Store(anyhow::Error),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Validation(msg) => write!(f, "{}", msg),
            IngestError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl From<anyhow::Error> for IngestError {
    fn from(err: anyhow::Error) -> Self {
        IngestError::Store(err)
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, IngestError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(IngestError::Validation(format!(
            "Send all required fields: name, email, source ({field} is missing)"
        ))),
    }
}

fn or_fallback(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => fallback.to_string(),
    }
}

/// Internal create: full field set, status/priority defaulting to New/Cold.
/// Unrecognized status or priority strings never reach this point; the
/// closed enums reject them at deserialization.
pub async fn create_lead(
    conn: AsyncDbConnection,
    req: CreateLeadRequest,
) -> Result<Lead, IngestError> {
    let name = required("name", req.name)?;
    let email = required("email", req.email)?;
    let source = required("source", req.source)?;

    let new_lead = leads_db::NewLead {
        name,
        email,
        source,
        phone: req.phone,
        company: or_fallback(req.company, FIELD_FALLBACK),
        job_title: or_fallback(req.job_title, FIELD_FALLBACK),
        status: req.status.unwrap_or_default(),
        priority: req.priority.unwrap_or_default(),
        next_follow_up: req.next_follow_up,
        notes: req.notes,
    };

    let id = leads_db::insert_lead(conn.clone(), new_lead).await?;
    let lead = leads_db::get_lead(conn, id)
        .await?
        .ok_or_else(|| IngestError::Store(anyhow::anyhow!("lead {} vanished after insert", id)))?;

    tracing::info!("Created lead {} ({})", lead.id, lead.email);
    Ok(lead)
}

/// External capture: reduced field set, deduplicated by exact email match.
/// Safe to call repeatedly with the same email; the repeat is a no-op that
/// reports the existing lead's id.
pub async fn capture_lead(
    conn: AsyncDbConnection,
    req: CaptureLeadRequest,
) -> Result<CaptureLeadResponse, IngestError> {
    let name = required("name", req.name)?;
    let email = required("email", req.email)?;

    if let Some(existing) = leads_db::find_lead_by_email(conn.clone(), &email).await? {
        tracing::info!(
            "Capture for {} matched existing lead {}, skipping create",
            email,
            existing
        );
        return Ok(CaptureLeadResponse {
            created: false,
            lead_id: existing,
        });
    }

    let new_lead = leads_db::NewLead {
        name,
        email,
        phone: Some(req.phone.unwrap_or_default()),
        company: or_fallback(req.company, AUTO_CAPTURE_COMPANY),
        job_title: FIELD_FALLBACK.to_string(),
        source: or_fallback(req.source, AUTO_CAPTURE_SOURCE),
        status: LeadStatus::New,
        priority: LeadPriority::Warm,
        next_follow_up: None,
        notes: req.notes,
    };

    let id = leads_db::insert_lead(conn.clone(), new_lead).await?;
    leads_db::append_log_entry(conn, id, SYSTEM_ENTRY_TYPE, AUTO_CAPTURE_NOTE, None).await?;

    tracing::info!("Captured new external lead {}", id);
    Ok(CaptureLeadResponse {
        created: true,
        lead_id: id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::leads::tests::test_db;

    fn create_request(name: Option<&str>, email: Option<&str>, source: Option<&str>) -> CreateLeadRequest {
        CreateLeadRequest {
            name: name.map(String::from),
            email: email.map(String::from),
            source: source.map(String::from),
            phone: None,
            company: None,
            job_title: None,
            status: None,
            priority: None,
            next_follow_up: None,
            notes: None,
        }
    }

    fn capture_request(name: Option<&str>, email: Option<&str>) -> CaptureLeadRequest {
        CaptureLeadRequest {
            name: name.map(String::from),
            email: email.map(String::from),
            phone: None,
            company: None,
            source: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_status_priority_and_fallbacks() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        let lead = create_lead(
            conn,
            create_request(Some("Jo"), Some("jo@x.com"), Some("Web Form")),
        )
        .await
        .unwrap();

        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.priority, LeadPriority::Cold);
        assert_eq!(lead.company, "N/A");
        assert_eq!(lead.job_title, "N/A");
        assert!(lead.communication_log.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_missing_or_blank_required_fields() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        for req in [
            create_request(None, Some("a@x.com"), Some("Referral")),
            create_request(Some("Jo"), None, Some("Referral")),
            create_request(Some("Jo"), Some("a@x.com"), None),
            create_request(Some("   "), Some("a@x.com"), Some("Referral")),
        ] {
            let err = create_lead(conn.clone(), req).await.unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)));
        }

        // Nothing was persisted by the rejected requests
        let leads = leads_db::list_leads(conn).await.unwrap();
        assert!(leads.is_empty());
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_status_and_priority() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        let mut req = create_request(Some("Jo"), Some("jo@x.com"), Some("Referral"));
        req.status = Some(LeadStatus::Negotiation);
        req.priority = Some(LeadPriority::Hot);

        let lead = create_lead(conn, req).await.unwrap();
        assert_eq!(lead.status, LeadStatus::Negotiation);
        assert_eq!(lead.priority, LeadPriority::Hot);
    }

    #[tokio::test]
    async fn test_capture_applies_documented_fallbacks() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        let resp = capture_lead(conn.clone(), capture_request(Some("Jo"), Some("jo@x.com")))
            .await
            .unwrap();
        assert!(resp.created);

        let lead = leads_db::get_lead(conn, resp.lead_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lead.source, AUTO_CAPTURE_SOURCE);
        assert_eq!(lead.company, AUTO_CAPTURE_COMPANY);
        assert_eq!(lead.phone.as_deref(), Some(""));
        assert_eq!(lead.status, LeadStatus::New);
        assert_eq!(lead.priority, LeadPriority::Warm);
        assert_eq!(lead.communication_log.len(), 1);
        assert_eq!(lead.communication_log[0].entry_type, "System");
        assert_eq!(lead.communication_log[0].note, AUTO_CAPTURE_NOTE);
    }

    #[tokio::test]
    async fn test_capture_is_idempotent_by_email() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        let first = capture_lead(conn.clone(), capture_request(Some("A"), Some("a@x.com")))
            .await
            .unwrap();
        let second = capture_lead(conn.clone(), capture_request(Some("A"), Some("a@x.com")))
            .await
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.lead_id, second.lead_id);

        let leads = leads_db::list_leads(conn).await.unwrap();
        assert_eq!(leads.len(), 1);
        // The repeat did not append a second auto-capture entry
        assert_eq!(leads[0].communication_log.len(), 1);
    }

    #[tokio::test]
    async fn test_capture_rejects_missing_name_or_email() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        for req in [
            capture_request(None, Some("a@x.com")),
            capture_request(Some("Jo"), None),
        ] {
            let err = capture_lead(conn.clone(), req).await.unwrap_err();
            assert!(matches!(err, IngestError::Validation(_)));
        }
    }
}

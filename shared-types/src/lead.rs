use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Pipeline stage of a lead. `Lost` is terminal for follow-up scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LeadStatus {
    New,
    Contacted,
    #[serde(rename = "Proposal Sent")]
    ProposalSent,
    Negotiation,
    Converted,
    Lost,
}

/// Follow-up priority of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LeadPriority {
    Hot,
    Warm,
    Cold,
}

/// A status or priority string outside the allowed value set
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {field} value: {value}")]
pub struct InvalidEnumValue {
    pub field: &'static str,
    pub value: String,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::ProposalSent => "Proposal Sent",
            LeadStatus::Negotiation => "Negotiation",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(LeadStatus::New),
            "Contacted" => Ok(LeadStatus::Contacted),
            "Proposal Sent" => Ok(LeadStatus::ProposalSent),
            "Negotiation" => Ok(LeadStatus::Negotiation),
            "Converted" => Ok(LeadStatus::Converted),
            "Lost" => Ok(LeadStatus::Lost),
            other => Err(InvalidEnumValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

impl LeadPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadPriority::Hot => "Hot",
            LeadPriority::Warm => "Warm",
            LeadPriority::Cold => "Cold",
        }
    }
}

impl std::str::FromStr for LeadPriority {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hot" => Ok(LeadPriority::Hot),
            "Warm" => Ok(LeadPriority::Warm),
            "Cold" => Ok(LeadPriority::Cold),
            other => Err(InvalidEnumValue {
                field: "priority",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LeadPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for LeadPriority {
    fn default() -> Self {
        LeadPriority::Cold
    }
}

/// One entry in a lead's communication log. Entries are append-only;
/// insertion order is the canonical chronological order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub note: String,
    /// Epoch seconds, server-assigned when the caller supplies none
    pub date: i64,
}

/// A document link attached to a lead (append-only)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AttachedDocument {
    pub id: i64,
    pub name: String,
    pub link: String,
}

/// Lead entity, the aggregate root of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub job_title: String,
    pub source: String,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    /// Epoch seconds; absent means the lead is never picked up by the scheduler
    pub next_follow_up: Option<i64>,
    pub notes: Option<String>,
    pub communication_log: Vec<CommunicationEntry>,
    pub attached_documents: Vec<AttachedDocument>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Request to create a lead from the internal form.
///
/// `name`, `email` and `source` are required but kept optional here so the
/// ingestion layer can reject missing fields with a proper validation error
/// instead of a deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub next_follow_up: Option<i64>,
    pub notes: Option<String>,
}

/// Request from the external capture webhook (reduced field set)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CaptureLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

/// Outcome of an external capture. `created` is false when a lead with the
/// same email already existed; `lead_id` then points at that lead.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CaptureLeadResponse {
    pub created: bool,
    pub lead_id: i64,
}

/// Partial update of a lead (last-write-wins)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub status: Option<LeadStatus>,
    pub priority: Option<LeadPriority>,
    pub next_follow_up: Option<i64>,
    pub notes: Option<String>,
}

/// Request to append a communication-log entry
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppendLogRequest {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub note: String,
    /// Epoch seconds; server-assigned when absent
    pub date: Option<i64>,
}

/// Request to append a document link
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppendDocumentRequest {
    pub name: String,
    pub link: String,
}

/// Response containing all leads
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeadsResponse {
    pub count: usize,
    pub data: Vec<Lead>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&LeadStatus::ProposalSent).unwrap(),
            "\"Proposal Sent\""
        );
        let parsed: LeadStatus = serde_json::from_str("\"Proposal Sent\"").unwrap();
        assert_eq!(parsed, LeadStatus::ProposalSent);
    }

    #[test]
    fn test_status_rejects_unknown_value() {
        assert!(serde_json::from_str::<LeadStatus>("\"Pending\"").is_err());
        assert!(LeadStatus::from_str("Pending").is_err());
    }

    #[test]
    fn test_priority_rejects_unknown_value() {
        assert!(serde_json::from_str::<LeadPriority>("\"Urgent\"").is_err());
        let err = LeadPriority::from_str("Urgent").unwrap_err();
        assert_eq!(err.field, "priority");
        assert_eq!(err.value, "Urgent");
    }

    #[test]
    fn test_enum_round_trip_through_store_strings() {
        for status in [
            LeadStatus::New,
            LeadStatus::Contacted,
            LeadStatus::ProposalSent,
            LeadStatus::Negotiation,
            LeadStatus::Converted,
            LeadStatus::Lost,
        ] {
            assert_eq!(LeadStatus::from_str(status.as_str()).unwrap(), status);
        }
        for priority in [LeadPriority::Hot, LeadPriority::Warm, LeadPriority::Cold] {
            assert_eq!(LeadPriority::from_str(priority.as_str()).unwrap(), priority);
        }
    }

    #[test]
    fn test_defaults() {
        assert_eq!(LeadStatus::default(), LeadStatus::New);
        assert_eq!(LeadPriority::default(), LeadPriority::Cold);
    }

    #[test]
    fn test_log_entry_wire_field_is_type() {
        let entry = CommunicationEntry {
            id: 1,
            entry_type: "Call".to_string(),
            note: "Left a voicemail".to_string(),
            date: 1_700_000_000,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "Call");
        assert_eq!(json["note"], "Left a voicemail");
    }
}

pub mod lead;

pub use lead::{
    AppendDocumentRequest, AppendLogRequest, AttachedDocument, CaptureLeadRequest,
    CaptureLeadResponse, CommunicationEntry, CreateLeadRequest, InvalidEnumValue, Lead,
    LeadPriority, LeadStatus, LeadsResponse, UpdateLeadRequest,
};

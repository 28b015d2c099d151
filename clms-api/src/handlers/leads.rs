use actix_web::{web, HttpResponse, Result as ActixResult};
use shared_types::{
    AppendDocumentRequest, AppendLogRequest, CaptureLeadRequest, CreateLeadRequest, LeadsResponse,
    UpdateLeadRequest,
};
use std::sync::Arc;

use crate::database::leads as leads_db;
use crate::database::Database;
use crate::ingestion::{self, IngestError};

#[derive(Debug)]
pub enum LeadError {
    Validation(String),
    NotFound,
    Internal(String),
}

impl std::fmt::Display for LeadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeadError::Validation(msg) => write!(f, "{}", msg),
            LeadError::NotFound => write!(f, "Lead not found"),
            LeadError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl actix_web::error::ResponseError for LeadError {
    fn error_response(&self) -> HttpResponse {
        match self {
            LeadError::Validation(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "message": msg }))
            }
            LeadError::NotFound => {
                HttpResponse::NotFound().json(serde_json::json!({ "message": "Lead not found" }))
            }
            LeadError::Internal(msg) => {
                HttpResponse::InternalServerError().json(serde_json::json!({ "message": msg }))
            }
        }
    }
}

impl From<IngestError> for LeadError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Validation(msg) => LeadError::Validation(msg),
            IngestError::Store(e) => LeadError::Internal(e.to_string()),
        }
    }
}

pub async fn create_lead(
    db: web::Data<Arc<Database>>,
    request: web::Json<CreateLeadRequest>,
) -> ActixResult<HttpResponse> {
    let lead = ingestion::create_lead(db.async_connection.clone(), request.into_inner())
        .await
        .map_err(LeadError::from)?;

    Ok(HttpResponse::Created().json(lead))
}

pub async fn capture_lead(
    db: web::Data<Arc<Database>>,
    request: web::Json<CaptureLeadRequest>,
) -> ActixResult<HttpResponse> {
    let outcome = ingestion::capture_lead(db.async_connection.clone(), request.into_inner())
        .await
        .map_err(LeadError::from)?;

    Ok(HttpResponse::Ok().json(outcome))
}

pub async fn list_leads(db: web::Data<Arc<Database>>) -> ActixResult<HttpResponse> {
    let leads = leads_db::list_leads(db.async_connection.clone())
        .await
        .map_err(|e| LeadError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(LeadsResponse {
        count: leads.len(),
        data: leads,
    }))
}

pub async fn get_lead(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let lead_id = path.into_inner();

    let lead = leads_db::get_lead(db.async_connection.clone(), lead_id)
        .await
        .map_err(|e| LeadError::Internal(e.to_string()))?
        .ok_or(LeadError::NotFound)?;

    Ok(HttpResponse::Ok().json(lead))
}

pub async fn update_lead(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<UpdateLeadRequest>,
) -> ActixResult<HttpResponse> {
    let lead_id = path.into_inner();
    let req = request.into_inner();

    // A persisted lead never has blank required fields
    for (field, value) in [("name", &req.name), ("email", &req.email), ("source", &req.source)] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(LeadError::Validation(format!("{} cannot be empty", field)).into());
        }
    }

    let lead = leads_db::update_lead(db.async_connection.clone(), lead_id, req)
        .await
        .map_err(|e| LeadError::Internal(e.to_string()))?
        .ok_or(LeadError::NotFound)?;

    Ok(HttpResponse::Ok().json(lead))
}

pub async fn delete_lead(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> ActixResult<HttpResponse> {
    let lead_id = path.into_inner();

    let deleted = leads_db::delete_lead(db.async_connection.clone(), lead_id)
        .await
        .map_err(|e| LeadError::Internal(e.to_string()))?;
    if !deleted {
        return Err(LeadError::NotFound.into());
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Lead deleted successfully" })))
}

pub async fn append_log(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<AppendLogRequest>,
) -> ActixResult<HttpResponse> {
    let lead_id = path.into_inner();
    let req = request.into_inner();

    let lead = leads_db::append_log_entry(
        db.async_connection.clone(),
        lead_id,
        &req.entry_type,
        &req.note,
        req.date,
    )
    .await
    .map_err(|e| LeadError::Internal(e.to_string()))?
    .ok_or(LeadError::NotFound)?;

    Ok(HttpResponse::Ok().json(lead))
}

pub async fn append_document(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<AppendDocumentRequest>,
) -> ActixResult<HttpResponse> {
    let lead_id = path.into_inner();
    let req = request.into_inner();

    let lead = leads_db::append_document(db.async_connection.clone(), lead_id, &req.name, &req.link)
        .await
        .map_err(|e| LeadError::Internal(e.to_string()))?
        .ok_or(LeadError::NotFound)?;

    Ok(HttpResponse::Ok().json(lead))
}

use crate::database::AsyncDbConnection;
use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use shared_types::{
    AttachedDocument, CommunicationEntry, Lead, LeadPriority, LeadStatus, UpdateLeadRequest,
};
use std::str::FromStr;

/// Field set for inserting a lead, with all defaulting already applied
/// by the ingestion layer.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: String,
    pub job_title: String,
    pub source: String,
    pub status: LeadStatus,
    pub priority: LeadPriority,
    pub next_follow_up: Option<i64>,
    pub notes: Option<String>,
}

/// Raw lead row before the status/priority strings are parsed back into
/// their closed enums.
struct LeadRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    company: String,
    job_title: String,
    source: String,
    status: String,
    priority: String,
    next_follow_up: Option<i64>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

fn lead_from_row(row: &rusqlite::Row) -> rusqlite::Result<LeadRow> {
    Ok(LeadRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        company: row.get(4)?,
        job_title: row.get(5)?,
        source: row.get(6)?,
        status: row.get(7)?,
        priority: row.get(8)?,
        next_follow_up: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

const LEAD_COLUMNS: &str = "id, name, email, phone, company, job_title, source, status, priority,
                next_follow_up, notes, created_at, updated_at";

pub async fn insert_lead(conn: AsyncDbConnection, lead: NewLead) -> Result<i64> {
    let conn = conn.lock().await;
    let now = chrono::Utc::now().timestamp();

    let id: i64 = conn.query_row(
        "INSERT INTO leads
         (name, email, phone, company, job_title, source, status, priority,
          next_follow_up, notes, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
        params![
            &lead.name,
            &lead.email,
            lead.phone.as_ref(),
            &lead.company,
            &lead.job_title,
            &lead.source,
            lead.status.as_str(),
            lead.priority.as_str(),
            lead.next_follow_up,
            lead.notes.as_ref(),
            now,
            now
        ],
        |row| row.get(0),
    )?;

    Ok(id)
}

/// Fetch one lead with its embedded communication log and documents,
/// both in insertion order.
pub async fn get_lead(conn: AsyncDbConnection, id: i64) -> Result<Option<Lead>> {
    let conn = conn.lock().await;

    let row = conn
        .query_row(
            &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?"),
            [id],
            lead_from_row,
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT id, entry_type, note, logged_at FROM communication_log
         WHERE lead_id = ? ORDER BY id ASC",
    )?;
    let communication_log: Vec<CommunicationEntry> = stmt
        .query_map([id], |row| {
            Ok(CommunicationEntry {
                id: row.get(0)?,
                entry_type: row.get(1)?,
                note: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, name, link FROM attached_documents
         WHERE lead_id = ? ORDER BY id ASC",
    )?;
    let attached_documents: Vec<AttachedDocument> = stmt
        .query_map([id], |row| {
            Ok(AttachedDocument {
                id: row.get(0)?,
                name: row.get(1)?,
                link: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Some(Lead {
        id: row.id,
        name: row.name,
        email: row.email,
        phone: row.phone,
        company: row.company,
        job_title: row.job_title,
        source: row.source,
        status: LeadStatus::from_str(&row.status)?,
        priority: LeadPriority::from_str(&row.priority)?,
        next_follow_up: row.next_follow_up,
        notes: row.notes,
        communication_log,
        attached_documents,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Exact-match dedup lookup used by the external capture path
pub async fn find_lead_by_email(conn: AsyncDbConnection, email: &str) -> Result<Option<i64>> {
    let conn = conn.lock().await;

    let id = conn
        .query_row(
            "SELECT id FROM leads WHERE email = ? LIMIT 1",
            [email],
            |row| row.get(0),
        )
        .optional()?;

    Ok(id)
}

pub async fn list_leads(conn: AsyncDbConnection) -> Result<Vec<Lead>> {
    let conn_guard = conn.lock().await;

    let mut stmt = conn_guard.prepare("SELECT id FROM leads ORDER BY created_at DESC, id DESC")?;

    let ids: Vec<i64> = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    drop(stmt);
    drop(conn_guard);

    let mut leads = Vec::new();
    for id in ids {
        if let Some(lead) = get_lead(conn.clone(), id).await? {
            leads.push(lead);
        }
    }

    Ok(leads)
}

/// Leads whose follow-up falls inside `[start, end)`, excluding the
/// terminal Lost status. This is the scheduler's daily window snapshot.
pub async fn find_due_between(conn: AsyncDbConnection, start: i64, end: i64) -> Result<Vec<Lead>> {
    let ids: Vec<i64> = {
        let conn_guard = conn.lock().await;

        let mut stmt = conn_guard.prepare(
            "SELECT id FROM leads
             WHERE next_follow_up IS NOT NULL
               AND next_follow_up >= ?
               AND next_follow_up < ?
               AND status != 'Lost'
             ORDER BY next_follow_up ASC, id ASC",
        )?;

        let ids = stmt
            .query_map(params![start, end], |row| row.get::<_, i64>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        ids
    };

    let mut leads = Vec::new();
    for id in ids {
        if let Some(lead) = get_lead(conn.clone(), id).await? {
            leads.push(lead);
        }
    }

    Ok(leads)
}

/// Last-write-wins partial update. Returns the updated lead, or `None`
/// when the lead does not exist.
pub async fn update_lead(
    conn: AsyncDbConnection,
    id: i64,
    req: UpdateLeadRequest,
) -> Result<Option<Lead>> {
    let Some(existing) = get_lead(conn.clone(), id).await? else {
        return Ok(None);
    };

    let name = req.name.unwrap_or(existing.name);
    let email = req.email.unwrap_or(existing.email);
    let source = req.source.unwrap_or(existing.source);
    let phone = req.phone.or(existing.phone);
    let company = req.company.unwrap_or(existing.company);
    let job_title = req.job_title.unwrap_or(existing.job_title);
    let status = req.status.unwrap_or(existing.status);
    let priority = req.priority.unwrap_or(existing.priority);
    let next_follow_up = req.next_follow_up.or(existing.next_follow_up);
    let notes = req.notes.or(existing.notes);

    {
        let conn = conn.lock().await;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            "UPDATE leads
             SET name = ?, email = ?, phone = ?, company = ?, job_title = ?, source = ?,
                 status = ?, priority = ?, next_follow_up = ?, notes = ?, updated_at = ?
             WHERE id = ?",
            params![
                &name,
                &email,
                phone.as_ref(),
                &company,
                &job_title,
                &source,
                status.as_str(),
                priority.as_str(),
                next_follow_up,
                notes.as_ref(),
                now,
                id
            ],
        )?;
    }

    get_lead(conn, id).await
}

/// Hard delete is an external CRUD concern; the scheduler and ingestion
/// paths never call this.
pub async fn delete_lead(conn: AsyncDbConnection, id: i64) -> Result<bool> {
    let conn = conn.lock().await;

    conn.execute("DELETE FROM communication_log WHERE lead_id = ?", [id])?;
    conn.execute("DELETE FROM attached_documents WHERE lead_id = ?", [id])?;
    let deleted = conn.execute("DELETE FROM leads WHERE id = ?", [id])?;

    Ok(deleted > 0)
}

/// Append one communication-log entry. A pure INSERT, so prior entries are
/// never touched. `date` falls back to the current server time. Returns the
/// updated lead, or `None` when the lead does not exist.
pub async fn append_log_entry(
    conn: AsyncDbConnection,
    lead_id: i64,
    entry_type: &str,
    note: &str,
    date: Option<i64>,
) -> Result<Option<Lead>> {
    {
        let conn_guard = conn.lock().await;

        let exists: Option<i64> = conn_guard
            .query_row("SELECT id FROM leads WHERE id = ?", [lead_id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();
        let logged_at = date.unwrap_or(now);

        conn_guard.execute(
            "INSERT INTO communication_log (lead_id, entry_type, note, logged_at)
             VALUES (?, ?, ?, ?)",
            params![lead_id, entry_type, note, logged_at],
        )?;
        conn_guard.execute(
            "UPDATE leads SET updated_at = ? WHERE id = ?",
            params![now, lead_id],
        )?;
    }

    get_lead(conn, lead_id).await
}

/// Append one document link. Same append-only contract as the log.
pub async fn append_document(
    conn: AsyncDbConnection,
    lead_id: i64,
    name: &str,
    link: &str,
) -> Result<Option<Lead>> {
    {
        let conn_guard = conn.lock().await;

        let exists: Option<i64> = conn_guard
            .query_row("SELECT id FROM leads WHERE id = ?", [lead_id], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Ok(None);
        }

        conn_guard.execute(
            "INSERT INTO attached_documents (lead_id, name, link) VALUES (?, ?, ?)",
            params![lead_id, name, link],
        )?;
        conn_guard.execute(
            "UPDATE leads SET updated_at = ? WHERE id = ?",
            params![chrono::Utc::now().timestamp(), lead_id],
        )?;
    }

    get_lead(conn, lead_id).await
}

use rusqlite::Connection;

/// Run all database migrations
pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    // Create leads table. Status and priority are stored as their wire
    // strings; the CHECK constraints mirror the closed enums in shared-types.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR NOT NULL,
            email VARCHAR NOT NULL,
            phone VARCHAR,
            company VARCHAR NOT NULL DEFAULT 'N/A',
            job_title VARCHAR NOT NULL DEFAULT 'N/A',
            source VARCHAR NOT NULL,
            status VARCHAR NOT NULL DEFAULT 'New' CHECK (status IN ('New', 'Contacted', 'Proposal Sent', 'Negotiation', 'Converted', 'Lost')),
            priority VARCHAR NOT NULL DEFAULT 'Cold' CHECK (priority IN ('Hot', 'Warm', 'Cold')),
            next_follow_up BIGINT,
            notes VARCHAR,
            created_at BIGINT NOT NULL,
            updated_at BIGINT NOT NULL
        )",
        [],
    )?;

    // Append-only sub-tables keyed by lead id. An append is a single INSERT,
    // so two racing appenders can never overwrite each other's entries.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS communication_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lead_id INTEGER NOT NULL,
            entry_type VARCHAR NOT NULL,
            note VARCHAR NOT NULL,
            logged_at BIGINT NOT NULL,
            FOREIGN KEY (lead_id) REFERENCES leads (id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attached_documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lead_id INTEGER NOT NULL,
            name VARCHAR NOT NULL,
            link VARCHAR NOT NULL,
            FOREIGN KEY (lead_id) REFERENCES leads (id)
        )",
        [],
    )?;

    // Indexes for the dedup lookup and the daily date-window scan
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_leads_email ON leads(email)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_leads_follow_up
            ON leads(next_follow_up, status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_communication_log_lead
            ON communication_log(lead_id, id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_attached_documents_lead
            ON attached_documents(lead_id, id)",
        [],
    )?;

    Ok(())
}

//! Daily follow-up scan. Once per day (cron-triggered, server-local time)
//! the scheduler snapshots the leads due today, dispatches one digest
//! notification, and appends one system reminder entry per matched lead.

use crate::database::{leads as leads_db, AsyncDbConnection};
use crate::notify::{DispatchOutcome, Notifier};
use anyhow::Result;
use chrono::{Local, LocalResult, NaiveDate, TimeZone, Utc};
use cron::Schedule;
use shared_types::Lead;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const REMINDER_NOTE: &str = "Daily Reminder: follow-up due today";
const REMINDER_ENTRY_TYPE: &str = "System";

/// Counts from one scheduler run, for logging and tests
#[derive(Debug, Default)]
pub struct RunSummary {
    pub matched: usize,
    pub reminded: usize,
    pub failed: usize,
    pub dispatched: bool,
}

pub struct FollowupScheduler {
    db_conn: AsyncDbConnection,
    notifier: Arc<Notifier>,
    schedule: Schedule,
    in_flight: AtomicBool,
    shutting_down: AtomicBool,
}

impl FollowupScheduler {
    pub fn new(
        db_conn: AsyncDbConnection,
        notifier: Arc<Notifier>,
        cron_expr: &str,
    ) -> Result<Self> {
        let schedule = Schedule::from_str(cron_expr)
            .map_err(|e| anyhow::anyhow!("invalid cron expression '{}': {}", cron_expr, e))?;

        Ok(Self {
            db_conn,
            notifier,
            schedule,
            in_flight: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
        })
    }

    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Scheduler loop: sleep until the next cron fire time, then trigger
    /// one run for the current calendar day.
    pub async fn run(self: Arc<Self>) {
        loop {
            if self.is_shutting_down() {
                break;
            }

            let Some(next) = self.schedule.upcoming(Local).next() else {
                tracing::warn!("Cron schedule yields no future fire times, stopping scheduler");
                break;
            };

            tracing::info!("Next follow-up scan scheduled for {}", next);
            let wait = (next - Local::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            if self.is_shutting_down() {
                break;
            }
            self.trigger().await;
        }
    }

    /// Run the scan for today unless a previous run is still executing
    /// (skip-if-running; the trigger is never queued).
    pub async fn trigger(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            tracing::warn!("Previous follow-up run still executing, skipping this trigger");
            return;
        }

        let day = Local::now().date_naive();
        match self.run_for_day(day).await {
            Ok(summary) => {
                tracing::info!(
                    "Follow-up run for {}: {} matched, {} reminded, {} failed",
                    day,
                    summary.matched,
                    summary.reminded,
                    summary.failed
                );
            }
            Err(e) => {
                // Best effort: nothing in one day's run is fatal to later runs
                tracing::error!("Follow-up run for {} failed: {}", day, e);
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// One run with an injected day, so tests can drive the handler without
    /// touching wall-clock scheduling. The window is `[day 00:00, day+1
    /// 00:00)` in server-local time.
    pub async fn run_for_day(&self, day: NaiveDate) -> Result<RunSummary> {
        let next_day = day
            .succ_opt()
            .ok_or_else(|| anyhow::anyhow!("no calendar day after {}", day))?;
        let start = local_day_start(day);
        let end = local_day_start(next_day);

        let due = leads_db::find_due_between(self.db_conn.clone(), start, end).await?;
        if due.is_empty() {
            tracing::info!("No leads due for follow-up on {}", day);
            return Ok(RunSummary::default());
        }

        Ok(self.process_due(due).await)
    }

    /// Dispatch the digest, then append one reminder entry per matched lead.
    /// A failed dispatch never aborts the appends, and each lead's append is
    /// isolated from the others.
    async fn process_due(&self, due: Vec<Lead>) -> RunSummary {
        let mut summary = RunSummary {
            matched: due.len(),
            ..Default::default()
        };

        let (subject, body) = build_digest(&due);
        match self.notifier.send(&subject, &body).await {
            DispatchOutcome::Delivered => {
                summary.dispatched = true;
            }
            DispatchOutcome::Failed(reason) => {
                tracing::error!("Failed to dispatch follow-up digest: {}", reason);
            }
        }

        for lead in &due {
            match leads_db::append_log_entry(
                self.db_conn.clone(),
                lead.id,
                REMINDER_ENTRY_TYPE,
                REMINDER_NOTE,
                None,
            )
            .await
            {
                Ok(Some(_)) => summary.reminded += 1,
                Ok(None) => {
                    tracing::warn!("Lead {} disappeared before its reminder was logged", lead.id);
                    summary.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to log reminder for lead {}: {}", lead.id, e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

fn build_digest(due: &[Lead]) -> (String, String) {
    let names: Vec<&str> = due.iter().map(|lead| lead.name.as_str()).collect();
    let subject = format!("Daily Reminder: {} lead(s) due for follow-up", due.len());
    let body = format!("Leads due for follow-up today: {}", names.join(", "));
    (subject, body)
}

/// Epoch seconds of local midnight on the given day
pub fn local_day_start(day: NaiveDate) -> i64 {
    let midnight = day.and_hms_opt(0, 0, 0).expect("midnight is a valid time");
    match midnight.and_local_timezone(Local) {
        LocalResult::Single(dt) => dt.timestamp(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp(),
        // Midnight skipped by a DST jump; the UTC reading is close enough
        // for a whole-day window
        LocalResult::None => Utc.from_utc_datetime(&midnight).timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::leads::tests::{sample_lead, test_db};
    use crate::database::Database;
    use crate::notify::SentNotification;
    use shared_types::{LeadPriority, LeadStatus};
    use std::sync::Mutex;

    fn recording_scheduler(
        db: &Database,
    ) -> (FollowupScheduler, Arc<Mutex<Vec<SentNotification>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = Arc::new(Notifier::Recording(sent.clone()));
        let scheduler =
            FollowupScheduler::new(db.async_connection.clone(), notifier, "0 0 9 * * *").unwrap();
        (scheduler, sent)
    }

    #[test]
    fn test_rejects_invalid_cron_expression() {
        let (_dir, db) = test_db();
        let notifier = Arc::new(Notifier::Recording(Arc::new(Mutex::new(Vec::new()))));
        assert!(FollowupScheduler::new(db.async_connection.clone(), notifier, "not a cron").is_err());
    }

    #[tokio::test]
    async fn test_run_reminds_due_lead_and_skips_lost() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();
        let today = Local::now().date_naive();
        let due_at = local_day_start(today) + 3600;

        let mut lead_a = sample_lead("a@x.com");
        lead_a.name = "Ada".to_string();
        lead_a.next_follow_up = Some(due_at);
        let mut lead_b = sample_lead("b@x.com");
        lead_b.name = "Basil".to_string();
        lead_b.next_follow_up = Some(due_at);
        lead_b.status = LeadStatus::Lost;

        let id_a = leads_db::insert_lead(conn.clone(), lead_a).await.unwrap();
        let id_b = leads_db::insert_lead(conn.clone(), lead_b).await.unwrap();

        let (scheduler, sent) = recording_scheduler(&db);
        let summary = scheduler.run_for_day(today).await.unwrap();

        assert_eq!(summary.matched, 1);
        assert_eq!(summary.reminded, 1);
        assert_eq!(summary.failed, 0);
        assert!(summary.dispatched);

        // Exactly one dispatch, mentioning the due lead and not the lost one
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("Ada"));
        assert!(!sent[0].body.contains("Basil"));

        let a = leads_db::get_lead(conn.clone(), id_a).await.unwrap().unwrap();
        assert_eq!(a.communication_log.len(), 1);
        assert_eq!(a.communication_log[0].note, REMINDER_NOTE);
        assert_eq!(a.communication_log[0].entry_type, "System");
        // The scheduler only appends; it never touches the pipeline fields
        assert_eq!(a.status, LeadStatus::New);
        assert_eq!(a.next_follow_up, Some(due_at));

        let b = leads_db::get_lead(conn, id_b).await.unwrap().unwrap();
        assert!(b.communication_log.is_empty());
    }

    #[tokio::test]
    async fn test_empty_day_is_a_quiet_no_op() {
        let (_dir, db) = test_db();
        let (scheduler, sent) = recording_scheduler(&db);

        let summary = scheduler.run_for_day(Local::now().date_naive()).await.unwrap();

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.reminded, 0);
        assert!(!summary.dispatched);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_second_run_appends_duplicate_reminder() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();
        let today = Local::now().date_naive();

        let mut lead = sample_lead("twice@x.com");
        lead.next_follow_up = Some(local_day_start(today) + 60);
        let id = leads_db::insert_lead(conn.clone(), lead).await.unwrap();

        let (scheduler, _sent) = recording_scheduler(&db);
        scheduler.run_for_day(today).await.unwrap();
        scheduler.run_for_day(today).await.unwrap();

        let lead = leads_db::get_lead(conn, id).await.unwrap().unwrap();
        assert_eq!(lead.communication_log.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_lead_save_does_not_stop_the_rest() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();

        let mut first = sample_lead("first@x.com");
        first.next_follow_up = Some(1_700_000_000);
        let mut last = sample_lead("last@x.com");
        last.next_follow_up = Some(1_700_000_000);

        let id_first = leads_db::insert_lead(conn.clone(), first).await.unwrap();
        let id_last = leads_db::insert_lead(conn.clone(), last).await.unwrap();

        let lead_first = leads_db::get_lead(conn.clone(), id_first)
            .await
            .unwrap()
            .unwrap();
        let lead_last = leads_db::get_lead(conn.clone(), id_last)
            .await
            .unwrap()
            .unwrap();
        // A lead from the snapshot whose row no longer exists at save time
        let mut vanished = lead_first.clone();
        vanished.id = 9999;

        let (scheduler, sent) = recording_scheduler(&db);
        let summary = scheduler
            .process_due(vec![lead_first, vanished, lead_last])
            .await;

        assert_eq!(summary.matched, 3);
        assert_eq!(summary.reminded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(sent.lock().unwrap().len(), 1);

        for id in [id_first, id_last] {
            let lead = leads_db::get_lead(conn.clone(), id).await.unwrap().unwrap();
            assert_eq!(lead.communication_log.len(), 1);
            assert_eq!(lead.communication_log[0].note, REMINDER_NOTE);
        }
    }

    #[tokio::test]
    async fn test_priority_untouched_by_reminder() {
        let (_dir, db) = test_db();
        let conn = db.async_connection.clone();
        let today = Local::now().date_naive();

        let mut lead = sample_lead("hot@x.com");
        lead.priority = LeadPriority::Hot;
        lead.next_follow_up = Some(local_day_start(today));
        let id = leads_db::insert_lead(conn.clone(), lead).await.unwrap();

        let (scheduler, _sent) = recording_scheduler(&db);
        scheduler.run_for_day(today).await.unwrap();

        let lead = leads_db::get_lead(conn, id).await.unwrap().unwrap();
        assert_eq!(lead.priority, LeadPriority::Hot);
    }

    #[test]
    fn test_digest_counts_and_names() {
        let mut a = fake_lead(1, "Ada");
        a.next_follow_up = Some(0);
        let b = fake_lead(2, "Basil");
        let (subject, body) = build_digest(&[a, b]);
        assert!(subject.contains("2 lead(s)"));
        assert!(body.contains("Ada, Basil"));
    }

    fn fake_lead(id: i64, name: &str) -> Lead {
        Lead {
            id,
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase()),
            phone: None,
            company: "N/A".to_string(),
            job_title: "N/A".to_string(),
            source: "Referral".to_string(),
            status: LeadStatus::New,
            priority: LeadPriority::Cold,
            next_follow_up: None,
            notes: None,
            communication_log: Vec::new(),
            attached_documents: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }
}

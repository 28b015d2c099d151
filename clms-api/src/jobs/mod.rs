pub mod followup_scheduler;

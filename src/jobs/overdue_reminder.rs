use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::error::AppError;
use crate::models::OverdueIssue;
use crate::services::notifier::{Notifier, NotifyError, Reminder};
use crate::store::LoanStore;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    pub selected: usize,
    pub notified: usize,
    pub already_notified: usize,
    pub send_failures: usize,
    pub mark_failures: usize,
}

/// Background job that reminds borrowers of overdue equipment
///
/// For each issue that is still out, past its due time and not yet reminded:
/// 1. Send a reminder to the student's phone
/// 2. Set the issue's notified flag
///
/// A reminder whose flag could not be set is sent again on the next sweep.
pub async fn sweep_overdue(
    store: &dyn LoanStore,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<SweepStats, AppError> {
    let mut stats = SweepStats::default();

    tracing::debug!(%now, "Checking for overdue equipment");

    let overdue = store.find_pending_reminders(now).await?;
    stats.selected = overdue.len();

    if overdue.is_empty() {
        tracing::debug!("No overdue issues");
        return Ok(stats);
    }

    tracing::info!(total_overdue = stats.selected, "Sending overdue reminders");

    for issue in &overdue {
        match remind(store, notifier, issue).await {
            Ok(ReminderResult::Notified) => {
                stats.notified += 1;
            }
            Ok(ReminderResult::AlreadyNotified) => {
                stats.already_notified += 1;
            }
            Err(ReminderError::Send(e)) => {
                tracing::warn!(
                    issue_id = %issue.issue_id,
                    error = %e,
                    "Reminder not delivered, will retry on next sweep"
                );
                stats.send_failures += 1;
            }
            Err(ReminderError::Mark(e)) => {
                tracing::error!(
                    issue_id = %issue.issue_id,
                    error = %e,
                    "Reminder sent but notified flag not saved"
                );
                stats.mark_failures += 1;
            }
        }
    }

    tracing::info!(?stats, "Reminder check complete");

    Ok(stats)
}

enum ReminderResult {
    Notified,
    AlreadyNotified,
}

enum ReminderError {
    Send(NotifyError),
    Mark(AppError),
}

async fn remind(
    store: &dyn LoanStore,
    notifier: &dyn Notifier,
    issue: &OverdueIssue,
) -> Result<ReminderResult, ReminderError> {
    let reminder = Reminder::from(issue);
    notifier.send(&reminder).await.map_err(ReminderError::Send)?;

    let marked = store
        .mark_notified(issue.issue_id)
        .await
        .map_err(ReminderError::Mark)?;

    if marked {
        Ok(ReminderResult::Notified)
    } else {
        Ok(ReminderResult::AlreadyNotified)
    }
}

/// Starts a scheduler that sweeps for overdue issues every `interval`.
///
/// The job owns its own store and notifier handles; shut the returned
/// scheduler down when the server stops.
pub async fn start_scheduler(
    store: Arc<dyn LoanStore>,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_repeated_async(interval, move |_id, _scheduler| {
        let store = store.clone();
        let notifier = notifier.clone();

        Box::pin(async move {
            if let Err(e) = sweep_overdue(store.as_ref(), notifier.as_ref(), Utc::now()).await {
                tracing::error!(error = %e, "Overdue sweep failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(interval_secs = interval.as_secs(), "Overdue reminder job scheduled");

    Ok(scheduler)
}

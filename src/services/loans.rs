use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Issue, IssueDetails, NewIssue, OverdueIssue};
use crate::store::LoanStore;

/// Loan terms shared by every issue
#[derive(Debug, Clone, Copy)]
pub struct LoanPolicy {
    pub loan_duration: Duration,
}

impl LoanPolicy {
    /// Fails when the duration cannot be added to the current time
    pub fn new(loan_duration: std::time::Duration) -> Result<Self> {
        let loan_duration = Duration::from_std(loan_duration)
            .ok()
            .filter(|d| Utc::now().checked_add_signed(*d).is_some())
            .ok_or_else(|| AppError::Validation("Loan duration is out of range".to_string()))?;

        Ok(Self { loan_duration })
    }

    pub fn due_at(&self, issued_at: DateTime<Utc>) -> Result<DateTime<Utc>> {
        issued_at
            .checked_add_signed(self.loan_duration)
            .ok_or_else(|| AppError::Validation("Due time is out of range".to_string()))
    }

    /// Human readable loan period, e.g. "1 minute" or "8 hours"
    pub fn describe(&self) -> String {
        let secs = self.loan_duration.num_seconds();
        let (count, unit) = if secs >= 3600 && secs % 3600 == 0 {
            (secs / 3600, "hour")
        } else if secs >= 60 && secs % 60 == 0 {
            (secs / 60, "minute")
        } else {
            (secs, "second")
        };

        if count == 1 {
            format!("1 {unit}")
        } else {
            format!("{count} {unit}s")
        }
    }
}

/// Lends one unit of equipment to a student.
///
/// The issue row and the stock decrement are written together; an equipment
/// with no units left is rejected instead of going negative.
pub async fn issue(
    store: &dyn LoanStore,
    policy: &LoanPolicy,
    student_id: Uuid,
    equipment_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Issue> {
    let student = store
        .get_student(student_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    let equipment = store
        .get_equipment(equipment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;

    let issue = store
        .open_issue(&NewIssue {
            student_id,
            equipment_id,
            issued_at: now,
            due_at: policy.due_at(now)?,
        })
        .await?;

    tracing::info!(
        issue_id = %issue.id,
        student = %student.name,
        equipment = %equipment.name,
        due_at = %issue.due_at,
        "Equipment issued"
    );

    Ok(issue)
}

/// Records the return of an issue. Unknown or already returned issues are
/// left untouched.
pub async fn return_item(store: &dyn LoanStore, issue_id: Uuid, now: DateTime<Utc>) -> Result<()> {
    match store.close_issue(issue_id, now).await? {
        Some(issue) => {
            tracing::info!(
                issue_id = %issue.id,
                equipment_id = %issue.equipment_id,
                "Equipment returned"
            );
        }
        None => {
            tracing::debug!(issue_id = %issue_id, "Return ignored, no open issue");
        }
    }

    Ok(())
}

pub async fn find_issue(store: &dyn LoanStore, issue_id: Uuid) -> Result<Issue> {
    store
        .get_issue(issue_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Issue not found".to_string()))
}

pub async fn list_issues(store: &dyn LoanStore) -> Result<Vec<IssueDetails>> {
    store.list_issue_details().await
}

/// Open loans past their due time that have not been reminded yet
pub async fn list_overdue(store: &dyn LoanStore, now: DateTime<Utc>) -> Result<Vec<OverdueIssue>> {
    store.find_pending_reminders(now).await
}

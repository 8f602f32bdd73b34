use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

/// Format used wherever a timestamp is shown to a person, e.g. `14:05 03-11-2025`
pub const DISPLAY_TIME_FORMAT: &str = "%H:%M %d-%m-%Y";

/// Renders a stored UTC time in the desk's local offset
pub fn display_time(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format(DISPLAY_TIME_FORMAT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "issue_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Issued,
    Returned,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Issued => "issued",
            IssueStatus::Returned => "returned",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Issue {
    pub id: Uuid,
    pub student_id: Uuid,
    pub equipment_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub status: IssueStatus,
    pub returned_at: Option<DateTime<Utc>>,
    pub notified: bool,
}

impl Issue {
    pub fn is_open(&self) -> bool {
        self.status == IssueStatus::Issued
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_at < now
    }

    /// True when the overdue sweep should send a reminder for this loan
    pub fn needs_reminder(&self, now: DateTime<Utc>) -> bool {
        self.is_overdue(now) && !self.notified
    }
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub student_id: Uuid,
    pub equipment_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

/// An issue joined with the names shown on the issues page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IssueDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub issue: Issue,
    pub student_name: String,
    pub equipment_name: String,
}

/// Everything the overdue sweep needs to remind one borrower
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OverdueIssue {
    pub issue_id: Uuid,
    pub student_name: String,
    pub phone: String,
    pub equipment_name: String,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

impl Issue {
    pub async fn create(conn: &mut PgConnection, data: &NewIssue) -> Result<Self, sqlx::Error> {
        let issue = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO issues (student_id, equipment_id, issued_at, due_at, status)
            VALUES ($1, $2, $3, $4, 'issued')
            RETURNING *
            "#,
        )
        .bind(data.student_id)
        .bind(data.equipment_id)
        .bind(data.issued_at)
        .bind(data.due_at)
        .fetch_one(conn)
        .await?;

        Ok(issue)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM issues WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(issue)
    }

    /// Moves an open issue to `returned`.
    ///
    /// Returns `None` if the issue does not exist or was already returned.
    pub async fn mark_returned(
        conn: &mut PgConnection,
        id: Uuid,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let issue = sqlx::query_as::<_, Self>(
            r#"
            UPDATE issues
            SET status = 'returned', returned_at = $2
            WHERE id = $1 AND status = 'issued'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .fetch_optional(conn)
        .await?;

        Ok(issue)
    }

    /// Lists every issue with student and equipment names, newest first
    pub async fn list_details(pool: &PgPool) -> Result<Vec<IssueDetails>, sqlx::Error> {
        let issues = sqlx::query_as::<_, IssueDetails>(
            r#"
            SELECT i.*, s.name AS student_name, e.name AS equipment_name
            FROM issues i
            JOIN students s ON i.student_id = s.id
            JOIN equipments e ON i.equipment_id = e.id
            ORDER BY i.issued_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(issues)
    }

    /// Finds open, past-due issues that have not been reminded yet
    pub async fn find_pending_reminders(
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> Result<Vec<OverdueIssue>, sqlx::Error> {
        let overdue = sqlx::query_as::<_, OverdueIssue>(
            r#"
            SELECT i.id AS issue_id, s.name AS student_name, s.phone,
                   e.name AS equipment_name, i.issued_at, i.due_at
            FROM issues i
            JOIN students s ON i.student_id = s.id
            JOIN equipments e ON i.equipment_id = e.id
            WHERE i.status = 'issued'
              AND i.due_at < $1
              AND i.notified = FALSE
            ORDER BY i.due_at ASC
            "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(overdue)
    }

    /// Sets the notified flag. Returns false if it was already set.
    pub async fn mark_notified(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE issues
            SET notified = TRUE
            WHERE id = $1 AND notified = FALSE
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn issue_at(issued_at: DateTime<Utc>, loan: Duration) -> Issue {
        Issue {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            equipment_id: Uuid::new_v4(),
            issued_at,
            due_at: issued_at + loan,
            status: IssueStatus::Issued,
            returned_at: None,
            notified: false,
        }
    }

    #[test]
    fn test_display_time_format() {
        let at = Utc.with_ymd_and_hms(2025, 11, 3, 14, 5, 59).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(display_time(at, utc), "14:05 03-11-2025");
    }

    #[test]
    fn test_display_time_shifts_to_local_offset() {
        let at = Utc.with_ymd_and_hms(2025, 11, 3, 20, 0, 0).unwrap();
        let ist = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        // crosses midnight into the next local day
        assert_eq!(display_time(at, ist), "01:30 04-11-2025");
    }

    #[test]
    fn test_needs_reminder_only_after_due() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let issue = issue_at(t0, Duration::minutes(1));

        assert!(!issue.needs_reminder(t0));
        // due time itself is not overdue, strictly after is
        assert!(!issue.needs_reminder(t0 + Duration::minutes(1)));
        assert!(issue.needs_reminder(t0 + Duration::minutes(2)));
    }

    #[test]
    fn test_notified_or_returned_issues_need_no_reminder() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let later = t0 + Duration::hours(1);

        let mut notified = issue_at(t0, Duration::minutes(1));
        notified.notified = true;
        assert!(notified.is_overdue(later));
        assert!(!notified.needs_reminder(later));

        let mut returned = issue_at(t0, Duration::minutes(1));
        returned.status = IssueStatus::Returned;
        returned.returned_at = Some(later);
        assert!(!returned.is_overdue(later));
        assert!(!returned.needs_reminder(later));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&IssueStatus::Issued).unwrap(),
            "\"issued\""
        );
        assert_eq!(IssueStatus::Returned.as_str(), "returned");
    }
}

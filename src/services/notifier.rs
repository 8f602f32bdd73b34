use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{issue::display_time, OverdueIssue};

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// One overdue reminder addressed to a borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub phone: String,
    pub student_name: String,
    pub equipment_name: String,
    pub issued_at: DateTime<Utc>,
}

impl From<&OverdueIssue> for Reminder {
    fn from(overdue: &OverdueIssue) -> Self {
        Self {
            phone: overdue.phone.clone(),
            student_name: overdue.student_name.clone(),
            equipment_name: overdue.equipment_name.clone(),
            issued_at: overdue.issued_at,
        }
    }
}

impl Reminder {
    /// SMS text, with the borrow time shown at the given UTC offset
    pub fn message(&self, offset: FixedOffset) -> String {
        format!(
            "Reminder: Dear {}, please return the {} you borrowed at {} to the sports department.",
            self.student_name,
            self.equipment_name,
            display_time(self.issued_at, offset)
        )
    }
}

/// Delivery channel for reminders
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotifyError>;
}

/// Simulated SMS gateway that writes each message to the log
#[derive(Debug, Clone)]
pub struct LogNotifier {
    display_offset: FixedOffset,
}

impl LogNotifier {
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }
}

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        tracing::info!(
            to = %reminder.phone,
            message = %reminder.message(self.display_offset),
            "[SIMULATED SMS]"
        );
        Ok(())
    }
}

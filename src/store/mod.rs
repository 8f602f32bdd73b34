// Store module - persistence boundary shared by request handlers and the sweeper

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Equipment, Issue, IssueDetails, NewEquipment, NewIssue, NewStudent, OverdueIssue, Student,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Record operations over students, equipments and issues.
///
/// Every multi-row change (issue, return, guarded delete) is applied
/// atomically by the implementation.
#[async_trait::async_trait]
pub trait LoanStore: Send + Sync {
    // Students
    async fn create_student(&self, data: &NewStudent) -> Result<Student>;
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>>;
    async fn list_students(&self) -> Result<Vec<Student>>;
    /// Fails with `StudentHasIssues` if any issue references the student.
    /// Unknown ids are a no-op.
    async fn delete_student(&self, id: Uuid) -> Result<()>;

    // Equipments
    async fn create_equipment(&self, data: &NewEquipment) -> Result<Equipment>;
    async fn get_equipment(&self, id: Uuid) -> Result<Option<Equipment>>;
    async fn list_equipments(&self) -> Result<Vec<Equipment>>;
    /// Fails with `EquipmentOnLoan` if an `issued` loan references it.
    /// Unknown ids are a no-op.
    async fn delete_equipment(&self, id: Uuid) -> Result<()>;

    // Issues
    /// Inserts the issue and takes one unit of the equipment off the shelf.
    /// Fails with `OutOfStock` when no unit is left.
    async fn open_issue(&self, data: &NewIssue) -> Result<Issue>;
    /// Returns an open issue and puts its unit back. `None` if the id is
    /// unknown or the issue was already returned.
    async fn close_issue(&self, id: Uuid, returned_at: DateTime<Utc>) -> Result<Option<Issue>>;
    async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>>;
    /// Newest first
    async fn list_issue_details(&self) -> Result<Vec<IssueDetails>>;

    // Reminders
    async fn find_pending_reminders(&self, now: DateTime<Utc>) -> Result<Vec<OverdueIssue>>;
    /// Returns false if the flag was already set.
    async fn mark_notified(&self, id: Uuid) -> Result<bool>;

    async fn ping(&self) -> Result<()>;
}

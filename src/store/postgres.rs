use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::LoanStore;
use crate::error::{AppError, Result};
use crate::models::{
    Equipment, Issue, IssueDetails, NewEquipment, NewIssue, NewStudent, OverdueIssue, Student,
};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl LoanStore for PgStore {
    async fn create_student(&self, data: &NewStudent) -> Result<Student> {
        Ok(Student::create(&self.pool, data).await?)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        Ok(Student::find_by_id(&self.pool, id).await?)
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        Ok(Student::list_all(&self.pool).await?)
    }

    async fn delete_student(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if Student::count_issues(&mut tx, id).await? > 0 {
            tx.rollback().await?;
            return Err(AppError::StudentHasIssues);
        }

        Student::delete(&mut tx, id).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn create_equipment(&self, data: &NewEquipment) -> Result<Equipment> {
        Ok(Equipment::create(&self.pool, data).await?)
    }

    async fn get_equipment(&self, id: Uuid) -> Result<Option<Equipment>> {
        Ok(Equipment::find_by_id(&self.pool, id).await?)
    }

    async fn list_equipments(&self) -> Result<Vec<Equipment>> {
        Ok(Equipment::list_all(&self.pool).await?)
    }

    async fn delete_equipment(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // hold the row so no loan can start between the check and the retire
        if Equipment::lock(&mut tx, id).await?.is_none() {
            tx.rollback().await?;
            return Ok(());
        }

        if Equipment::count_open_issues(&mut tx, id).await? > 0 {
            tx.rollback().await?;
            return Err(AppError::EquipmentOnLoan);
        }

        Equipment::soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn open_issue(&self, data: &NewIssue) -> Result<Issue> {
        let mut tx = self.pool.begin().await?;

        if Equipment::take_one(&mut tx, data.equipment_id).await?.is_none() {
            tx.rollback().await?;

            return match Equipment::find_by_id(&self.pool, data.equipment_id).await? {
                Some(equipment) => Err(AppError::OutOfStock(equipment.name)),
                None => Err(AppError::NotFound("Equipment not found".to_string())),
            };
        }

        let issue = Issue::create(&mut tx, data).await?;
        tx.commit().await?;

        Ok(issue)
    }

    async fn close_issue(&self, id: Uuid, returned_at: DateTime<Utc>) -> Result<Option<Issue>> {
        let mut tx = self.pool.begin().await?;

        let Some(issue) = Issue::mark_returned(&mut tx, id, returned_at).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        Equipment::restore_one(&mut tx, issue.equipment_id).await?;
        tx.commit().await?;

        Ok(Some(issue))
    }

    async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>> {
        Ok(Issue::find_by_id(&self.pool, id).await?)
    }

    async fn list_issue_details(&self) -> Result<Vec<IssueDetails>> {
        Ok(Issue::list_details(&self.pool).await?)
    }

    async fn find_pending_reminders(&self, now: DateTime<Utc>) -> Result<Vec<OverdueIssue>> {
        Ok(Issue::find_pending_reminders(&self.pool, now).await?)
    }

    async fn mark_notified(&self, id: Uuid) -> Result<bool> {
        Ok(Issue::mark_notified(&self.pool, id).await?)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

//! In-process store used by unit tests. Mirrors the guards and atomicity of
//! the PostgreSQL store.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::LoanStore;
use crate::error::{AppError, Result};
use crate::models::{
    Equipment, Issue, IssueDetails, IssueStatus, NewEquipment, NewIssue, NewStudent,
    OverdueIssue, Student,
};

#[derive(Default)]
struct Tables {
    students: Vec<Student>,
    equipments: Vec<Equipment>,
    issues: Vec<Issue>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_mark_notified: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `mark_notified` fail until switched back off
    pub fn fail_mark_notified(&self, fail: bool) {
        self.fail_mark_notified.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl LoanStore for MemoryStore {
    async fn create_student(&self, data: &NewStudent) -> Result<Student> {
        let student = Student {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            roll_no: data.roll_no.clone(),
            class_name: data.class_name.clone(),
            phone: data.phone.clone(),
            created_at: Utc::now(),
        };
        self.tables.lock().await.students.push(student.clone());
        Ok(student)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        let tables = self.tables.lock().await;
        Ok(tables.students.iter().find(|s| s.id == id).cloned())
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        Ok(self.tables.lock().await.students.clone())
    }

    async fn delete_student(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.issues.iter().any(|i| i.student_id == id) {
            return Err(AppError::StudentHasIssues);
        }
        tables.students.retain(|s| s.id != id);
        Ok(())
    }

    async fn create_equipment(&self, data: &NewEquipment) -> Result<Equipment> {
        let equipment = Equipment {
            id: Uuid::new_v4(),
            name: data.name.clone(),
            quantity: data.quantity,
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.tables.lock().await.equipments.push(equipment.clone());
        Ok(equipment)
    }

    async fn get_equipment(&self, id: Uuid) -> Result<Option<Equipment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .equipments
            .iter()
            .find(|e| e.id == id && e.deleted_at.is_none())
            .cloned())
    }

    async fn list_equipments(&self) -> Result<Vec<Equipment>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .equipments
            .iter()
            .filter(|e| e.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn delete_equipment(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables.lock().await;
        if tables
            .issues
            .iter()
            .any(|i| i.equipment_id == id && i.is_open())
        {
            return Err(AppError::EquipmentOnLoan);
        }
        // retired, not removed, so issues keep pointing at it
        if let Some(equipment) = tables
            .equipments
            .iter_mut()
            .find(|e| e.id == id && e.deleted_at.is_none())
        {
            equipment.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn open_issue(&self, data: &NewIssue) -> Result<Issue> {
        let mut tables = self.tables.lock().await;

        if !tables.students.iter().any(|s| s.id == data.student_id) {
            return Err(AppError::NotFound("Student not found".to_string()));
        }
        let equipment = tables
            .equipments
            .iter_mut()
            .find(|e| e.id == data.equipment_id && e.deleted_at.is_none())
            .ok_or_else(|| AppError::NotFound("Equipment not found".to_string()))?;
        if equipment.quantity <= 0 {
            return Err(AppError::OutOfStock(equipment.name.clone()));
        }
        equipment.quantity -= 1;

        let issue = Issue {
            id: Uuid::new_v4(),
            student_id: data.student_id,
            equipment_id: data.equipment_id,
            issued_at: data.issued_at,
            due_at: data.due_at,
            status: IssueStatus::Issued,
            returned_at: None,
            notified: false,
        };
        tables.issues.push(issue.clone());
        Ok(issue)
    }

    async fn close_issue(&self, id: Uuid, returned_at: DateTime<Utc>) -> Result<Option<Issue>> {
        let mut tables = self.tables.lock().await;

        let Some(issue) = tables.issues.iter_mut().find(|i| i.id == id && i.is_open()) else {
            return Ok(None);
        };
        issue.status = IssueStatus::Returned;
        issue.returned_at = Some(returned_at);
        let issue = issue.clone();

        if let Some(equipment) = tables
            .equipments
            .iter_mut()
            .find(|e| e.id == issue.equipment_id)
        {
            equipment.quantity += 1;
        }
        Ok(Some(issue))
    }

    async fn get_issue(&self, id: Uuid) -> Result<Option<Issue>> {
        let tables = self.tables.lock().await;
        Ok(tables.issues.iter().find(|i| i.id == id).cloned())
    }

    async fn list_issue_details(&self) -> Result<Vec<IssueDetails>> {
        let tables = self.tables.lock().await;
        let mut details: Vec<IssueDetails> = tables
            .issues
            .iter()
            .filter_map(|issue| {
                let student = tables.students.iter().find(|s| s.id == issue.student_id)?;
                let equipment = tables
                    .equipments
                    .iter()
                    .find(|e| e.id == issue.equipment_id)?;
                Some(IssueDetails {
                    issue: issue.clone(),
                    student_name: student.name.clone(),
                    equipment_name: equipment.name.clone(),
                })
            })
            .collect();
        details.sort_by(|a, b| b.issue.issued_at.cmp(&a.issue.issued_at));
        Ok(details)
    }

    async fn find_pending_reminders(&self, now: DateTime<Utc>) -> Result<Vec<OverdueIssue>> {
        let tables = self.tables.lock().await;
        let mut overdue: Vec<OverdueIssue> = tables
            .issues
            .iter()
            .filter(|issue| issue.needs_reminder(now))
            .filter_map(|issue| {
                let student = tables.students.iter().find(|s| s.id == issue.student_id)?;
                let equipment = tables
                    .equipments
                    .iter()
                    .find(|e| e.id == issue.equipment_id)?;
                Some(OverdueIssue {
                    issue_id: issue.id,
                    student_name: student.name.clone(),
                    phone: student.phone.clone(),
                    equipment_name: equipment.name.clone(),
                    issued_at: issue.issued_at,
                    due_at: issue.due_at,
                })
            })
            .collect();
        overdue.sort_by(|a, b| a.due_at.cmp(&b.due_at));
        Ok(overdue)
    }

    async fn mark_notified(&self, id: Uuid) -> Result<bool> {
        if self.fail_mark_notified.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut tables = self.tables.lock().await;
        match tables.issues.iter_mut().find(|i| i.id == id) {
            Some(issue) if !issue.notified => {
                issue.notified = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

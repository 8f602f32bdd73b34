// Models module - Database entity representations

pub mod equipment;
pub mod issue;
pub mod student;

pub use equipment::{Equipment, NewEquipment};
pub use issue::{Issue, IssueDetails, IssueStatus, NewIssue, OverdueIssue};
pub use student::{NewStudent, Student};

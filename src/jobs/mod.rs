// Jobs module - Scheduled background work

pub mod overdue_reminder;

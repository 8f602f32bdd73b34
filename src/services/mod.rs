// Services module - Business logic

pub mod inventory;
pub mod loans;
pub mod notifier;

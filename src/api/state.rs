use std::sync::Arc;

use chrono::FixedOffset;

use crate::services::loans::LoanPolicy;
use crate::store::LoanStore;

/// Shared handles passed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LoanStore>,
    pub policy: LoanPolicy,
    pub display_offset: FixedOffset,
}

impl AppState {
    pub fn new(store: Arc<dyn LoanStore>, policy: LoanPolicy, display_offset: FixedOffset) -> Self {
        Self {
            store,
            policy,
            display_offset,
        }
    }
}

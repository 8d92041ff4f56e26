use crate::models::activity::NewActivityLog;
use crate::store::{SharedStore, Table};

/// Best-effort audit trail. Writes are dispatched on a detached task;
/// a failed write is logged and never surfaces to the caller.
#[derive(Clone)]
pub struct ActivityLogger {
    store: SharedStore,
}

impl ActivityLogger {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn record(&self, entry: NewActivityLog) {
        let store = self.store.clone();
        tokio::spawn(async move {
            let row = match serde_json::to_value(&entry) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("failed to serialize activity log entry: {}", e);
                    return;
                }
            };
            if let Err(e) = store.insert(Table::ActivityLogs, row).await {
                tracing::warn!("failed to record activity: {}", e);
            }
        });
    }
}

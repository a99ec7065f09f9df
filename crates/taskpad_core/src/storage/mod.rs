use crate::error::AppError;
use crate::model::Task;
use log::warn;

mod file_store;

pub use file_store::{FileStore, store_dir};

/// Key holding the serialized task collection.
pub const TASKS_KEY: &str = "myTasks";
/// Key holding the cached device push token.
pub const PUSH_TOKEN_KEY: &str = "notification-token";

/// Durable key-value store for serialized blobs. A missing key and an
/// unreadable key are both reported as absence; reads never fail the caller.
pub trait StorageGateway: Send + Sync {
    fn read_blob(&self, key: &str) -> Option<String>;

    fn write_blob(&self, key: &str, payload: &str) -> Result<(), AppError>;
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, AppError> {
    serde_json::to_string(tasks).map_err(|err| AppError::invalid_data(err.to_string()))
}

pub fn decode_tasks(payload: &str) -> Result<Vec<Task>, AppError> {
    serde_json::from_str(payload).map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Reads the task collection, degrading to an empty collection when the key
/// is absent or the payload does not decode.
pub fn load_or_empty(gateway: &dyn StorageGateway) -> Vec<Task> {
    let Some(payload) = gateway.read_blob(TASKS_KEY) else {
        return Vec::new();
    };

    match decode_tasks(&payload) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!("discarding unreadable task collection: {err}");
            Vec::new()
        }
    }
}

use crate::error::AppError;
use crate::model::{MAX_TEXT_LEN, Priority, Task};
use crate::storage::{self, StorageGateway};
use log::error;
use std::sync::Arc;
use time::OffsetDateTime;

mod writer;

use writer::WriteQueue;

/// Authoritative in-memory task collection for the running session.
///
/// Every mutation applies synchronously in memory, then hands a full snapshot
/// of the collection to a background writer. Callers never wait on the write
/// and never see its failure; durability is best-effort and the in-memory
/// state stays the source of truth until the process exits.
pub struct TaskStore {
    tasks: Vec<Task>,
    writer: WriteQueue,
}

impl TaskStore {
    /// Reads the persisted collection (empty when absent or unreadable) and
    /// becomes the session's task state. Mutations only exist on a loaded
    /// store, so nothing can change the collection before the initial read.
    pub fn load(gateway: Arc<dyn StorageGateway>) -> Self {
        let tasks = storage::load_or_empty(gateway.as_ref());
        Self {
            tasks,
            writer: WriteQueue::start(gateway),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Prepends a new task. Text is trimmed and must be 1 to 200 characters.
    pub fn add_task(&mut self, text: &str, priority: Priority) -> Result<&Task, AppError> {
        let text = validate_text(text)?;
        let task = Task {
            id: generate_id(&self.tasks),
            text,
            completed: false,
            priority,
            created_at: now_millis(),
            completed_at: None,
        };

        self.tasks.insert(0, task);
        self.persist();
        Ok(&self.tasks[0])
    }

    /// Flips completion, stamping `completed_at` on the way in and clearing
    /// it on the way out. An unknown id changes nothing and returns false,
    /// but the snapshot is still persisted.
    pub fn toggle_completion(&mut self, id: &str) -> bool {
        let mut found = false;
        for task in &mut self.tasks {
            if task.id == id {
                if task.completed {
                    task.completed = false;
                    task.completed_at = None;
                } else {
                    task.completed = true;
                    task.completed_at = Some(now_millis());
                }
                found = true;
                break;
            }
        }

        self.persist();
        found
    }

    /// Removes the matching task; unknown ids are a no-op. Returns whether a
    /// task was removed.
    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        let removed = self.tasks.len() != before;

        self.persist();
        removed
    }

    /// Replaces text and priority in place; `completed`, `created_at`,
    /// `completed_at` and `id` are untouched. Validation failures and unknown
    /// ids leave the collection unchanged and write nothing.
    pub fn edit_task(
        &mut self,
        id: &str,
        new_text: &str,
        new_priority: Priority,
    ) -> Result<&Task, AppError> {
        let text = validate_text(new_text)?;
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::invalid_input("task not found"))?;

        let task = &mut self.tasks[index];
        task.text = text;
        task.priority = new_priority;

        self.persist();
        Ok(&self.tasks[index])
    }

    /// Blocks until all pending persistence writes have completed.
    pub fn flush(&self) {
        self.writer.flush();
    }

    fn persist(&self) {
        match storage::encode_tasks(&self.tasks) {
            Ok(payload) => self.writer.enqueue(payload),
            Err(err) => error!("task collection failed to serialize: {err}"),
        }
    }
}

pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn validate_text(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("task text is required"));
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::invalid_input(format!(
            "task text is limited to {MAX_TEXT_LEN} characters"
        )));
    }

    Ok(trimmed.to_string())
}

fn generate_id(tasks: &[Task]) -> String {
    let mut candidate = format!("task-{}", OffsetDateTime::now_utc().unix_timestamp_nanos());
    let mut attempt = 0u32;
    while tasks.iter().any(|task| task.id == candidate) {
        attempt += 1;
        candidate = format!(
            "task-{}-{attempt}",
            OffsetDateTime::now_utc().unix_timestamp_nanos()
        );
    }

    candidate
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::error::AppError;
    use crate::model::{Priority, Task};
    use crate::storage::{StorageGateway, TASKS_KEY, decode_tasks, encode_tasks};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct MemStore {
        blobs: Mutex<HashMap<String, String>>,
    }

    impl MemStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                blobs: Mutex::new(HashMap::new()),
            })
        }

        fn stored_tasks(&self) -> Vec<Task> {
            let blobs = self.blobs.lock().unwrap();
            let payload = blobs.get(TASKS_KEY).expect("tasks blob written");
            decode_tasks(payload).unwrap()
        }
    }

    impl StorageGateway for MemStore {
        fn read_blob(&self, key: &str) -> Option<String> {
            self.blobs.lock().unwrap().get(key).cloned()
        }

        fn write_blob(&self, key: &str, payload: &str) -> Result<(), AppError> {
            self.blobs
                .lock()
                .unwrap()
                .insert(key.to_string(), payload.to_string());
            Ok(())
        }
    }

    fn loaded_store() -> (Arc<MemStore>, TaskStore) {
        let gateway = MemStore::new();
        let store = TaskStore::load(gateway.clone());
        (gateway, store)
    }

    #[test]
    fn add_task_prepends_and_grows_by_one() {
        let (_, mut store) = loaded_store();

        store.add_task("first", Priority::Low).unwrap();
        store.add_task("second", Priority::Low).unwrap();

        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks()[0].text, "second");
        assert_eq!(store.tasks()[1].text, "first");
    }

    #[test]
    fn add_task_assigns_unique_ids() {
        let (_, mut store) = loaded_store();

        for n in 0..20 {
            store.add_task(&format!("task {n}"), Priority::Medium).unwrap();
        }

        let mut ids: Vec<&str> = store.tasks().iter().map(|task| task.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn add_task_rejects_blank_text() {
        let (_, mut store) = loaded_store();

        assert_eq!(
            store.add_task("", Priority::High).unwrap_err().code(),
            "invalid_input"
        );
        assert_eq!(
            store.add_task("   ", Priority::High).unwrap_err().code(),
            "invalid_input"
        );
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn add_task_rejects_overlong_text() {
        let (_, mut store) = loaded_store();
        let long = "x".repeat(201);

        let err = store.add_task(&long, Priority::Medium).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn add_task_trims_text_and_defaults_incomplete() {
        let (_, mut store) = loaded_store();

        let task = store.add_task("  Buy milk  ", Priority::High).unwrap();
        assert_eq!(task.text, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert!(task.created_at > 0);
    }

    #[test]
    fn toggle_completion_is_its_own_inverse() {
        let (_, mut store) = loaded_store();
        let id = store.add_task("demo", Priority::Medium).unwrap().id.clone();

        assert!(store.toggle_completion(&id));
        assert!(store.tasks()[0].completed);
        assert!(store.tasks()[0].completed_at.is_some());

        assert!(store.toggle_completion(&id));
        assert!(!store.tasks()[0].completed);
        assert_eq!(store.tasks()[0].completed_at, None);
    }

    #[test]
    fn toggle_completion_unknown_id_is_noop_but_persists() {
        let (gateway, mut store) = loaded_store();
        store.add_task("demo", Priority::Medium).unwrap();
        let before = store.tasks().to_vec();

        assert!(!store.toggle_completion("task-missing"));
        assert_eq!(store.tasks(), before.as_slice());

        store.flush();
        assert_eq!(gateway.stored_tasks(), before);
    }

    #[test]
    fn delete_task_removes_matching_task() {
        let (_, mut store) = loaded_store();
        let keep = store.add_task("keep", Priority::Low).unwrap().id.clone();
        let doomed = store.add_task("drop", Priority::Low).unwrap().id.clone();

        assert!(store.delete_task(&doomed));
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, keep);

        assert!(!store.delete_task("task-missing"));
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn edit_task_replaces_text_and_priority_only() {
        let (_, mut store) = loaded_store();
        let original = store.add_task("Call Bob", Priority::Low).unwrap().clone();

        let edited = store
            .edit_task(&original.id, "Call Bob tomorrow", Priority::Medium)
            .unwrap();

        assert_eq!(edited.text, "Call Bob tomorrow");
        assert_eq!(edited.priority, Priority::Medium);
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.completed, original.completed);
        assert_eq!(edited.completed_at, original.completed_at);
    }

    #[test]
    fn edit_task_rejects_blank_text_without_changes() {
        let (_, mut store) = loaded_store();
        let id = store.add_task("demo", Priority::Medium).unwrap().id.clone();
        let before = store.tasks().to_vec();

        let err = store.edit_task(&id, "  ", Priority::High).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn edit_task_rejects_overlong_text() {
        let (_, mut store) = loaded_store();
        let id = store.add_task("demo", Priority::Medium).unwrap().id.clone();
        let long = "y".repeat(201);

        let err = store.edit_task(&id, &long, Priority::Low).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(store.tasks()[0].text, "demo");
        assert_eq!(store.tasks()[0].priority, Priority::Medium);
    }

    #[test]
    fn edit_task_unknown_id_is_an_error() {
        let (_, mut store) = loaded_store();

        let err = store
            .edit_task("task-missing", "demo", Priority::High)
            .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn mutations_persist_full_snapshot_in_order() {
        let (gateway, mut store) = loaded_store();

        let id = store.add_task("demo", Priority::High).unwrap().id.clone();
        store.toggle_completion(&id);
        store.flush();

        let stored = gateway.stored_tasks();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].completed);
        assert!(stored[0].completed_at.is_some());
        assert_eq!(stored, store.tasks().to_vec());
    }

    #[test]
    fn load_reads_previously_persisted_collection() {
        let gateway = MemStore::new();
        {
            let mut store = TaskStore::load(gateway.clone());
            store.add_task("persisted", Priority::High).unwrap();
            store.flush();
        }

        let reloaded = TaskStore::load(gateway);
        assert_eq!(reloaded.tasks().len(), 1);
        assert_eq!(reloaded.tasks()[0].text, "persisted");
    }

    #[test]
    fn load_recovers_from_corrupt_blob_and_can_mutate() {
        let gateway = MemStore::new();
        gateway.write_blob(TASKS_KEY, "not json at all").unwrap();

        let mut store = TaskStore::load(gateway.clone());
        assert!(store.tasks().is_empty());

        store.add_task("fresh start", Priority::Medium).unwrap();
        store.flush();
        assert_eq!(gateway.stored_tasks().len(), 1);
    }

    #[test]
    fn persisted_payload_round_trips_deep_equal() {
        let (gateway, mut store) = loaded_store();
        store.add_task("Buy milk", Priority::High).unwrap();
        let id = store.add_task("Call Bob", Priority::Low).unwrap().id.clone();
        store.toggle_completion(&id);
        store.flush();

        let payload = encode_tasks(store.tasks()).unwrap();
        assert_eq!(decode_tasks(&payload).unwrap(), store.tasks().to_vec());
        assert_eq!(gateway.stored_tasks(), store.tasks().to_vec());
    }
}

//! Task store keeping the whole collection as one JSON document.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use entities::{
    due_soon_threshold, listing_order, next_timestamp, now, CreateTask, Task, UpdateTask,
};
use tokio::sync::Mutex;

use crate::{DocumentStorage, TaskStore, TaskStoreError, TaskStoreResult, UpdateOutcome};

/// Key the task document is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "todo-app-data";

/// Task store over a key-value [`DocumentStorage`].
///
/// Each operation loads the whole document, changes it in memory and writes
/// it back. Operations on one instance are serialized; separate processes
/// sharing the same storage are not coordinated.
pub struct LocalTaskStore<D: DocumentStorage> {
    storage: D,
    key: String,
    /// Highest id handed out so far. Guards every load/save cycle.
    last_issued_id: Mutex<i64>,
}

impl<D: DocumentStorage> LocalTaskStore<D> {
    /// Creates a store over `storage` using [`DEFAULT_STORAGE_KEY`].
    pub fn new(storage: D) -> Self {
        Self::with_key(storage, DEFAULT_STORAGE_KEY)
    }

    /// Creates a store over `storage` using a custom document key.
    pub fn with_key(storage: D, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            last_issued_id: Mutex::new(0),
        }
    }

    /// Loads the document, seeding sample tasks when it is absent, blank, or
    /// unreadable.
    ///
    /// A stored empty array is a list the user emptied, not a fresh install:
    /// it loads as empty and the samples are not added back.
    async fn load(&self, last_issued_id: &mut i64) -> TaskStoreResult<Vec<Task>> {
        let raw = match self.storage.get_item(&self.key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Task document unreadable");
                None
            }
        };

        let parsed = match raw.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => match serde_json::from_str::<Vec<Task>>(text) {
                Ok(tasks) => Some(tasks),
                Err(e) => {
                    tracing::warn!(key = %self.key, error = %e, "Task document corrupt");
                    None
                }
            },
        };

        let tasks = match parsed {
            Some(tasks) => tasks,
            None => {
                let samples = sample_tasks(*last_issued_id, now())?;
                tracing::info!(key = %self.key, count = samples.len(), "Seeding sample tasks");
                self.save(&samples).await?;
                samples
            }
        };

        if let Some(max_id) = tasks.iter().map(|t| t.id).max() {
            *last_issued_id = (*last_issued_id).max(max_id);
        }

        Ok(tasks)
    }

    async fn save(&self, tasks: &[Task]) -> TaskStoreResult<()> {
        let document = serde_json::to_string(tasks)?;
        self.storage.set_item(&self.key, &document).await
    }
}

/// Builds the tasks a fresh document starts with, numbered after
/// `last_issued_id`.
fn sample_tasks(last_issued_id: i64, now: DateTime<Utc>) -> TaskStoreResult<Vec<Task>> {
    let today = now.date_naive();
    let sample = |offset: i64,
                  title: &str,
                  description: &str,
                  due_in_days: Option<i64>|
     -> TaskStoreResult<Task> {
        Ok(Task {
            id: id_after(last_issued_id, offset)?,
            title: title.to_string(),
            description: Some(description.to_string()),
            due_date: due_in_days.map(|days| today + Duration::days(days)),
            completed: false,
            created_at: now,
            updated_at: now,
        })
    };

    Ok(vec![
        sample(
            1,
            "Welcome to Todo App!",
            "This is a sample todo item. You can edit, complete, or delete it.",
            Some(1),
        )?,
        sample(
            2,
            "Try adding a new todo",
            "Use the form on the left to create your own todo items with due dates.",
            None,
        )?,
        sample(
            3,
            "Plan weekend activities",
            "Decide what to do this weekend - maybe visit a museum or go hiking!",
            Some(7),
        )?,
    ])
}

/// Returns the id `offset` places after `last_issued_id`.
fn id_after(last_issued_id: i64, offset: i64) -> TaskStoreResult<i64> {
    last_issued_id.checked_add(offset).ok_or_else(|| {
        TaskStoreError::InvalidRecord(format!("no task ids left after {last_issued_id}"))
    })
}

#[async_trait]
impl<D: DocumentStorage> TaskStore for LocalTaskStore<D> {
    async fn list_all(&self) -> TaskStoreResult<Vec<Task>> {
        let mut last_issued_id = self.last_issued_id.lock().await;
        let mut tasks = self.load(&mut last_issued_id).await?;
        tasks.sort_by(listing_order);
        Ok(tasks)
    }

    async fn list_due_soon(&self) -> TaskStoreResult<Vec<Task>> {
        let threshold = due_soon_threshold(now());

        let mut last_issued_id = self.last_issued_id.lock().await;
        let mut tasks: Vec<Task> = self
            .load(&mut last_issued_id)
            .await?
            .into_iter()
            .filter(|t| t.is_due_soon(threshold))
            .collect();
        tasks.sort_by(listing_order);
        Ok(tasks)
    }

    async fn create(&self, input: CreateTask) -> TaskStoreResult<Task> {
        input.validate()?;

        let mut last_issued_id = self.last_issued_id.lock().await;
        let mut tasks = self.load(&mut last_issued_id).await?;

        let id = id_after(*last_issued_id, 1)?;
        let task = Task::from_input(id, input, now());
        tasks.push(task.clone());
        self.save(&tasks).await?;
        *last_issued_id = id;

        tracing::debug!(id, "Stored todo");
        Ok(task)
    }

    async fn update(&self, id: i64, patch: UpdateTask) -> TaskStoreResult<UpdateOutcome> {
        patch.validate()?;

        let mut last_issued_id = self.last_issued_id.lock().await;
        let mut tasks = self.load(&mut last_issued_id).await?;

        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| TaskStoreError::not_found("Todo", id))?;

        if patch.is_empty() {
            return Ok(UpdateOutcome::Unchanged(task.clone()));
        }

        let stamp = next_timestamp(task.updated_at);
        task.apply(patch, stamp);
        let updated = task.clone();
        self.save(&tasks).await?;

        Ok(UpdateOutcome::Updated(updated))
    }

    async fn delete(&self, id: i64) -> TaskStoreResult<bool> {
        let mut last_issued_id = self.last_issued_id.lock().await;
        let mut tasks = self.load(&mut last_issued_id).await?;

        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Ok(false);
        }

        self.save(&tasks).await?;
        Ok(true)
    }

    async fn get(&self, id: i64) -> TaskStoreResult<Option<Task>> {
        let mut last_issued_id = self.last_issued_id.lock().await;
        let tasks = self.load(&mut last_issued_id).await?;
        Ok(tasks.into_iter().find(|t| t.id == id))
    }
}

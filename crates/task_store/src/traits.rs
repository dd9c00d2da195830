//! Task store trait definitions.

use async_trait::async_trait;
use entities::{CreateTask, Task, UpdateTask};

use crate::TaskStoreResult;

/// Result of a successful [`TaskStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// At least one field was written; `updated_at` was refreshed.
    Updated(Task),
    /// The patch carried no fields. Nothing was written.
    Unchanged(Task),
}

impl UpdateOutcome {
    /// Returns the task as it now stands in the store.
    pub fn into_task(self) -> Task {
        match self {
            Self::Updated(task) | Self::Unchanged(task) => task,
        }
    }

    /// Returns true if the store was written.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

/// Trait for task storage operations.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Lists every task: due date ascending with undated tasks last, then
    /// newest first.
    async fn list_all(&self) -> TaskStoreResult<Vec<Task>>;

    /// Lists open tasks due within the next 24 hours (or overdue), earliest
    /// due date first.
    async fn list_due_soon(&self) -> TaskStoreResult<Vec<Task>>;

    /// Validates and persists a new task, returning the stored record.
    async fn create(&self, input: CreateTask) -> TaskStoreResult<Task>;

    /// Applies the fields present in `patch` to task `id`.
    ///
    /// Fails with `NotFound` if the task does not exist and with
    /// `Validation` if the patch sets an empty title.
    async fn update(&self, id: i64, patch: UpdateTask) -> TaskStoreResult<UpdateOutcome>;

    /// Deletes a task. Returns whether a record was removed.
    async fn delete(&self, id: i64) -> TaskStoreResult<bool>;

    /// Gets a task by ID.
    async fn get(&self, id: i64) -> TaskStoreResult<Option<Task>>;
}


/// Expands to one `#[tokio::test]` per [`contract`] check. `$open` must be
/// an expression evaluating to a future of `(guard, store)` where the store
/// starts out empty.
#[cfg(test)]
macro_rules! store_contract_tests {
    ($open:expr) => {
        store_contract_tests!(@cases $open;
            get_after_create_matches,
            title_only_defaults,
            blank_title_is_rejected,
            titles_are_stored_trimmed,
            completing_bumps_updated_at,
            delete_twice,
            due_soon_excludes_undated_and_completed,
            listing_scenario,
            undated_newest_first,
            update_missing_is_not_found,
            empty_patch_is_unchanged,
            patch_edits_and_clears_fields,
            ids_are_not_reused,
        );
    };
    (@cases $open:expr; $($case:ident),* $(,)?) => {
        $(
            #[tokio::test]
            async fn $case() {
                let (_guard, store) = $open.await;
                $crate::traits::contract::$case(&store).await;
            }
        )*
    };
}

#[cfg(test)]
pub(crate) use store_contract_tests;

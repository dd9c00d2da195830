//! SQLite-backed task store.

use std::path::Path;

use async_trait::async_trait;
use entities::{
    due_soon_threshold, format_timestamp, next_timestamp, now, parse_timestamp, CreateTask, Task,
    UpdateTask,
};
use sqlx::{
    sqlite::{SqliteConnection, SqlitePoolOptions},
    FromRow, Pool, QueryBuilder, Sqlite,
};

use crate::{TaskStore, TaskStoreError, TaskStoreResult, UpdateOutcome};

/// Schema applied when the store is opened.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    due_date TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_todos_due_date ON todos(due_date);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, due_date, completed, created_at, updated_at FROM todos";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database row for Task
#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: Option<String>,
    due_date: Option<String>,
    completed: bool,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TodoRow> for Task {
    type Error = TaskStoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |column: &str, value: &str| {
            TaskStoreError::InvalidRecord(format!("todo {id} has bad {column}: {value:?}"))
        };

        let due_date = row
            .due_date
            .as_deref()
            .map(|value| {
                chrono::NaiveDate::parse_from_str(value, DATE_FORMAT)
                    .map_err(|_| invalid("due_date", value))
            })
            .transpose()?;
        let created_at =
            parse_timestamp(&row.created_at).map_err(|_| invalid("created_at", &row.created_at))?;
        let updated_at =
            parse_timestamp(&row.updated_at).map_err(|_| invalid("updated_at", &row.updated_at))?;

        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date,
            completed: row.completed,
            created_at,
            updated_at,
        })
    }
}

fn format_date(date: &chrono::NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn rows_to_tasks(rows: Vec<TodoRow>) -> TaskStoreResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

async fn fetch_row(conn: &mut SqliteConnection, id: i64) -> TaskStoreResult<Option<TodoRow>> {
    let row: Option<TodoRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Applies `patch` to a row the caller holds the write lock on.
async fn update_locked(
    conn: &mut SqliteConnection,
    id: i64,
    patch: UpdateTask,
) -> TaskStoreResult<UpdateOutcome> {
    let current = fetch_row(conn, id)
        .await?
        .ok_or_else(|| TaskStoreError::not_found("Todo", id))?;
    let current = Task::try_from(current)?;

    if patch.is_empty() {
        return Ok(UpdateOutcome::Unchanged(current));
    }

    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE todos SET ");
    let mut set = builder.separated(", ");
    if let Some(title) = patch.title {
        set.push("title = ").push_bind_unseparated(title.trim().to_string());
    }
    if let Some(description) = patch.description {
        set.push("description = ").push_bind_unseparated(description);
    }
    if let Some(due_date) = patch.due_date {
        set.push("due_date = ")
            .push_bind_unseparated(due_date.as_ref().map(format_date));
    }
    if let Some(completed) = patch.completed {
        set.push("completed = ").push_bind_unseparated(completed);
    }
    set.push("updated_at = ")
        .push_bind_unseparated(format_timestamp(&next_timestamp(current.updated_at)));
    builder.push(" WHERE id = ").push_bind(id);

    builder.build().execute(&mut *conn).await?;

    let row = fetch_row(conn, id)
        .await?
        .ok_or_else(|| TaskStoreError::not_found("Todo", id))?;

    Ok(UpdateOutcome::Updated(Task::try_from(row)?))
}

/// Task store backed by a single SQLite table.
pub struct SqliteTaskStore {
    pool: Pool<Sqlite>,
}

impl SqliteTaskStore {
    /// Opens (creating if needed) the database file at `db_path` and applies
    /// the schema.
    pub async fn open(db_path: &Path) -> TaskStoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        tracing::debug!(path = %db_path.display(), "Opened SQLite task store");

        Ok(store)
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn run_migrations(&self) -> TaskStoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn list_all(&self) -> TaskStoreResult<Vec<Task>> {
        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS} ORDER BY due_date IS NULL, due_date ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows_to_tasks(rows)
    }

    async fn list_due_soon(&self) -> TaskStoreResult<Vec<Task>> {
        let threshold = format_date(&due_soon_threshold(now()));

        let rows: Vec<TodoRow> = sqlx::query_as(&format!(
            "{SELECT_COLUMNS}
             WHERE due_date IS NOT NULL AND due_date <= ? AND completed = 0
             ORDER BY due_date ASC, created_at DESC"
        ))
        .bind(&threshold)
        .fetch_all(&self.pool)
        .await?;

        rows_to_tasks(rows)
    }

    async fn create(&self, input: CreateTask) -> TaskStoreResult<Task> {
        input.validate()?;

        let stamp = format_timestamp(&now());

        let result = sqlx::query(
            "INSERT INTO todos (title, description, due_date, completed, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.due_date.as_ref().map(format_date))
        .bind(&stamp)
        .bind(&stamp)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::debug!(id, "Inserted todo");

        self.get(id)
            .await?
            .ok_or_else(|| TaskStoreError::not_found("Todo", id))
    }

    async fn update(&self, id: i64, patch: UpdateTask) -> TaskStoreResult<UpdateOutcome> {
        patch.validate()?;

        let mut tx = self.pool.begin().await?;

        // The first statement must be a write: a transaction that has already
        // read cannot wait for the write lock and fails with SQLITE_BUSY.
        let claimed = sqlx::query("UPDATE todos SET id = id WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if claimed.rows_affected() == 0 {
            return Err(TaskStoreError::not_found("Todo", id));
        }

        let outcome = update_locked(&mut tx, id, patch).await?;
        tx.commit().await?;

        Ok(outcome)
    }

    async fn delete(&self, id: i64) -> TaskStoreResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: i64) -> TaskStoreResult<Option<Task>> {
        let row: Option<TodoRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }
}

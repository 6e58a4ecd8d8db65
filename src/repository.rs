use crate::models::Note;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// NoteRepository
///
/// Abstract contract for note persistence. Handlers only see this trait, which
/// lets tests substitute an in-memory implementation.
///
/// Every read and write is scoped to `user_id`; a note owned by someone else
/// behaves exactly like a missing one.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// All notes of a user, most recently updated first (sidebar order).
    async fn get_notes(&self, user_id: Uuid) -> Vec<Note>;
    async fn get_newest_note(&self, user_id: Uuid) -> Option<Note>;
    async fn get_note(&self, id: Uuid, user_id: Uuid) -> Option<Note>;
    /// Inserts an empty note. `None` if the insert failed.
    async fn create_note(&self, user_id: Uuid) -> Option<Note>;
    async fn update_note(&self, id: Uuid, user_id: Uuid, text: String) -> Option<Note>;
    async fn delete_note(&self, id: Uuid, user_id: Uuid) -> bool;
}

pub type RepositoryState = Arc<dyn NoteRepository>;

/// PostgresRepository
///
/// `NoteRepository` backed by the `notes` table.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const NOTE_COLUMNS: &str = "id, author_id, text, created_at, updated_at";

#[async_trait]
impl NoteRepository for PostgresRepository {
    async fn get_notes(&self, user_id: Uuid) -> Vec<Note> {
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE author_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_notes error: {:?}", e);
                vec![]
            })
    }

    async fn get_newest_note(&self, user_id: Uuid) -> Option<Note> {
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE author_id = $1 ORDER BY updated_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_newest_note error: {:?}", e);
                None
            })
    }

    async fn get_note(&self, id: Uuid, user_id: Uuid) -> Option<Note> {
        let query = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1 AND author_id = $2");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_note error: {:?}", e);
                None
            })
    }

    async fn create_note(&self, user_id: Uuid) -> Option<Note> {
        let query = format!(
            "INSERT INTO notes (id, author_id, text, created_at, updated_at) \
             VALUES ($1, $2, '', NOW(), NOW()) RETURNING {NOTE_COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| tracing::error!("create_note error: {:?}", e))
            .ok()
    }

    /// Owner-only; bumps `updated_at` so the note moves to the top of the sidebar.
    async fn update_note(&self, id: Uuid, user_id: Uuid, text: String) -> Option<Note> {
        let query = format!(
            "UPDATE notes SET text = $3, updated_at = NOW() \
             WHERE id = $1 AND author_id = $2 RETURNING {NOTE_COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(user_id)
            .bind(text)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_note error: {:?}", e);
                None
            })
    }

    async fn delete_note(&self, id: Uuid, user_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM notes WHERE id = $1 AND author_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_note error: {:?}", e);
                false
            }
        }
    }
}

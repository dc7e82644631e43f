use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")] NotFound,
    #[error("{0}")] Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait QuestionRepo: Send + Sync {
    /// Newest first, at most `limit` entries.
    async fn list_questions(&self, filter: &QuestionFilter, limit: i64) -> RepoResult<Vec<Question>>;
    /// Insert, or merge into the question with the same `question_text`.
    async fn upsert_question(&self, new: NewQuestion, is_ruf: bool) -> RepoResult<Question>;
    async fn get_question(&self, id: Id) -> RepoResult<Question>;
    async fn upsert_comment(&self, id: Id, user_id: &str, text: &str) -> RepoResult<Question>;
    async fn count_questions(&self) -> RepoResult<u64>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Create-if-absent, then count one attempt (and one point when correct)
    /// in a single atomic step.
    async fn record_attempt(&self, username: &str, correct: bool) -> RepoResult<User>;
    async fn get_user(&self, username: &str) -> RepoResult<Option<User>>;
}

pub trait Repo: QuestionRepo + UserRepo {}

impl<T> Repo for T where T: QuestionRepo + UserRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        questions: Vec<Question>, // insertion order
        users: HashMap<String, User>,
    }

    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Option<Arc<PathBuf>>,
    }

    impl InMemRepo {
        /// Purely in-memory; nothing survives the process.
        pub fn new() -> Self { Self::default() }

        /// Load `path` if it exists and rewrite it after every mutation.
        pub fn with_snapshot(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            let state = Self::load_state_from(&path);
            Self { state: Arc::new(RwLock::new(state)), snapshot_path: Some(Arc::new(path)) }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        log::info!("[inmem] Loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        log::warn!("[inmem] Failed to parse snapshot '{}': {e}. Starting empty.", path.display());
                        State::default()
                    }
                },
                Err(e) => {
                    log::info!("[inmem] No snapshot at '{}': {e}. Starting empty.", path.display());
                    State::default()
                }
            }
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Internal("state lock poisoned".into()))
        }

        /// Write `state` to the snapshot file. Called with the write guard held
        /// so callers can roll back the mutation when this fails.
        fn persist(&self, state: &State) -> RepoResult<()> {
            let Some(path) = self.snapshot_path.as_deref() else { return Ok(()) };
            let bytes = serde_json::to_vec_pretty(state)
                .map_err(|e| RepoError::Internal(format!("snapshot encode: {e}")))?;
            if let Some(dir) = path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            std::fs::write(path, bytes).map_err(|e| {
                log::error!("[inmem] Failed to write snapshot '{}': {e}", path.display());
                RepoError::Internal(format!("snapshot write: {e}"))
            })
        }
    }

    #[async_trait]
    impl QuestionRepo for InMemRepo {
        async fn list_questions(&self, filter: &QuestionFilter, limit: i64) -> RepoResult<Vec<Question>> {
            let s = self.read()?;
            // reverse insertion order first so equal timestamps still list newest first
            let mut v: Vec<_> = s.questions.iter().rev().filter(|q| filter.matches(q)).cloned().collect();
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            v.truncate(usize::try_from(limit).unwrap_or(0));
            Ok(v)
        }

        async fn upsert_question(&self, new: NewQuestion, is_ruf: bool) -> RepoResult<Question> {
            let mut s = self.write()?;
            let (stored, previous) = match s.questions.iter().position(|q| q.question_text == new.question_text) {
                Some(i) => {
                    let before = s.questions[i].clone();
                    s.questions[i].merge(new, is_ruf);
                    (s.questions[i].clone(), Some((i, before)))
                }
                None => {
                    let q = Question::from_new(new, is_ruf, Utc::now());
                    s.questions.push(q.clone());
                    (q, None)
                }
            };
            if let Err(e) = self.persist(&s) {
                match previous {
                    Some((i, before)) => s.questions[i] = before,
                    None => { s.questions.pop(); }
                }
                return Err(e);
            }
            Ok(stored)
        }

        async fn get_question(&self, id: Id) -> RepoResult<Question> {
            let s = self.read()?;
            s.questions.iter().find(|q| q.id == id).cloned().ok_or(RepoError::NotFound)
        }

        async fn upsert_comment(&self, id: Id, user_id: &str, text: &str) -> RepoResult<Question> {
            let mut s = self.write()?;
            let i = s.questions.iter().position(|q| q.id == id).ok_or(RepoError::NotFound)?;
            let before = s.questions[i].clone();
            s.questions[i].upsert_comment(user_id, text, Utc::now());
            if let Err(e) = self.persist(&s) {
                s.questions[i] = before;
                return Err(e);
            }
            Ok(s.questions[i].clone())
        }

        async fn count_questions(&self) -> RepoResult<u64> {
            Ok(self.read()?.questions.len() as u64)
        }
    }

    #[async_trait]
    impl UserRepo for InMemRepo {
        async fn record_attempt(&self, username: &str, correct: bool) -> RepoResult<User> {
            let mut s = self.write()?;
            let before = s.users.get(username).cloned();
            let user = s.users.entry(username.to_string()).or_insert_with(|| User::empty(username));
            user.total_attempts += 1;
            if correct { user.total_score += 1; }
            let updated = user.clone();
            if let Err(e) = self.persist(&s) {
                match before {
                    Some(u) => { s.users.insert(username.to_string(), u); }
                    None => { s.users.remove(username); }
                }
                return Err(e);
            }
            Ok(updated)
        }

        async fn get_user(&self, username: &str) -> RepoResult<Option<User>> {
            Ok(self.read()?.users.get(username).cloned())
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use chrono::{DateTime, Utc};
    use sqlx::types::Json;
    use sqlx::{Pool, Postgres};
    use uuid::Uuid;

    const QUESTION_COLUMNS: &str =
        "id, question_text, subject, topic, difficulty, options, explanation, comments, is_ruf, created_at";

    impl From<sqlx::Error> for RepoError {
        fn from(e: sqlx::Error) -> Self {
            match e {
                sqlx::Error::RowNotFound => RepoError::NotFound,
                other => RepoError::Internal(other.to_string()),
            }
        }
    }

    /// Question document as stored: scalars as columns, options and comments as JSONB.
    #[derive(sqlx::FromRow)]
    struct QuestionRow {
        id: Uuid,
        question_text: String,
        subject: String,
        topic: String,
        difficulty: String,
        options: Json<Vec<QuestionOption>>,
        explanation: Option<String>,
        comments: Json<Vec<Comment>>,
        is_ruf: bool,
        created_at: DateTime<Utc>,
    }

    impl From<QuestionRow> for Question {
        fn from(r: QuestionRow) -> Self {
            Question {
                id: r.id,
                question_text: r.question_text,
                subject: r.subject,
                topic: r.topic,
                difficulty: r.difficulty,
                options: r.options.0,
                explanation: r.explanation,
                comments: r.comments.0,
                is_ruf: r.is_ruf,
                created_at: r.created_at,
            }
        }
    }

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }
    }

    #[async_trait]
    impl QuestionRepo for PgRepo {
        async fn list_questions(&self, filter: &QuestionFilter, limit: i64) -> RepoResult<Vec<Question>> {
            let sql = format!(r#"
                SELECT {QUESTION_COLUMNS} FROM questions
                WHERE ($1::text IS NULL OR subject = $1)
                  AND ($2::text IS NULL OR topic = $2)
                  AND ($3::text IS NULL OR difficulty = $3)
                ORDER BY created_at DESC, id
                LIMIT $4
            "#);
            let rows = sqlx::query_as::<_, QuestionRow>(&sql)
                .bind(filter.subject.as_deref())
                .bind(filter.topic.as_deref())
                .bind(filter.difficulty.as_deref())
                .bind(limit)
                .fetch_all(&self.pool).await?;
            Ok(rows.into_iter().map(Question::from).collect())
        }

        async fn upsert_question(&self, new: NewQuestion, is_ruf: bool) -> RepoResult<Question> {
            // $5 / $7 stay NULL when omitted so the stored value survives an update
            let sql = format!(r#"
                INSERT INTO questions (id, question_text, subject, topic, difficulty, options, explanation, comments, is_ruf, created_at)
                VALUES ($1, $2, $3, $4, COALESCE($5, ''), $6, $7, '[]'::jsonb, $8, now())
                ON CONFLICT (question_text) DO UPDATE SET
                    subject = EXCLUDED.subject,
                    topic = EXCLUDED.topic,
                    difficulty = COALESCE($5, questions.difficulty),
                    options = EXCLUDED.options,
                    explanation = COALESCE($7, questions.explanation),
                    is_ruf = EXCLUDED.is_ruf
                RETURNING {QUESTION_COLUMNS}
            "#);
            let row = sqlx::query_as::<_, QuestionRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(&new.question_text)
                .bind(&new.subject)
                .bind(&new.topic)
                .bind(new.difficulty.as_deref())
                .bind(Json(&new.options))
                .bind(new.explanation.as_deref())
                .bind(is_ruf)
                .fetch_one(&self.pool).await?;
            Ok(row.into())
        }

        async fn get_question(&self, id: Id) -> RepoResult<Question> {
            let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
            let row = sqlx::query_as::<_, QuestionRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool).await?
                .ok_or(RepoError::NotFound)?;
            Ok(row.into())
        }

        async fn upsert_comment(&self, id: Id, user_id: &str, text: &str) -> RepoResult<Question> {
            let mut tx = self.pool.begin().await?;
            let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1 FOR UPDATE");
            let mut question: Question = sqlx::query_as::<_, QuestionRow>(&sql)
                .bind(id)
                .fetch_optional(&mut *tx).await?
                .ok_or(RepoError::NotFound)?
                .into();
            question.upsert_comment(user_id, text, Utc::now());
            sqlx::query("UPDATE questions SET comments = $2 WHERE id = $1")
                .bind(id)
                .bind(Json(&question.comments))
                .execute(&mut *tx).await?;
            tx.commit().await?;
            Ok(question)
        }

        async fn count_questions(&self) -> RepoResult<u64> {
            let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM questions")
                .fetch_one(&self.pool).await?;
            Ok(n.max(0) as u64)
        }
    }

    #[async_trait]
    impl UserRepo for PgRepo {
        async fn record_attempt(&self, username: &str, correct: bool) -> RepoResult<User> {
            let user = sqlx::query_as::<_, User>(r#"
                INSERT INTO users (username, total_score, total_attempts)
                VALUES ($1, $2, 1)
                ON CONFLICT (username) DO UPDATE SET
                    total_score = users.total_score + EXCLUDED.total_score,
                    total_attempts = users.total_attempts + 1
                RETURNING username, total_score, total_attempts, weak_topics
            "#)
                .bind(username)
                .bind(i64::from(correct))
                .fetch_one(&self.pool).await?;
            Ok(user)
        }

        async fn get_user(&self, username: &str) -> RepoResult<Option<User>> {
            let user = sqlx::query_as::<_, User>(
                "SELECT username, total_score, total_attempts, weak_topics FROM users WHERE username = $1"
            )
                .bind(username)
                .fetch_optional(&self.pool).await?;
            Ok(user)
        }
    }
}

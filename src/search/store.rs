//! Example store backed by SQLite.
//!
//! Embeddings are stored as little-endian `f32` BLOBs and compared in Rust
//! with cosine similarity (`similarity = 1 - cosine distance`) over a linear
//! scan.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::embedding::cosine_similarity;
use crate::core::error::{RagError, Result};
use crate::core::example::{Example, ExampleDraft};

/// Metadata key holding the embedding dimension of the current contents.
const META_DIMENSION: &str = "embedding_dim";

const SELECT_EXAMPLE: &str = r#"
    SELECT x.id, x.question, x.answer, x.score, x.category, x.created_at, e.embedding
    FROM examples x
    JOIN embeddings e ON x.id = e.example_id
"#;

/// Persistent store of examples and their embeddings.
pub struct ExampleStore {
    conn: Mutex<Connection>,
}

impl ExampleStore {
    /// Open or create the database at path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS examples (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                score INTEGER NOT NULL,
                category TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                example_id TEXT PRIMARY KEY,
                embedding BLOB NOT NULL,
                FOREIGN KEY (example_id) REFERENCES examples(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS store_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_examples_category ON examples(category);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RagError::store("store connection lock poisoned"))
    }

    /// Insert or replace an example with its embedding; returns the id.
    ///
    /// Record, vector and dimension are written in one transaction. The first
    /// insert into an empty store fixes the dimension for later calls.
    pub fn add(&self, draft: &ExampleDraft, embedding: &[f32]) -> Result<String> {
        if embedding.is_empty() {
            return Err(RagError::embedding("embedding is empty"));
        }

        let id = draft.id();
        let now = chrono::Utc::now().timestamp();
        let blob = embedding_to_blob(embedding);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let count: i64 = tx.query_row("SELECT COUNT(*) FROM examples", [], |row| row.get(0))?;
        let recorded = if count == 0 {
            None
        } else {
            read_dimension(&tx)?
        };
        match recorded {
            Some(expected) if expected != embedding.len() => {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            Some(_) => {}
            None => {
                tx.execute(
                    "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![META_DIMENSION, embedding.len().to_string()],
                )?;
            }
        }

        tx.execute(
            r#"
            INSERT INTO examples (id, question, answer, score, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                score = excluded.score,
                category = excluded.category,
                created_at = excluded.created_at
            "#,
            params![
                id,
                draft.question,
                draft.answer,
                draft.score,
                draft.category,
                now
            ],
        )?;

        tx.execute(
            r#"
            INSERT INTO embeddings (example_id, embedding)
            VALUES (?1, ?2)
            ON CONFLICT(example_id) DO UPDATE SET embedding = excluded.embedding
            "#,
            params![id, blob],
        )?;

        tx.commit()?;
        Ok(id)
    }

    /// Nearest examples to `embedding`, most similar first.
    ///
    /// `k` is clamped to `[1, count()]`. Equal similarities are ordered by
    /// ascending id. An empty store yields an empty result.
    pub fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<(Example, f32)>> {
        let conn = self.lock()?;

        let count = count_rows(&conn)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let k = k.clamp(1, count);

        if let Some(expected) = read_dimension(&conn)? {
            if expected != embedding.len() {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let mut stmt = conn.prepare(SELECT_EXAMPLE)?;
        let rows = stmt.query_map([], row_to_example)?;

        let mut results: Vec<(Example, f32)> = Vec::with_capacity(count);
        for row in rows {
            let example = row?;
            let similarity = cosine_similarity(embedding, &example.embedding);
            results.push((example, similarity));
        }

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.cmp(&b.0.id)));
        results.truncate(k);

        Ok(results)
    }

    /// Total number of stored examples.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        count_rows(&conn)
    }

    /// Delete every example; the store returns to its empty state.
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM embeddings", [])?;
        tx.execute("DELETE FROM examples", [])?;
        tx.execute("DELETE FROM store_meta WHERE key = ?1", params![META_DIMENSION])?;
        tx.commit()?;
        Ok(())
    }

    /// Get example by ID
    pub fn get(&self, id: &str) -> Result<Option<Example>> {
        let conn = self.lock()?;
        let sql = format!("{} WHERE x.id = ?1", SELECT_EXAMPLE);
        let example = conn
            .query_row(&sql, params![id], row_to_example)
            .optional()?;
        Ok(example)
    }

    /// Delete one example. Returns false when the id is unknown.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM embeddings WHERE example_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM examples WHERE id = ?1", params![id])?;

        let remaining: i64 = tx.query_row("SELECT COUNT(*) FROM examples", [], |row| row.get(0))?;
        if remaining == 0 {
            tx.execute("DELETE FROM store_meta WHERE key = ?1", params![META_DIMENSION])?;
        }
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Embedding dimension of the current contents, if any.
    pub fn dimension(&self) -> Result<Option<usize>> {
        let conn = self.lock()?;
        read_dimension(&conn)
    }
}

fn count_rows(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM examples", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn read_dimension(conn: &Connection) -> Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = ?1",
            params![META_DIMENSION],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    value
        .map(|v| {
            v.parse::<usize>()
                .map_err(|_| RagError::store(format!("corrupt dimension metadata: {}", v)))
        })
        .transpose()
}

fn row_to_example(row: &Row<'_>) -> rusqlite::Result<Example> {
    let blob: Vec<u8> = row.get(6)?;
    Ok(Example {
        id: row.get(0)?,
        question: row.get(1)?,
        answer: row.get(2)?,
        score: row.get(3)?,
        category: row.get(4)?,
        created_at: row.get(5)?,
        embedding: blob_to_embedding(&blob),
    })
}

/// Convert f32 embedding to BLOB
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert BLOB to f32 embedding; a trailing partial value is ignored.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::example::NewExample;

    fn draft(question: &str, answer: &str) -> ExampleDraft {
        NewExample::new(question, answer, 90, Some("teamwork".to_string()))
            .validate()
            .unwrap()
    }

    #[test]
    fn test_blob_conversion() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        let blob = embedding_to_blob(&embedding);
        assert_eq!(blob.len(), 16);
        assert_eq!(blob_to_embedding(&blob), embedding);
    }

    #[test]
    fn test_add_get_count() -> Result<()> {
        let store = ExampleStore::open_in_memory()?;
        assert_eq!(store.count()?, 0);
        assert_eq!(store.dimension()?, None);

        let id = store.add(&draft("q1", "a1"), &[1.0, 0.0, 0.0])?;
        assert_eq!(store.count()?, 1);
        assert_eq!(store.dimension()?, Some(3));

        let example = store.get(&id)?.expect("stored example");
        assert_eq!(example.answer, "a1");
        assert_eq!(example.category, "teamwork");
        assert_eq!(example.embedding, vec![1.0, 0.0, 0.0]);
        assert!(store.get("example_missing")?.is_none());
        Ok(())
    }

    #[test]
    fn test_re_add_overwrites() -> Result<()> {
        let store = ExampleStore::open_in_memory()?;
        let first = store.add(&draft("q", "a"), &[1.0, 0.0])?;

        let mut updated = draft("q", "a");
        updated.score = 40;
        updated.category = "leadership".to_string();
        let second = store.add(&updated, &[0.0, 1.0])?;

        assert_eq!(first, second);
        assert_eq!(store.count()?, 1);
        let example = store.get(&first)?.unwrap();
        assert_eq!(example.score, 40);
        assert_eq!(example.category, "leadership");
        assert_eq!(example.embedding, vec![0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_query_ranking_and_clamp() -> Result<()> {
        let store = ExampleStore::open_in_memory()?;
        assert!(store.query(&[1.0, 0.0], 3)?.is_empty());

        store.add(&draft("east", "a"), &[1.0, 0.0])?;
        store.add(&draft("north", "b"), &[0.0, 1.0])?;
        store.add(&draft("north-east", "c"), &[1.0, 1.0])?;

        let results = store.query(&[1.0, 0.1], 10)?;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.question, "east");
        assert_eq!(results[1].0.question, "north-east");
        assert!(results.windows(2).all(|w| w[0].1 >= w[1].1));

        // k = 0 is raised to 1
        assert_eq!(store.query(&[1.0, 0.0], 0)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_ties_break_by_id() -> Result<()> {
        let store = ExampleStore::open_in_memory()?;
        let ids: Vec<String> = ["x", "y", "z"]
            .iter()
            .map(|q| store.add(&draft(q, "same"), &[0.5, 0.5]))
            .collect::<Result<_>>()?;

        let results = store.query(&[0.5, 0.5], 3)?;
        let mut expected = ids.clone();
        expected.sort();
        let got: Vec<String> = results.into_iter().map(|(e, _)| e.id).collect();
        assert_eq!(got, expected);
        Ok(())
    }

    #[test]
    fn test_dimension_mismatch() -> Result<()> {
        let store = ExampleStore::open_in_memory()?;
        store.add(&draft("q", "a"), &[1.0, 0.0, 0.0])?;

        let err = store.add(&draft("q2", "a2"), &[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(store.count()?, 1);

        assert!(store.query(&[1.0], 1).is_err());
        Ok(())
    }

    #[test]
    fn test_clear_and_remove() -> Result<()> {
        let store = ExampleStore::open_in_memory()?;
        let id = store.add(&draft("q", "a"), &[1.0, 0.0])?;
        store.add(&draft("q2", "a2"), &[0.0, 1.0])?;

        assert!(store.remove(&id)?);
        assert!(!store.remove(&id)?);
        assert_eq!(store.count()?, 1);

        store.clear()?;
        assert_eq!(store.count()?, 0);
        assert_eq!(store.dimension()?, None);
        store.clear()?;

        // a fresh dimension is accepted after clearing
        store.add(&draft("q3", "a3"), &[1.0, 2.0, 3.0])?;
        assert_eq!(store.dimension()?, Some(3));
        Ok(())
    }

    #[test]
    fn test_persists_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir().map_err(|e| RagError::store(e.to_string()))?;
        let db_path = dir.path().join("examples.db");

        let id = {
            let store = ExampleStore::open(&db_path)?;
            store.add(&draft("q", "a"), &[0.25, 0.75])?
        };

        let reopened = ExampleStore::open(&db_path)?;
        assert_eq!(reopened.count()?, 1);
        assert_eq!(reopened.get(&id)?.unwrap().embedding, vec![0.25, 0.75]);
        Ok(())
    }
}

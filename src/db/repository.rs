use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tokio::sync::OnceCell;
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{Bookmark, Devotional, NewBookmark, Program};

use super::schema::SCHEMA;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// On-device cache for devotionals, bookmarks and programs.
///
/// Cloning is cheap and every clone shares the same connection and
/// initialization state. A store built with [`LocalStore::disabled`] has no
/// connection at all: reads come back empty and writes are dropped.
#[derive(Clone)]
pub struct LocalStore {
    conn: Option<Connection>,
    initialized: Arc<OnceCell<()>>,
}

impl LocalStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_connection(conn).await
    }

    #[allow(dead_code)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_connection(conn).await
    }

    pub fn disabled() -> Self {
        Self {
            conn: None,
            initialized: Arc::new(OnceCell::new()),
        }
    }

    async fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Some(conn),
            initialized: Arc::new(OnceCell::new()),
        };
        store.initialize().await?;
        Ok(store)
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    /// Create the schema if needed. Runs at most once per store; concurrent
    /// callers wait for the first one to finish.
    pub async fn initialize(&self) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };

        self.initialized
            .get_or_try_init(|| async {
                conn.call(|conn| {
                    conn.execute_batch(SCHEMA)?;
                    Ok(())
                })
                .await
                .map_err(|e| storage_error("initializing database", e))?;
                tracing::info!("Database initialized");
                Ok::<(), AppError>(())
            })
            .await?;
        Ok(())
    }

    // Devotional operations

    pub async fn upsert_devotional(&self, devotional: &Devotional) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let devotional = devotional.clone();
        conn.call(move |conn| {
            conn.execute(
                r#"INSERT INTO devotionals (id, program, date, topic, content, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                   ON CONFLICT(id) DO UPDATE SET
                       program = excluded.program,
                       date = excluded.date,
                       topic = excluded.topic,
                       content = excluded.content,
                       created_at = excluded.created_at"#,
                params![
                    devotional.id,
                    devotional.program,
                    devotional.date,
                    devotional.topic,
                    devotional.content,
                    devotional.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| storage_error("saving devotional", e))
    }

    pub async fn get_devotional(&self, id: i64) -> Result<Option<Devotional>> {
        let Some(conn) = &self.conn else {
            return Ok(None);
        };
        conn.call(move |conn| {
            let devotional = conn
                .query_row(
                    "SELECT id, program, date, topic, content, created_at FROM devotionals WHERE id = ?1",
                    params![id],
                    devotional_from_row,
                )
                .optional()?;
            Ok(devotional)
        })
        .await
        .map_err(|e| storage_error("getting devotional", e))
    }

    /// Devotionals for `program`, newest first. An empty program matches
    /// every program; `month` is `YYYY-MM`.
    pub async fn query_devotionals(
        &self,
        program: &str,
        month: Option<&str>,
    ) -> Result<Vec<Devotional>> {
        if let Some(month) = month {
            validate_month(month)?;
        }
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };

        let program = program.to_string();
        let month = month.map(str::to_string);
        conn.call(move |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT id, program, date, topic, content, created_at
                   FROM devotionals
                   WHERE (?1 = '' OR program = ?1)
                     AND (?2 IS NULL OR strftime('%Y-%m', date) = ?2)
                   ORDER BY date DESC, id DESC"#,
            )?;
            let devotionals = stmt
                .query_map(params![program, month], devotional_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(devotionals)
        })
        .await
        .map_err(|e| storage_error("getting devotionals", e))
    }

    pub async fn query_devotional_by_date(
        &self,
        program: &str,
        date: NaiveDate,
    ) -> Result<Option<Devotional>> {
        let Some(conn) = &self.conn else {
            return Ok(None);
        };
        let program = program.to_string();
        let date = date.format(DATE_FORMAT).to_string();
        conn.call(move |conn| {
            let devotional = conn
                .query_row(
                    r#"SELECT id, program, date, topic, content, created_at
                       FROM devotionals WHERE program = ?1 AND date = ?2
                       ORDER BY id DESC LIMIT 1"#,
                    params![program, date],
                    devotional_from_row,
                )
                .optional()?;
            Ok(devotional)
        })
        .await
        .map_err(|e| storage_error("getting devotional by date", e))
    }

    // Bookmark operations

    pub async fn add_bookmark(&self, bookmark: NewBookmark) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        conn.call(move |conn| {
            conn.execute(
                r#"INSERT INTO bookmarks (devotional_id, program, date, topic, content, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                   ON CONFLICT(devotional_id) DO UPDATE SET
                       program = excluded.program,
                       date = excluded.date,
                       topic = excluded.topic,
                       content = excluded.content,
                       created_at = excluded.created_at"#,
                params![
                    bookmark.devotional_id,
                    bookmark.program,
                    bookmark.date,
                    bookmark.topic,
                    bookmark.content,
                    bookmark.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| storage_error("adding bookmark", e))
    }

    pub async fn remove_bookmark(&self, devotional_id: i64) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        conn.call(move |conn| {
            conn.execute(
                "DELETE FROM bookmarks WHERE devotional_id = ?1",
                params![devotional_id],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| storage_error("removing bookmark", e))
    }

    pub async fn is_bookmarked(&self, devotional_id: i64) -> Result<bool> {
        let Some(conn) = &self.conn else {
            return Ok(false);
        };
        conn.call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM bookmarks WHERE devotional_id = ?1",
                params![devotional_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .await
        .map_err(|e| storage_error("checking bookmark", e))
    }

    /// Flip the bookmark state of `devotional`. Returns the new state.
    pub async fn toggle_bookmark(&self, devotional: &Devotional) -> Result<bool> {
        if self.is_bookmarked(devotional.id).await? {
            self.remove_bookmark(devotional.id).await?;
            Ok(false)
        } else {
            self.add_bookmark(NewBookmark::from_devotional(devotional))
                .await?;
            Ok(self.is_enabled())
        }
    }

    pub async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        conn.call(|conn| {
            let mut stmt = conn.prepare(
                r#"SELECT id, devotional_id, program, date, topic, content, created_at
                   FROM bookmarks ORDER BY date DESC, id DESC"#,
            )?;
            let bookmarks = stmt
                .query_map([], bookmark_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(bookmarks)
        })
        .await
        .map_err(|e| storage_error("getting bookmarks", e))
    }

    // Program operations

    /// Replace the whole program table with `programs` in one transaction.
    pub async fn replace_programs(&self, programs: &[Program]) -> Result<()> {
        let Some(conn) = &self.conn else {
            return Ok(());
        };
        let programs = programs.to_vec();
        conn.call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM programs", [])?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO programs (id, title, created_at) VALUES (?1, ?2, ?3)",
                )?;
                for program in &programs {
                    stmt.execute(params![program.id, program.title, program.created_at])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| storage_error("saving programs", e))
    }

    pub async fn list_programs(&self) -> Result<Vec<Program>> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        conn.call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, created_at FROM programs ORDER BY id")?;
            let programs = stmt
                .query_map([], program_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(programs)
        })
        .await
        .map_err(|e| storage_error("getting programs", e))
    }
}

fn storage_error(operation: &str, err: tokio_rusqlite::Error) -> AppError {
    tracing::error!("Error {}: {}", operation, err);
    AppError::Database(err)
}

fn validate_month(month: &str) -> Result<()> {
    let well_formed = month.len() == 7
        && NaiveDate::parse_from_str(&format!("{month}-01"), DATE_FORMAT).is_ok();
    if well_formed {
        Ok(())
    } else {
        Err(AppError::InvalidMonth(month.to_string()))
    }
}

fn devotional_from_row(row: &Row) -> rusqlite::Result<Devotional> {
    Ok(Devotional {
        id: row.get(0)?,
        program: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        date: row.get(2)?,
        topic: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn bookmark_from_row(row: &Row) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        devotional_id: row.get(1)?,
        program: row.get(2)?,
        date: row.get(3)?,
        topic: row.get(4)?,
        content: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn program_from_row(row: &Row) -> rusqlite::Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
    })
}

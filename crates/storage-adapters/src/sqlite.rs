//! # SQLite store
//!
//! One pool backing every persistence port: review cursors, the audit
//! trail, and forum roles. The schema is bootstrapped on connect so a
//! fresh cache file works out of the box.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use domains::{
    AuditRecord, AuditSink, CursorStore, ForumRole, ModError, PostCursor, Rank, Result,
    RoleStore, ThreadCursor,
};

pub struct SqliteModerationStore {
    pool: SqlitePool,
}

fn store_err(e: sqlx::Error) -> ModError {
    ModError::Storage(e.to_string())
}

impl SqliteModerationStore {
    /// Connects and ensures the schema exists, e.g.
    /// `SqliteModerationStore::connect("sqlite://.cache/moderation.db?mode=rwc")`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await.map_err(store_err)?;
        let store = SqliteModerationStore { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            "CREATE TABLE IF NOT EXISTS review_thread (
                tid           INTEGER PRIMARY KEY,
                fid           INTEGER NOT NULL,
                last_activity INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS review_post (
                pid         INTEGER PRIMARY KEY,
                tid         INTEGER NOT NULL,
                reply_count INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS review_comment (
                pid  INTEGER PRIMARY KEY,
                tid  INTEGER NOT NULL,
                ppid INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS permission (
                user_id     INTEGER NOT NULL,
                forum       TEXT    NOT NULL,
                rank        TEXT    NOT NULL,
                blacklisted INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, forum)
            )",
            "CREATE TABLE IF NOT EXISTS execute_log (
                log_id INTEGER PRIMARY KEY AUTOINCREMENT,
                plugin TEXT NOT NULL,
                actor  TEXT NOT NULL,
                kind   TEXT NOT NULL,
                obj    TEXT NOT NULL,
                note   TEXT NOT NULL,
                at     TEXT NOT NULL
            )",
        ];
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(store_err)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CursorStore for SqliteModerationStore {
    async fn thread_cursor(&self, tid: i64) -> Result<Option<ThreadCursor>> {
        let row = sqlx::query("SELECT tid, fid, last_activity FROM review_thread WHERE tid = ?")
            .bind(tid)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.map(|row| ThreadCursor {
            tid: row.get("tid"),
            fid: row.get("fid"),
            last_activity: row.get("last_activity"),
        }))
    }

    /// Single-statement upsert: atomic under concurrent sweeps.
    async fn upsert_thread_cursor(&self, cursor: &ThreadCursor) -> Result<()> {
        sqlx::query(
            "INSERT INTO review_thread (tid, fid, last_activity) VALUES (?, ?, ?)
             ON CONFLICT(tid) DO UPDATE SET last_activity = excluded.last_activity",
        )
        .bind(cursor.tid)
        .bind(cursor.fid)
        .bind(cursor.last_activity)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn post_cursor(&self, pid: i64) -> Result<Option<PostCursor>> {
        let row = sqlx::query("SELECT pid, tid, reply_count FROM review_post WHERE pid = ?")
            .bind(pid)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.map(|row| PostCursor {
            pid: row.get("pid"),
            tid: row.get("tid"),
            reply_count: row.get::<i64, _>("reply_count") as u32,
        }))
    }

    async fn upsert_post_cursor(&self, cursor: &PostCursor) -> Result<()> {
        sqlx::query(
            "INSERT INTO review_post (pid, tid, reply_count) VALUES (?, ?, ?)
             ON CONFLICT(pid) DO UPDATE SET reply_count = excluded.reply_count",
        )
        .bind(cursor.pid)
        .bind(cursor.tid)
        .bind(cursor.reply_count as i64)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn comment_seen(&self, pid: i64) -> Result<bool> {
        let row = sqlx::query("SELECT pid FROM review_comment WHERE pid = ?")
            .bind(pid)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(row.is_some())
    }

    async fn mark_comment_seen(&self, pid: i64, tid: i64, parent_pid: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO review_comment (pid, tid, ppid) VALUES (?, ?, ?)
             ON CONFLICT(pid) DO NOTHING",
        )
        .bind(pid)
        .bind(tid)
        .bind(parent_pid)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for SqliteModerationStore {
    async fn record(&self, record: &AuditRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO execute_log (plugin, actor, kind, obj, note, at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.plugin)
        .bind(&record.actor)
        .bind(record.kind.as_str())
        .bind(&record.object)
        .bind(&record.note)
        .bind(record.at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for SqliteModerationStore {
    async fn role(&self, user_id: i64, forum: &str) -> Result<Option<ForumRole>> {
        let row = sqlx::query(
            "SELECT rank, blacklisted FROM permission WHERE user_id = ? AND forum = ?",
        )
        .bind(user_id)
        .bind(forum)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(|row| {
            let rank_text: String = row.get("rank");
            let rank = Rank::parse(&rank_text).ok_or_else(|| {
                ModError::Storage(format!("unknown rank value {rank_text:?} in permission row"))
            })?;
            Ok(ForumRole {
                rank,
                blacklisted: row.get::<i64, _>("blacklisted") != 0,
            })
        })
        .transpose()
    }

    async fn upsert_role(&self, user_id: i64, forum: &str, role: ForumRole) -> Result<()> {
        sqlx::query(
            "INSERT INTO permission (user_id, forum, rank, blacklisted) VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, forum) DO UPDATE
             SET rank = excluded.rank, blacklisted = excluded.blacklisted",
        )
        .bind(user_id)
        .bind(forum)
        .bind(role.rank.as_str())
        .bind(role.blacklisted as i64)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

use crate::time::now_unix_seconds;
use anyhow::{Context as _, anyhow};
use quarry_domain::LocalCache;
use rusqlite::{Connection, OptionalExtension as _, params};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

const MIGRATIONS: &[(u32, &str)] = &[(
    1,
    include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/migrations/0001_init.sql"
    )),
)];

const LATEST_SCHEMA_VERSION: u32 = 1;

/// Key/value cache backed by a single SQLite file. All statements run on one worker thread.
#[derive(Clone)]
pub struct SqliteLocalCache {
    tx: mpsc::Sender<DbCommand>,
}

enum DbCommand {
    Get {
        key: String,
        reply: mpsc::Sender<anyhow::Result<Option<String>>>,
    },
    Set {
        key: String,
        value: String,
        reply: mpsc::Sender<anyhow::Result<()>>,
    },
    Remove {
        key: String,
        reply: mpsc::Sender<anyhow::Result<bool>>,
    },
}

impl SqliteLocalCache {
    pub fn new(db_path: PathBuf) -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel::<DbCommand>();

        std::thread::Builder::new()
            .name("quarry-sqlite".to_owned())
            .spawn(move || {
                let mut db = CacheDatabase::open(&db_path);
                if let Err(err) = &db {
                    tracing::error!(path = %db_path.display(), error = %format!("{err:#}"), "failed to open local cache");
                }
                while let Ok(cmd) = rx.recv() {
                    match (&mut db, cmd) {
                        (Ok(db), DbCommand::Get { key, reply }) => {
                            let _ = reply.send(db.get(&key));
                        }
                        (Ok(db), DbCommand::Set { key, value, reply }) => {
                            let _ = reply.send(db.set(&key, &value));
                        }
                        (Ok(db), DbCommand::Remove { key, reply }) => {
                            let _ = reply.send(db.remove(&key));
                        }
                        (Err(err), cmd) => respond_db_open_error(err, cmd),
                    }
                }
            })
            .context("failed to spawn sqlite worker thread")?;

        Ok(Self { tx })
    }

    pub fn get(&self, key: impl Into<String>) -> anyhow::Result<Option<String>> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Get {
                key: key.into(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> anyhow::Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Set {
                key: key.into(),
                value: value.into(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }

    /// Returns whether a value was stored under `key`.
    pub fn remove(&self, key: impl Into<String>) -> anyhow::Result<bool> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(DbCommand::Remove {
                key: key.into(),
                reply: reply_tx,
            })
            .context("sqlite worker is not running")?;
        reply_rx.recv().context("sqlite worker terminated")?
    }
}

impl LocalCache for SqliteLocalCache {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        self.get(key).map_err(|err| format!("{err:#}"))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        self.set(key, value).map_err(|err| format!("{err:#}"))
    }
}

fn respond_db_open_error(err: &anyhow::Error, cmd: DbCommand) {
    let message = format!("{err:#}");
    match cmd {
        DbCommand::Get { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::Set { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
        DbCommand::Remove { reply, .. } => {
            let _ = reply.send(Err(anyhow!(message)));
        }
    }
}

struct CacheDatabase {
    conn: Connection,
}

impl CacheDatabase {
    fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let mut conn = Connection::open(db_path)
            .with_context(|| format!("failed to open sqlite db {}", db_path.display()))?;

        configure_connection(&mut conn).context("failed to configure sqlite connection")?;
        apply_migrations(&mut conn).context("failed to apply sqlite migrations")?;

        Ok(Self { conn })
    }

    fn get(&mut self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_cache WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read cache key {key}"))?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let now = now_unix_seconds();
        self.conn
            .execute(
                "INSERT INTO local_cache (key, value, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .with_context(|| format!("failed to write cache key {key}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM local_cache WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove cache key {key}"))?;
        Ok(removed > 0)
    }
}

fn configure_connection(conn: &mut Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )
    .context("failed to apply sqlite PRAGMAs")?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> anyhow::Result<()> {
    let mut current: u32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
        .context("failed to read user_version")? as u32;

    if current > LATEST_SCHEMA_VERSION {
        return Err(anyhow!(
            "sqlite schema version is newer than this build: db={}, app={}",
            current,
            LATEST_SCHEMA_VERSION
        ));
    }

    if current == LATEST_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to begin migration transaction")?;
    for (version, sql) in MIGRATIONS {
        if *version <= current {
            continue;
        }
        tx.execute_batch(sql)
            .with_context(|| format!("failed to apply migration v{version:04}"))?;
        tx.pragma_update(None, "user_version", *version as i64)
            .context("failed to update user_version")?;
        current = *version;
    }
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

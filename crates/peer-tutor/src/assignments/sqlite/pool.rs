use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use super::super::repository::StoreError;

/// Bounded pool of SQLite connections to a single database file.
///
/// Connections are opened lazily up to `size`. A checked-out connection goes back to the
/// idle list when its [`PooledConnection`] guard drops, whichever way the caller exits.
#[derive(Debug)]
pub struct ConnectionPool {
    path: PathBuf,
    size: usize,
    busy_timeout: Duration,
    state: Mutex<PoolState>,
    available: Condvar,
}

#[derive(Debug, Default)]
struct PoolState {
    idle: Vec<Connection>,
    open: usize,
}

impl ConnectionPool {
    pub fn new(path: impl AsRef<Path>, size: usize, busy_timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            size: size.max(1),
            busy_timeout,
            state: Mutex::new(PoolState::default()),
            available: Condvar::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Check out a connection, waiting up to the busy timeout when every slot is in use.
    pub fn get(&self) -> Result<PooledConnection<'_>, StoreError> {
        let deadline = Instant::now() + self.busy_timeout;
        let mut state = self.lock()?;

        loop {
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }

            if state.open < self.size {
                state.open += 1;
                drop(state);
                return match self.open_connection() {
                    Ok(conn) => Ok(PooledConnection {
                        pool: self,
                        conn: Some(conn),
                    }),
                    Err(err) => {
                        self.release_slot();
                        Err(err)
                    }
                };
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(StoreError::Unavailable(format!(
                    "all {} connections busy",
                    self.size
                )));
            }
            state = self
                .available
                .wait_timeout(state, remaining)
                .map(|(guard, _)| guard)
                .map_err(|_| StoreError::Unavailable("connection pool lock poisoned".to_string()))?;
        }
    }

    fn open_connection(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path).map_err(|err| {
            StoreError::Unavailable(format!("cannot open {}: {err}", self.path.display()))
        })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("connection pool lock poisoned".to_string()))
    }

    fn release_slot(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.open = state.open.saturating_sub(1);
        self.available.notify_one();
    }

    fn give_back(&self, conn: Connection) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.idle.push(conn);
        self.available.notify_one();
    }
}

/// Connection checked out of a [`ConnectionPool`].
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.give_back(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_return_to_pool_on_drop() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pool = ConnectionPool::new(dir.path().join("pool.db"), 1, Duration::from_millis(50));

        {
            let conn = pool.get().expect("first checkout");
            conn.execute_batch("CREATE TABLE probe (id INTEGER);")
                .expect("create table");
        }

        let conn = pool.get().expect("connection returned after drop");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM probe", [], |row| row.get(0))
            .expect("probe table visible");
        assert_eq!(count, 0);
    }

    #[test]
    fn exhausted_pool_times_out_as_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pool = ConnectionPool::new(dir.path().join("pool.db"), 1, Duration::from_millis(20));

        let _held = pool.get().expect("first checkout");
        match pool.get() {
            Err(StoreError::Unavailable(message)) => assert!(message.contains("busy")),
            Err(other) => panic!("expected unavailable error, got {other:?}"),
            Ok(_) => panic!("expected pool exhaustion"),
        };
    }

    #[test]
    fn unopenable_path_releases_its_slot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let pool = ConnectionPool::new(
            dir.path().join("missing").join("pool.db"),
            1,
            Duration::from_millis(20),
        );

        assert!(matches!(pool.get(), Err(StoreError::Unavailable(_))));
        assert!(matches!(pool.get(), Err(StoreError::Unavailable(message)) if message.contains("cannot open")));
    }
}

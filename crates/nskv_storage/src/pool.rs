//! Bounded pool of read-only SQLite connections.

use crate::error::{StorageError, StorageResult};
use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;
use std::ops::Deref;
use std::time::{Duration, Instant};

/// A fixed set of reader connections shared by concurrent callers.
///
/// Callers block for at most `timeout` waiting for a free connection.
pub(crate) struct ReaderPool {
    idle: Mutex<PoolState>,
    available: Condvar,
    timeout: Duration,
}

struct PoolState {
    connections: Vec<Connection>,
    closed: bool,
}

impl ReaderPool {
    pub(crate) fn new(connections: Vec<Connection>, timeout: Duration) -> Self {
        Self {
            idle: Mutex::new(PoolState {
                connections,
                closed: false,
            }),
            available: Condvar::new(),
            timeout,
        }
    }

    /// Takes a connection, waiting until one is returned or the timeout passes.
    pub(crate) fn acquire(&self) -> StorageResult<PooledConnection<'_>> {
        let deadline = Instant::now() + self.timeout;
        let mut state = self.idle.lock();
        loop {
            if state.closed {
                return Err(StorageError::Closed);
            }
            if let Some(conn) = state.connections.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return Err(StorageError::PoolTimeout {
                    timeout: self.timeout,
                });
            }
        }
    }

    /// Drops every idle connection and refuses further checkouts.
    ///
    /// Connections still checked out are dropped when they are released.
    pub(crate) fn close(&self) {
        let drained = {
            let mut state = self.idle.lock();
            state.closed = true;
            std::mem::take(&mut state.connections)
        };
        self.available.notify_all();
        drop(drained);
    }

    fn release(&self, conn: Connection) {
        let mut state = self.idle.lock();
        if state.closed {
            return;
        }
        state.connections.push(conn);
        drop(state);
        self.available.notify_one();
    }
}

/// A connection checked out of a [`ReaderPool`], returned on drop.
pub(crate) struct PooledConnection<'a> {
    pool: &'a ReaderPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

//! Background sweep of expired entries.
//!
//! Expired rows are already invisible to readers; the sweeper only reclaims
//! the space they occupy.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// A thread that runs a task every `interval` until stopped.
pub(crate) struct Sweeper {
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns the `nskv-sweeper` thread.
    pub(crate) fn spawn<F>(interval: Duration, task: F) -> io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });
        let thread_signal = Arc::clone(&signal);
        let handle = std::thread::Builder::new()
            .name("nskv-sweeper".to_owned())
            .spawn(move || sweep_loop(&thread_signal, interval, &task))?;

        debug!(?interval, "sweeper started");
        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Signals the thread and waits for it to exit.
    ///
    /// A sweep already in progress is allowed to finish.
    pub(crate) fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        {
            let mut stopped = self.signal.stopped.lock();
            *stopped = true;
            self.signal.wake.notify_all();
        }
        let _ = handle.join();
        debug!("sweeper stopped");
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sweep_loop(signal: &Signal, interval: Duration, task: &dyn Fn()) {
    let mut stopped = signal.stopped.lock();
    while !*stopped {
        let result = signal.wake.wait_for(&mut stopped, interval);
        if *stopped {
            break;
        }
        if result.timed_out() {
            MutexGuard::unlocked(&mut stopped, task);
        }
    }
}

//! Lazily initialised, process-wide heavy resources.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Default)]
struct InitState {
    attempts: usize,
    last_failure: Option<Instant>,
}

/// Holder for a value that is expensive to build and may fail to build.
///
/// The initialiser runs at most once at a time; concurrent first callers
/// wait on the mutex and then observe the stored result. Once a value is
/// published, reads only touch the atomic flag. A failed load is remembered
/// for `failure_window`, during which callers get `None` without a retry.
pub struct LazyResource<T> {
    name: &'static str,
    initialized: AtomicBool,
    value: OnceLock<Arc<T>>,
    state: Mutex<InitState>,
    failure_window: Duration,
}

impl<T> LazyResource<T> {
    pub fn new(name: &'static str, failure_window: Duration) -> Self {
        Self {
            name,
            initialized: AtomicBool::new(false),
            value: OnceLock::new(),
            state: Mutex::new(InitState::default()),
            failure_window,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// The value, if it has already been loaded.
    pub fn get(&self) -> Option<Arc<T>> {
        if self.is_initialized() {
            self.value.get().cloned()
        } else {
            None
        }
    }

    /// Number of times the initialiser has been invoked.
    pub fn attempts(&self) -> usize {
        self.lock_state().attempts
    }

    /// Return the value, running `init` if nothing is loaded yet and no
    /// failure was recorded within the failure window.
    pub fn get_or_try_init<F, E>(&self, init: F) -> Option<Arc<T>>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        if let Some(value) = self.get() {
            return Some(value);
        }

        let mut state = self.lock_state();
        if let Some(value) = self.get() {
            return Some(value);
        }
        if let Some(failed_at) = state.last_failure
            && failed_at.elapsed() < self.failure_window
        {
            return None;
        }

        state.attempts += 1;
        info!(resource = self.name, attempt = state.attempts, "Loading resource");
        match init() {
            Ok(value) => {
                let value = Arc::new(value);
                let stored = Arc::clone(self.value.get_or_init(|| value));
                self.initialized.store(true, Ordering::Release);
                state.last_failure = None;
                info!(resource = self.name, "Resource loaded");
                Some(stored)
            }
            Err(e) => {
                error!(resource = self.name, "Resource load failed: {e}");
                state.last_failure = Some(Instant::now());
                None
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, InitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> fmt::Debug for LazyResource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyResource")
            .field("name", &self.name)
            .field("initialized", &self.is_initialized())
            .field("failure_window", &self.failure_window)
            .finish_non_exhaustive()
    }
}

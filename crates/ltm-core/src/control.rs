//! Cooperative stop tokens for running transfers.
//!
//! When the dispatcher starts a worker it registers the job key and hands the
//! returned token to the transfer. `stop` sets the token; the transfer
//! observes it at its next chunk checkpoint and returns early.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Flag shared between the job registry and one running transfer.
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn same(&self, other: &StopToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Shared registry of job key -> stop token.
#[derive(Debug, Default)]
pub struct JobControl {
    jobs: RwLock<HashMap<String, StopToken>>,
}

impl JobControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a starting job; returns the token to pass to its transfer.
    /// A previous token under the same key is replaced.
    pub fn register(&self, key: &str) -> StopToken {
        let token = StopToken::new();
        self.jobs
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), token.clone());
        token
    }

    /// Unregister a finished job. Only removes the entry if it still holds
    /// `token`, so a worker retiring late cannot drop its successor's token.
    pub fn unregister(&self, key: &str, token: &StopToken) {
        let mut jobs = self.jobs.write().unwrap_or_else(|p| p.into_inner());
        if jobs.get(key).is_some_and(|t| t.same(token)) {
            jobs.remove(key);
        }
    }

    /// Request a stop. Returns false when no job is registered under `key`.
    pub fn request_stop(&self, key: &str) -> bool {
        match self.jobs.read().unwrap_or_else(|p| p.into_inner()).get(key) {
            Some(token) => {
                token.request();
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.jobs
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(key)
    }
}

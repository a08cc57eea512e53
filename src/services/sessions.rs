// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live query sessions, one per connected map client.

use crate::services::engine::QueryEngine;
use crate::services::session::QuerySessionController;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Shared handle to one session's controller.
pub type SessionHandle = Arc<Mutex<QuerySessionController>>;

/// Errors from the session registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Session limit reached ({0})")]
    Full(usize),
}

struct SessionSlot {
    handle: SessionHandle,
    last_touched: Instant,
}

/// Concurrent map of session id to controller.
///
/// Sessions untouched for longer than the idle timeout are reclaimed when
/// a new session is created.
pub struct SessionRegistry {
    sessions: DashMap<u64, SessionSlot>,
    next_id: AtomicU64,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
            max_sessions,
            idle_timeout,
        }
    }

    /// Create a session and publish the full-dataset result into it.
    pub async fn create(&self, engine: &QueryEngine) -> Result<(u64, SessionHandle), RegistryError> {
        self.sweep_idle();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle: SessionHandle = Arc::new(Mutex::new(QuerySessionController::new()));
        self.sessions.insert(
            id,
            SessionSlot {
                handle: Arc::clone(&handle),
                last_touched: Instant::now(),
            },
        );

        // Insert first so concurrent creates can never exceed the cap
        if self.sessions.len() > self.max_sessions {
            self.sessions.remove(&id);
            tracing::warn!(max = self.max_sessions, "Refusing new session");
            return Err(RegistryError::Full(self.max_sessions));
        }

        let ticket = handle.lock().await.clear();
        // A fresh session cannot have been superseded unless the client raced us.
        if let Err(stale) = engine.dispatch(&handle, ticket).await {
            tracing::debug!(session_id = id, %stale, "Initial result superseded");
        }

        tracing::info!(session_id = id, live = self.sessions.len(), "Session created");
        Ok((id, handle))
    }

    /// Look up a session and mark it as recently used.
    pub fn get(&self, id: u64) -> Option<SessionHandle> {
        self.sessions.get_mut(&id).map(|mut slot| {
            slot.last_touched = Instant::now();
            Arc::clone(&slot.handle)
        })
    }

    pub fn remove(&self, id: u64) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            tracing::info!(session_id = id, "Session closed");
        }
        removed
    }

    /// Drop sessions idle past the timeout. Sessions with a request in
    /// progress are kept. Returns the number removed.
    pub fn sweep_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| {
            slot.last_touched.elapsed() < self.idle_timeout || Arc::strong_count(&slot.handle) > 1
        });
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            tracing::info!(removed, live = self.sessions.len(), "Expired idle sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

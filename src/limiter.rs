//! Fixed-window admission gate for contact submissions.
//!
//! Tracks per-client request counts in fixed windows (5 requests per
//! 15 minutes default). The window is fixed, not sliding: a client can burst
//! up to twice the limit across a window boundary, an accepted approximation.
//!
//! State lives behind the [`AdmissionStore`] trait so the in-memory map can
//! be swapped for a shared external store without touching gate logic.

use crate::config::RateLimitConfig;
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Per-client window state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindow {
    /// Requests counted in the current window
    pub count: u32,
    /// Epoch milliseconds at which the window resets
    pub reset_at: i64,
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionDecision {
    /// Whether the request may proceed
    pub accepted: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Epoch milliseconds at which the window resets
    pub reset_at: i64,
}

/// Storage backend for per-client window state.
///
/// Implementations only need point reads and writes; the gate serializes
/// its own read-modify-write sequences.
pub trait AdmissionStore: Send + Sync {
    fn get(&self, client_id: &str) -> Option<ClientWindow>;
    fn set(&self, client_id: &str, window: ClientWindow);
    /// Remove every window whose `reset_at` has passed.
    fn sweep(&self, now: i64);
}

/// In-memory window store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, ClientWindow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AdmissionStore for MemoryStore {
    fn get(&self, client_id: &str) -> Option<ClientWindow> {
        self.entries.lock().unwrap().get(client_id).copied()
    }

    fn set(&self, client_id: &str, window: ClientWindow) {
        self.entries
            .lock()
            .unwrap()
            .insert(client_id.to_string(), window);
    }

    fn sweep(&self, now: i64) {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|_, window| now <= window.reset_at);
        let removed = before - entries.len();
        if removed > 0 {
            trace!(removed, "Swept expired rate limit windows");
        }
    }
}

/// Fixed-window rate limiter over an injected store.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn AdmissionStore>,
    // The store exposes get/set separately, so each read-modify-write is
    // serialized here to keep per-client counting atomic across tasks.
    update_lock: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    /// Create a rate limiter backed by a fresh in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a rate limiter over an externally owned store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn AdmissionStore>) -> Self {
        Self {
            config,
            store,
            update_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Check whether a client may submit. Never fails: an unknown client is
    /// simply a first request.
    pub async fn check(&self, client_id: &str) -> AdmissionDecision {
        let now = Utc::now().timestamp_millis();

        // Opportunistic cleanup on a small fraction of calls; expired
        // entries may outlive their window until a sweep lands on them.
        if rand::thread_rng().gen::<f64>() < self.config.sweep_probability {
            self.store.sweep(now);
        }

        let _guard = self.update_lock.lock().await;

        let window_ms = self.config.window_duration().as_millis() as i64;
        match self.store.get(client_id) {
            Some(window) if now <= window.reset_at => {
                if window.count >= self.config.max_requests {
                    debug!(client_id, reset_at = window.reset_at, "Client rate limited");
                    AdmissionDecision {
                        accepted: false,
                        remaining: 0,
                        reset_at: window.reset_at,
                    }
                } else {
                    let window = ClientWindow {
                        count: window.count + 1,
                        reset_at: window.reset_at,
                    };
                    self.store.set(client_id, window);
                    AdmissionDecision {
                        accepted: true,
                        remaining: self.config.max_requests - window.count,
                        reset_at: window.reset_at,
                    }
                }
            }
            // First request, or the previous window has lapsed
            _ => {
                let window = ClientWindow {
                    count: 1,
                    reset_at: now + window_ms,
                };
                self.store.set(client_id, window);
                AdmissionDecision {
                    accepted: true,
                    remaining: self.config.max_requests - 1,
                    reset_at: window.reset_at,
                }
            }
        }
    }
}

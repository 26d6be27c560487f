use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use anyhow::{Error, Result};
use async_trait::async_trait;
use tokio::time::Instant;

/// A set whose members expire on their own after a time-to-live.
#[async_trait]
pub trait ExpiringSet: Send + Sync {
    /// Inserts `key` unless a live entry already exists. Returns `true` when
    /// this call created the entry. Check and insert happen as one step.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, Error>;

    async fn ping(&self) -> Result<(), Error>;

    fn backend(&self) -> &'static str;
}

/// Process-local store used when no Redis URL is configured.
#[derive(Default)]
pub struct InMemoryExpiringSet {
    entries: Mutex<HashMap<String, Instant>>,
}

impl InMemoryExpiringSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ExpiringSet for InMemoryExpiringSet {
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, Error> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if matches!(entries.get(key), Some(expires_at) if *expires_at > now) {
            return Ok(false);
        }

        entries.retain(|_, expires_at| *expires_at > now);
        entries.insert(key.to_string(), now + ttl);

        Ok(true)
    }

    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

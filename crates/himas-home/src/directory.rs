//! Read-through cache of the Home Assistant entity list.

use crate::client::HomeApi;
use crate::entity::EntitySnapshot;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Default staleness window for the entity list.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Cached {
    snapshot: Arc<EntitySnapshot>,
    fetched_at: Instant,
}

/// Owns the entity cache and decides when to refresh it.
///
/// Readers get an `Arc` to an immutable snapshot. A refresh replaces the
/// whole snapshot; a failed refresh leaves the previous one in place and
/// hands the caller an empty snapshot.
pub struct EntityDirectory {
    api: Arc<dyn HomeApi>,
    ttl: Duration,
    allowed: Vec<String>,
    cache: Mutex<Option<Cached>>,
}

impl EntityDirectory {
    pub fn new(api: Arc<dyn HomeApi>) -> Self {
        Self {
            api,
            ttl: DEFAULT_TTL,
            allowed: Vec::new(),
            cache: Mutex::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Only expose these entity ids. Empty = expose everything.
    pub fn with_allowlist(mut self, allowed: Vec<String>) -> Self {
        self.allowed = allowed;
        self
    }

    /// Current entities, refreshing when stale, empty, or `force_refresh`.
    pub async fn entities(&self, force_refresh: bool) -> Arc<EntitySnapshot> {
        // Held across the fetch so concurrent callers share one refresh.
        let mut cache = self.cache.lock().await;

        if !force_refresh {
            if let Some(c) = cache.as_ref() {
                if !c.snapshot.is_empty() && c.fetched_at.elapsed() < self.ttl {
                    return c.snapshot.clone();
                }
            }
        }

        match self.api.fetch_states().await {
            Ok(entities) => {
                let snapshot =
                    Arc::new(EntitySnapshot::new(entities).retain_allowed(&self.allowed));
                info!("entity directory refreshed: {} entities", snapshot.len());
                *cache = Some(Cached {
                    snapshot: snapshot.clone(),
                    fetched_at: Instant::now(),
                });
                snapshot
            }
            Err(e) => {
                warn!("error fetching HA entities: {e}");
                Arc::new(EntitySnapshot::default())
            }
        }
    }

    /// Drop the cached snapshot so the next read refetches.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}

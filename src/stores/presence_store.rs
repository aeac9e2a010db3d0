use crate::models::presence::PresenceEntry;
use crate::utils::time::{is_expired, Clock};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Clone, Debug)]
struct Presence {
    last_seen: i64,
    user_agent: String,
}

#[derive(Debug)]
pub struct PresenceSnapshot {
    pub count: usize,
    pub entries: Vec<PresenceEntry>,
}

/// In-memory "who is online" tracker
///
/// Every request refreshes its client's entry. Entries idle for longer than
/// the TTL are hidden from snapshots immediately and physically dropped by
/// the periodic sweep.
pub struct PresenceTracker {
    entries: DashMap<String, Presence>,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
}

impl PresenceTracker {
    pub fn new(clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            ttl_ms: ttl_ms as i64,
        }
    }

    /// Record activity for a client, replacing its previous descriptor
    pub fn touch(&self, identity: &str, user_agent: &str) {
        let last_seen = self.clock.now_millis();

        self.entries.insert(
            identity.to_string(),
            Presence {
                last_seen,
                user_agent: user_agent.to_string(),
            },
        );
    }

    /// Drop every entry idle for longer than the TTL, returning how many went
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;

        self.entries.retain(|_, presence| {
            let keep = !is_expired(presence.last_seen, self.ttl_ms, now);
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Live entries at call time, ordered by address
    pub fn snapshot(&self) -> PresenceSnapshot {
        let now = self.clock.now_millis();

        let mut entries: Vec<PresenceEntry> = self
            .entries
            .iter()
            .filter(|entry| !is_expired(entry.value().last_seen, self.ttl_ms, now))
            .map(|entry| PresenceEntry {
                ip: entry.key().clone(),
                last_seen: entry.value().last_seen,
                user_agent: entry.value().user_agent.clone(),
            })
            .collect();

        entries.sort_by(|a, b| a.ip.cmp(&b.ip));

        PresenceSnapshot {
            count: entries.len(),
            entries,
        }
    }

    /// Number of stored entries, including stale ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn a background task that sweeps the tracker on a fixed period
pub fn spawn_sweeper(tracker: Arc<PresenceTracker>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;

            let removed = tracker.sweep();
            if removed > 0 {
                info!(
                    removed_entries = removed,
                    online = tracker.len(),
                    "Presence sweep completed"
                );
            } else {
                debug!("Presence sweep completed, nothing stale");
            }
        }
    })
}

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::expire::{ExpiryIndex, now_millis, ttl_seconds};
use crate::pubsub::{EXPIRED_CHANNEL, PubSubRegistry};
use crate::store::Keyspace;
use crate::types::Value;

/// Running counters, reported in logs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Keys retired because their deadline passed (lazy and sweep).
    pub expired_keys: u64,
    /// Subset of `expired_keys` retired by the periodic sweep.
    pub expired_by_sweep: u64,
    pub commands_processed: u64,
}

/// All server state: values, deadlines and subscriptions.
///
/// Every key access goes through the methods here, which apply the lazy
/// expiry check first. Expired keys leave the keyspace through exactly one
/// path, [`Engine::retire`], whether the lazy check or the sweep found them.
///
/// Time is an explicit field: the server refreshes it before each command so
/// that a whole command (or a whole EXEC) observes a single instant.
pub struct Engine {
    keyspace: Keyspace,
    expiry: ExpiryIndex,
    pubsub: PubSubRegistry,
    now: u64,
    stats: EngineStats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine::with_data(Keyspace::new(), ExpiryIndex::new())
    }

    /// Build an engine around previously persisted data.
    pub fn with_data(keyspace: Keyspace, expiry: ExpiryIndex) -> Self {
        Engine {
            keyspace,
            expiry,
            pubsub: PubSubRegistry::new(),
            now: now_millis(),
            stats: EngineStats::default(),
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn set_clock(&mut self, now: u64) {
        self.now = now;
    }

    pub fn refresh_clock(&mut self) {
        self.now = now_millis();
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub(crate) fn count_command(&mut self) {
        self.stats.commands_processed += 1;
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    pub fn expiry(&self) -> &ExpiryIndex {
        &self.expiry
    }

    pub fn pubsub(&self) -> &PubSubRegistry {
        &self.pubsub
    }

    pub fn pubsub_mut(&mut self) -> &mut PubSubRegistry {
        &mut self.pubsub
    }

    /// Delete an expired key and announce it on the expiry channel.
    /// Returns false, and notifies nobody, if the key was already gone.
    pub fn retire(&mut self, key: &str) -> bool {
        self.expiry.remove(key);
        let Some(value) = self.keyspace.remove(key) else {
            return false;
        };
        self.stats.expired_keys += 1;
        let delivered = self.pubsub.publish(EXPIRED_CHANNEL, key.as_bytes());
        debug!(key, kind = value.type_name(), delivered, "key expired");
        true
    }

    /// Lazy check: retire `key` if its deadline has passed.
    pub fn expire_if_due(&mut self, key: &str) -> bool {
        if self.expiry.is_due(key, self.now) {
            self.retire(key)
        } else {
            false
        }
    }

    /// Retire every key whose deadline has passed. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let mut retired = 0;
        for key in self.expiry.due(self.now) {
            if self.retire(&key) {
                retired += 1;
            }
        }
        self.stats.expired_by_sweep += retired as u64;
        retired
    }

    pub fn get(&mut self, key: &str) -> Option<&Value> {
        self.expire_if_due(key);
        self.keyspace.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.expire_if_due(key);
        self.keyspace.get_mut(key)
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.expire_if_due(key);
        self.keyspace.contains(key)
    }

    /// Get the live value under `key`, creating it with `init` when absent.
    pub fn get_or_insert_with(&mut self, key: &str, init: impl FnOnce() -> Value) -> &mut Value {
        self.expire_if_due(key);
        self.keyspace.get_or_insert_with(key, init)
    }

    /// Install a value, dropping any previous variant and its deadline.
    pub fn set(&mut self, key: &str, value: Value) {
        self.expiry.remove(key);
        self.keyspace.insert(key.to_string(), value);
    }

    /// Explicit delete. Removes the deadline with the value; no notification.
    pub fn delete(&mut self, key: &str) -> bool {
        self.expire_if_due(key);
        self.expiry.remove(key);
        self.keyspace.remove(key).is_some()
    }

    /// Drop a list or set that has no elements left.
    pub fn remove_if_empty(&mut self, key: &str) {
        if self
            .keyspace
            .get(key)
            .is_some_and(Value::is_empty_collection)
        {
            self.delete(key);
        }
    }

    /// Set an absolute deadline (unix millis). False if the key does not exist.
    pub fn set_deadline(&mut self, key: &str, deadline: u64) -> bool {
        if !self.exists(key) {
            return false;
        }
        self.expiry.set(key, deadline);
        true
    }

    /// Set a deadline `seconds` from now. False if the key does not exist.
    pub fn expire_in(&mut self, key: &str, seconds: u64) -> bool {
        let deadline = self.now.saturating_add(seconds.saturating_mul(1000));
        self.set_deadline(key, deadline)
    }

    /// Expire `key` on the spot through the normal retirement path.
    pub fn expire_now(&mut self, key: &str) -> bool {
        self.exists(key) && self.retire(key)
    }

    /// `-2` for a missing key, `-1` for a key without deadline, otherwise the
    /// remaining seconds rounded up.
    pub fn ttl(&mut self, key: &str) -> i64 {
        if !self.exists(key) {
            return -2;
        }
        match self.expiry.deadline(key) {
            Some(deadline) => ttl_seconds(deadline, self.now),
            None => -1,
        }
    }

    /// Forget everything a closing connection had registered.
    pub fn disconnect(&mut self, client_id: u64) {
        self.pubsub.unsubscribe_all(client_id);
    }
}

pub type SharedEngine = Arc<Mutex<Engine>>;

pub fn shared(engine: Engine) -> SharedEngine {
    Arc::new(Mutex::new(engine))
}

use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::mpsc;

use crate::resp::RespValue;

/// Channel on which key expirations are announced; the payload is the key.
pub const EXPIRED_CHANNEL: &str = "__keyevent@0__:expired";

pub type PubSubSender = mpsc::UnboundedSender<RespValue>;
pub type PubSubReceiver = mpsc::UnboundedReceiver<RespValue>;

/// Channel subscriptions, keyed both ways so that publishing and
/// per-connection cleanup are each a direct lookup.
#[derive(Default)]
pub struct PubSubRegistry {
    /// channel name -> subscribed client ids
    channels: HashMap<String, HashSet<u64>>,
    /// client id -> channels it is subscribed to
    client_channels: HashMap<u64, BTreeSet<String>>,
    /// client id -> outbound queue of its connection
    senders: HashMap<u64, PubSubSender>,
}

impl PubSubRegistry {
    pub fn new() -> Self {
        PubSubRegistry::default()
    }

    /// Subscribe a client to a channel. Returns its total subscription count.
    pub fn subscribe(&mut self, client_id: u64, channel: &str, sender: &PubSubSender) -> usize {
        self.senders
            .entry(client_id)
            .or_insert_with(|| sender.clone());
        self.channels
            .entry(channel.to_string())
            .or_default()
            .insert(client_id);
        let subscribed = self.client_channels.entry(client_id).or_default();
        subscribed.insert(channel.to_string());
        subscribed.len()
    }

    /// Unsubscribe a client from a channel. Returns its remaining count.
    pub fn unsubscribe(&mut self, client_id: u64, channel: &str) -> usize {
        self.detach(client_id, channel);
        let remaining = match self.client_channels.get_mut(&client_id) {
            Some(subscribed) => {
                subscribed.remove(channel);
                subscribed.len()
            }
            None => 0,
        };
        if remaining == 0 {
            self.client_channels.remove(&client_id);
            self.senders.remove(&client_id);
        }
        remaining
    }

    /// Remove a client from every channel (connection closed). Idempotent.
    pub fn unsubscribe_all(&mut self, client_id: u64) {
        if let Some(subscribed) = self.client_channels.remove(&client_id) {
            for channel in subscribed {
                self.detach(client_id, &channel);
            }
        }
        self.senders.remove(&client_id);
    }

    /// Deliver `message` to every subscriber of `channel` as a
    /// `["message", channel, payload]` push. Returns how many received it.
    pub fn publish(&self, channel: &str, message: &[u8]) -> usize {
        let Some(client_ids) = self.channels.get(channel) else {
            return 0;
        };
        let push = RespValue::array(vec![
            RespValue::bulk_string("message"),
            RespValue::bulk_string(channel),
            RespValue::bulk_string(message),
        ]);
        client_ids
            .iter()
            .filter_map(|id| self.senders.get(id))
            .filter(|sender| sender.send(push.clone()).is_ok())
            .count()
    }

    /// Channels a client is subscribed to, in name order.
    pub fn channels_of(&self, client_id: u64) -> Vec<String> {
        self.client_channels
            .get(&client_id)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, HashSet::len)
    }

    fn detach(&mut self, client_id: u64, channel: &str) {
        if let Some(clients) = self.channels.get_mut(channel) {
            clients.remove(&client_id);
            if clients.is_empty() {
                self.channels.remove(channel);
            }
        }
    }
}

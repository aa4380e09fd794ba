use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Events,
    Hosts,
    Users,
    Participants,
    Tickets,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Events,
        Channel::Hosts,
        Channel::Users,
        Channel::Participants,
        Channel::Tickets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Events => "events",
            Channel::Hosts => "hosts",
            Channel::Users => "users",
            Channel::Participants => "participants",
            Channel::Tickets => "tickets",
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown channel: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub event: String,
    pub data: serde_json::Value,
}

/// Fan-out of JSON notifications to websocket subscribers, one bounded
/// channel per topic. Lagging receivers lose the oldest messages.
#[derive(Clone)]
pub struct Broadcaster {
    senders: HashMap<Channel, broadcast::Sender<BroadcastMessage>>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let senders = Channel::ALL
            .into_iter()
            .map(|channel| (channel, broadcast::channel(capacity).0))
            .collect();
        Self { senders }
    }

    /// Returns how many subscribers received the message. Having none is fine.
    pub fn publish<T: Serialize>(&self, channel: Channel, event: &str, data: &T) -> usize {
        let data = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(channel = channel.as_str(), event, "failed to serialize broadcast: {}", e);
                return 0;
            }
        };

        let message = BroadcastMessage {
            event: event.to_string(),
            data,
        };
        let delivered = self
            .senders
            .get(&channel)
            .and_then(|sender| sender.send(message).ok())
            .unwrap_or(0);

        tracing::debug!(channel = channel.as_str(), event, delivered, "broadcast published");
        delivered
    }

    pub fn subscribe(&self, channel: Channel) -> Option<broadcast::Receiver<BroadcastMessage>> {
        self.senders.get(&channel).map(|sender| sender.subscribe())
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

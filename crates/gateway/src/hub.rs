//! Connection hub: owns one delivery-group per connected identity and is the
//! only component that pushes events to specific users.
//!
//! A delivery-group is a broadcast channel; every open connection of an
//! identity subscribes to it, so multiple simultaneous connections from the
//! same identity all receive pushes. Delivery is fire-and-forget: pushing to
//! an identity with no open connections is silently dropped.
//!
//! Presence transitions and their announcements happen inside the same
//! write-lock section, so observers see online-then-offline for a given
//! identity in the order the transitions occurred.

use std::collections::HashMap;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::presence::PresenceRegistry;
use crate::websocket::events::ServerEvent;

const DELIVERY_GROUP_CAPACITY: usize = 100;

struct DeliveryGroup {
    connections: usize,
    sender: broadcast::Sender<ServerEvent>,
}

pub struct ConnectionHub {
    groups: RwLock<HashMap<String, DeliveryGroup>>,
    presence: PresenceRegistry,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            presence: PresenceRegistry::new(),
        }
    }

    /// Register a new connection for an identity.
    ///
    /// Returns the connection's event receiver and whether the identity just
    /// came online (first open connection). Coming online is announced to
    /// every connected identity, the new connection included.
    pub async fn connect(&self, identity: &str) -> (broadcast::Receiver<ServerEvent>, bool) {
        let mut groups = self.groups.write().await;
        let group = groups
            .entry(identity.to_string())
            .or_insert_with(|| DeliveryGroup {
                connections: 0,
                sender: broadcast::channel(DELIVERY_GROUP_CAPACITY).0,
            });

        group.connections += 1;
        let receiver = group.sender.subscribe();
        let came_online = group.connections == 1;

        if came_online {
            self.presence.add(identity);
            let event = ServerEvent::UserOnline {
                user_id: identity.to_string(),
            };
            for group in groups.values() {
                let _ = group.sender.send(event.clone());
            }
        }

        (receiver, came_online)
    }

    /// Deregister one connection for an identity.
    ///
    /// When the last open connection closes, the identity leaves the presence
    /// registry and going offline is announced to everyone still connected.
    /// Disconnecting an unknown identity is a no-op. Returns whether the
    /// identity went offline.
    pub async fn disconnect(&self, identity: &str) -> bool {
        let mut groups = self.groups.write().await;
        let Some(group) = groups.get_mut(identity) else {
            return false;
        };

        group.connections -= 1;
        if group.connections > 0 {
            return false;
        }

        groups.remove(identity);
        self.presence.remove(identity);

        let event = ServerEvent::UserOffline {
            user_id: identity.to_string(),
        };
        for group in groups.values() {
            let _ = group.sender.send(event.clone());
        }

        true
    }

    /// Best-effort push to every open connection of the target identity.
    pub async fn deliver(&self, target: &str, event: ServerEvent) {
        let groups = self.groups.read().await;
        match groups.get(target) {
            Some(group) => {
                let _ = group.sender.send(event);
            }
            None => {
                debug!(target, "dropping event for identity with no open connections");
            }
        }
    }

    /// Best-effort push to every currently connected identity.
    pub async fn broadcast_all(&self, event: ServerEvent) {
        let groups = self.groups.read().await;
        for group in groups.values() {
            let _ = group.sender.send(event.clone());
        }
    }

    pub fn online_users(&self) -> Vec<String> {
        self.presence.snapshot()
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}

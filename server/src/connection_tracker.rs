use std::collections::HashMap;
use std::sync::Arc;

use common::ClientId;

use crate::connection::Connection;

/// Every live connection, keyed by client id. Owned by the coordinator and
/// only touched under its lock.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    connections: HashMap<ClientId, Arc<Connection>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, connection: Arc<Connection>) -> bool {
        let id = connection.id().clone();
        if self.connections.contains_key(&id) {
            return false;
        }
        self.connections.insert(id, connection);
        true
    }

    pub fn remove(&mut self, client_id: &ClientId) -> Option<Arc<Connection>> {
        self.connections.remove(client_id)
    }

    pub fn get(&self, client_id: &ClientId) -> Option<&Arc<Connection>> {
        self.connections.get(client_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Sorted ids, so every client sees the roster in the same order.
    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.connections.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.connections.values().cloned().collect()
    }
}

// crates/core/src/context.rs
//! The connection store: named upstream connections and the active
//! selection.
//!
//! Constructed once at application start and shared by reference; there is
//! no hidden global. "No connection selected" surfaces here as a
//! configuration error before any query is issued.

use std::sync::RwLock;

use houseview_types::{ConnectionConfig, QuerySettings};

use crate::error::PanelError;

#[derive(Debug, Default)]
pub struct ConnectionStore {
    connections: RwLock<Vec<ConnectionConfig>>,
    active: RwLock<Option<String>>,
}

impl ConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a single connection, pre-selected.
    pub fn with_connection(config: ConnectionConfig) -> Self {
        let store = Self::new();
        let name = config.name.clone();
        store.upsert(config);
        store
            .select(&name)
            .expect("connection just inserted is selectable");
        store
    }

    /// Insert or replace a connection by name.
    pub fn upsert(&self, config: ConnectionConfig) {
        let mut connections = self.connections.write().expect("connection store lock");
        match connections.iter_mut().find(|c| c.name == config.name) {
            Some(existing) => *existing = config,
            None => connections.push(config),
        }
    }

    pub fn list(&self) -> Vec<ConnectionConfig> {
        self.connections
            .read()
            .expect("connection store lock")
            .clone()
    }

    /// Make `name` the active connection.
    pub fn select(&self, name: &str) -> Result<(), PanelError> {
        let known = self
            .connections
            .read()
            .expect("connection store lock")
            .iter()
            .any(|c| c.name == name);
        if !known {
            return Err(PanelError::Config(format!("Unknown connection {name:?}")));
        }
        *self.active.write().expect("connection store lock") = Some(name.to_string());
        Ok(())
    }

    pub fn active_name(&self) -> Option<String> {
        self.active.read().expect("connection store lock").clone()
    }

    /// The active connection, or the "No connection selected" config error.
    pub fn active(&self) -> Result<ConnectionConfig, PanelError> {
        let name = self
            .active
            .read()
            .expect("connection store lock")
            .clone()
            .ok_or_else(PanelError::no_connection)?;
        self.connections
            .read()
            .expect("connection store lock")
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(PanelError::no_connection)
    }

    /// The active connection's defaults overlaid with `overrides`.
    pub fn settings_for(&self, overrides: &QuerySettings) -> Result<QuerySettings, PanelError> {
        Ok(self.active()?.default_settings.merged_with(overrides))
    }
}

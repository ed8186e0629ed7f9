//! Session-scoped registry of discovered entities and services.

use std::collections::{BTreeMap, HashMap};

use super::types::{EntityInfo, ServiceInfo};

/// Forward and inverse lookups for everything the device enumerated.
///
/// Rebuilt from scratch on every connection; nothing survives a reconnect.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    by_key: HashMap<u32, EntityInfo>,
    key_by_id: HashMap<String, u32>,
    order: Vec<u32>,
    services: Vec<ServiceInfo>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entities and services.
    pub fn clear(&mut self) {
        self.by_key.clear();
        self.key_by_id.clear();
        self.order.clear();
        self.services.clear();
    }

    /// Record a discovered entity. An entity re-announced under the same
    /// wire key replaces the previous record.
    pub fn register(&mut self, entity: EntityInfo) {
        let id = entity.entity_id();
        if self.by_key.insert(entity.key, entity.clone()).is_none() {
            self.order.push(entity.key);
        }
        self.key_by_id.insert(id, entity.key);
    }

    /// Record a discovered service.
    pub fn register_service(&mut self, service: ServiceInfo) {
        self.services.push(service);
    }

    /// Whether a string id resolves to an entity.
    pub fn has_entity(&self, entity_id: &str) -> bool {
        self.key_by_id.contains_key(entity_id)
    }

    /// Wire key for a string id.
    pub fn key_for_id(&self, entity_id: &str) -> Option<u32> {
        self.key_by_id.get(entity_id).copied()
    }

    /// Entity for a string id.
    pub fn entity_by_id(&self, entity_id: &str) -> Option<&EntityInfo> {
        self.key_for_id(entity_id)
            .and_then(|key| self.by_key.get(&key))
    }

    /// Entity for a wire key.
    pub fn entity_by_key(&self, key: u32) -> Option<&EntityInfo> {
        self.by_key.get(&key)
    }

    /// All entities in discovery order.
    pub fn entities(&self) -> Vec<EntityInfo> {
        self.order
            .iter()
            .filter_map(|key| self.by_key.get(key))
            .cloned()
            .collect()
    }

    /// Available string ids grouped by the prefix before the first `-`.
    pub fn ids_by_kind(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in &self.order {
            if let Some(entity) = self.by_key.get(key) {
                let id = entity.entity_id();
                let prefix = id.split('-').next().unwrap_or_default().to_string();
                groups.entry(prefix).or_default().push(id);
            }
        }
        groups
    }

    /// All discovered services.
    pub fn services(&self) -> &[ServiceInfo] {
        &self.services
    }

    /// Service by name.
    pub fn service_by_name(&self, name: &str) -> Option<&ServiceInfo> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Service by wire key.
    pub fn service_by_key(&self, key: u32) -> Option<&ServiceInfo> {
        self.services.iter().find(|s| s.key == key)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// True when nothing has been discovered.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

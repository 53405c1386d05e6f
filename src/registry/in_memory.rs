//! Concurrent in-process registry.

use super::{
    ExecutorStats, ManagementRegistry, ObjectName, RegistryError, RegistryResult,
};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

static PLATFORM_REGISTRY: OnceLock<Arc<InMemoryRegistry>> = OnceLock::new();

/// The process-wide registry shared by every monitored executor that was not
/// given one explicitly.
pub fn platform_registry() -> Arc<InMemoryRegistry> {
    Arc::clone(PLATFORM_REGISTRY.get_or_init(|| Arc::new(InMemoryRegistry::new())))
}

/// Registry keyed by canonical object name.
///
/// Duplicate detection goes through the map's entry API, so two racing
/// registrations of one address resolve to exactly one winner.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: DashMap<String, Arc<dyn ExecutorStats>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("addresses", &self.addresses())
            .finish()
    }
}

impl ManagementRegistry for InMemoryRegistry {
    fn register(&self, address: &str, stats: Arc<dyn ExecutorStats>) -> RegistryResult<()> {
        let canonical = ObjectName::parse(address)?.canonical();
        match self.entries.entry(canonical) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered {
                address: address.to_string(),
            }),
            Entry::Vacant(vacant) => {
                debug!(address = %vacant.key(), "Registered executor stats");
                vacant.insert(stats);
                Ok(())
            }
        }
    }

    fn unregister(&self, address: &str) -> RegistryResult<()> {
        let canonical = ObjectName::parse(address)?.canonical();
        match self.entries.remove(&canonical) {
            Some(_) => {
                debug!(address = %canonical, "Unregistered executor stats");
                Ok(())
            }
            None => Err(RegistryError::NotFound {
                address: address.to_string(),
            }),
        }
    }

    fn unregister_stats(
        &self,
        address: &str,
        stats: &Arc<dyn ExecutorStats>,
    ) -> RegistryResult<()> {
        let canonical = ObjectName::parse(address)?.canonical();
        match self
            .entries
            .remove_if(&canonical, |_, registered| Arc::ptr_eq(registered, stats))
        {
            Some(_) => {
                debug!(address = %canonical, "Unregistered executor stats");
                Ok(())
            }
            None => Err(RegistryError::NotFound {
                address: address.to_string(),
            }),
        }
    }

    fn lookup(&self, address: &str) -> RegistryResult<Arc<dyn ExecutorStats>> {
        let canonical = ObjectName::parse(address)?.canonical();
        self.entries
            .get(&canonical)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound {
                address: address.to_string(),
            })
    }

    fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> =
            self.entries.iter().map(|entry| entry.key().clone()).collect();
        addresses.sort();
        addresses
    }
}

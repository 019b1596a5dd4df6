//! Aggregates exporters and gathers their metric families.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use prometheus::proto::MetricFamily;

use crate::error::RegistryError;
use crate::exporter::Exporter;

/// Set of exporters gathered together.
///
/// Unlike `prometheus::Registry`, [`Registry::gather`] reports scrape
/// failures to the caller instead of logging them.
#[derive(Default)]
pub struct Registry {
    exporters: Mutex<Vec<Arc<Exporter>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an exporter. Registering the same exporter twice fails.
    pub fn register(&self, exporter: Arc<Exporter>) -> Result<(), RegistryError> {
        let mut exporters = self.exporters.lock().unwrap_or_else(PoisonError::into_inner);
        if exporters.iter().any(|e| Arc::ptr_eq(e, &exporter)) {
            return Err(RegistryError::AlreadyRegistered);
        }
        exporters.push(exporter);
        Ok(())
    }

    /// Removes an exporter. Fails if it is not registered, including
    /// when it was already removed.
    pub fn unregister(&self, exporter: &Exporter) -> Result<(), RegistryError> {
        let mut exporters = self.exporters.lock().unwrap_or_else(PoisonError::into_inner);
        let position = exporters
            .iter()
            .position(|e| std::ptr::eq(Arc::as_ptr(e), exporter))
            .ok_or(RegistryError::NotRegistered)?;
        exporters.remove(position);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.exporters.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scrapes every registered exporter and merges the results.
    ///
    /// Families with the same name are merged into one; the result is
    /// sorted by family name. The first failing exporter aborts the gather.
    pub fn gather(&self) -> Result<Vec<MetricFamily>, RegistryError> {
        let exporters: Vec<Arc<Exporter>> = self
            .exporters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut merged: BTreeMap<String, MetricFamily> = BTreeMap::new();
        for exporter in exporters {
            let families = exporter.scrape().map_err(RegistryError::Gather)?;
            for mut family in families {
                match merged.get_mut(family.get_name()) {
                    Some(existing) => {
                        if existing.get_field_type() != family.get_field_type() {
                            return Err(RegistryError::Inconsistent(family.get_name().to_string()));
                        }
                        for metric in family.take_metric().into_iter() {
                            existing.mut_metric().push(metric);
                        }
                    }
                    None => {
                        merged.insert(family.get_name().to_string(), family);
                    }
                }
            }
        }

        Ok(merged.into_values().collect())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("exporters", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::tests::{CannedConnector, server};
    use crate::scraper::Scraper;
    use crate::scrapers::ScrapeGlobalStatus;

    fn exporter(session: Option<crate::scrapers::testing::CannedSession>) -> Arc<Exporter> {
        let scrapers: Vec<Arc<dyn Scraper>> = vec![Arc::new(ScrapeGlobalStatus)];
        Arc::new(
            Exporter::new("host=localhost", scrapers, Arc::new(CannedConnector { session })).unwrap(),
        )
    }

    #[test]
    fn register_twice_fails() {
        let registry = Registry::new();
        let e = exporter(Some(server("16.1")));
        registry.register(e.clone()).unwrap();
        assert!(matches!(registry.register(e), Err(RegistryError::AlreadyRegistered)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_is_not_idempotent() {
        let registry = Registry::new();
        let e = exporter(Some(server("16.1")));
        registry.register(e.clone()).unwrap();
        registry.unregister(&e).unwrap();
        assert!(matches!(registry.unregister(&e), Err(RegistryError::NotRegistered)));
        assert!(registry.is_empty());
    }

    #[test]
    fn gather_merges_and_sorts() {
        let registry = Registry::new();
        registry.register(exporter(Some(server("16.1")))).unwrap();
        registry.register(exporter(Some(server("15.4")))).unwrap();

        let families = registry.gather().unwrap();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let up = families.iter().find(|f| f.get_name() == "pg_up").unwrap();
        assert_eq!(up.get_metric().len(), 2);
    }

    #[test]
    fn gather_fails_when_any_exporter_fails() {
        let registry = Registry::new();
        registry.register(exporter(Some(server("16.1")))).unwrap();
        registry.register(exporter(None)).unwrap();
        assert!(matches!(registry.gather(), Err(RegistryError::Gather(_))));
    }

    #[test]
    fn empty_registry_gathers_nothing() {
        assert!(Registry::new().gather().unwrap().is_empty());
    }
}

//! Error types for scraping and registry operations.

/// Error type for a single scrape.
#[derive(Debug)]
pub enum ScrapeError {
    /// Connection string could not be parsed.
    InvalidDsn(String),
    /// Connection failed.
    Connection(String),
    /// Query execution failed.
    Query(String),
    /// Server version string could not be interpreted.
    Version(String),
    /// Metric family could not be built.
    Metric(String),
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::InvalidDsn(msg) => write!(f, "invalid dsn: {}", msg),
            ScrapeError::Connection(msg) => write!(f, "connection: {}", msg),
            ScrapeError::Query(msg) => write!(f, "query error: {}", msg),
            ScrapeError::Version(raw) => write!(f, "unrecognized server version {:?}", raw),
            ScrapeError::Metric(msg) => write!(f, "metric error: {}", msg),
        }
    }
}

impl std::error::Error for ScrapeError {}

impl From<prometheus::Error> for ScrapeError {
    fn from(e: prometheus::Error) -> Self {
        ScrapeError::Metric(e.to_string())
    }
}

/// Error type for [`crate::Registry`] operations.
#[derive(Debug)]
pub enum RegistryError {
    /// The exporter is already part of this registry.
    AlreadyRegistered,
    /// The exporter is not part of this registry.
    NotRegistered,
    /// One of the registered exporters failed to scrape.
    Gather(ScrapeError),
    /// Two exporters reported the same family with different types.
    Inconsistent(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::AlreadyRegistered => write!(f, "exporter already registered"),
            RegistryError::NotRegistered => write!(f, "exporter not registered"),
            RegistryError::Gather(e) => write!(f, "gather failed: {}", e),
            RegistryError::Inconsistent(name) => {
                write!(f, "metric family {} reported with conflicting types", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Gather(e) => Some(e),
            _ => None,
        }
    }
}

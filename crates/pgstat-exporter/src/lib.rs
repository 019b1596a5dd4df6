//! pgstat-exporter — Prometheus-style statistics scrapers for PostgreSQL-protocol servers.
//!
//! Provides:
//! - `scrapers` — individual collection routines (`global_status`, `bgwriter`, ...)
//!   with the minimum server version each one expects
//! - `exporter` — runs a set of scrapers against one server per scrape
//! - `registry` — aggregates exporters and gathers their metric families
//! - `session` — connection abstraction (real `postgres` client or test doubles)
//! - `flags` — process-wide tuning flags parsed from the command line
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use pgstat_exporter::{Exporter, PgConnector, Registry, default_scrapers};
//!
//! pgstat_exporter::flags::parse();
//!
//! let scrapers = default_scrapers()
//!     .into_iter()
//!     .filter(|(_, enabled)| *enabled)
//!     .map(|(s, _)| s)
//!     .collect();
//! let exporter = Arc::new(Exporter::new(
//!     "host=localhost user=postgres",
//!     scrapers,
//!     Arc::new(PgConnector),
//! )?);
//!
//! let registry = Registry::new();
//! registry.register(exporter.clone())?;
//! let families = registry.gather()?;
//! ```

pub mod error;
pub mod exporter;
pub mod flags;
pub mod registry;
pub mod scraper;
pub mod scrapers;
pub mod session;
pub mod version;

pub use error::{RegistryError, ScrapeError};
pub use exporter::Exporter;
pub use registry::Registry;
pub use scraper::Scraper;
pub use scrapers::default_scrapers;
pub use session::{Connector, PgConnector, Row, Session};
pub use version::parse_server_version;

/// Re-exported so consumers can name metric family types without
/// depending on a matching `prometheus` version themselves.
pub use prometheus::proto;

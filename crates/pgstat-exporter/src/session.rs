//! Connection abstraction used by scrapers.
//!
//! Scrapers only see [`Session`], so they can run against a real server via
//! [`PgConnector`] or against canned rows in tests.

use postgres::{Client, NoTls, SimpleQueryMessage};

use crate::error::ScrapeError;

/// One result row with text-encoded values, as returned by the simple query protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Option<String>>,
}

impl Row {
    /// Creates a row from column names and their values.
    pub fn new(columns: Vec<String>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    /// Builds a row from `(column, value)` pairs.
    pub fn from_pairs(pairs: &[(&str, Option<&str>)]) -> Self {
        Self {
            columns: pairs.iter().map(|(c, _)| c.to_string()).collect(),
            values: pairs.iter().map(|(_, v)| v.map(str::to_string)).collect(),
        }
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Text value of `column`, `None` for SQL NULL or a missing column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
            .and_then(|v| v.as_deref())
    }

    /// Text value at position `index`.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|v| v.as_deref())
    }

    /// Numeric value of `column`. Booleans (`t`/`f`, `on`/`off`) map to 1/0.
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(parse_numeric)
    }
}

/// Parses a text-encoded numeric or boolean value.
pub(crate) fn parse_numeric(raw: &str) -> Option<f64> {
    match raw {
        "t" | "true" | "on" => Some(1.0),
        "f" | "false" | "off" => Some(0.0),
        other => other.trim().parse().ok(),
    }
}

/// An open connection able to run text queries.
pub trait Session {
    /// Runs a statement that returns no rows.
    fn execute(&mut self, sql: &str) -> Result<(), ScrapeError>;

    /// Runs a query and returns all rows.
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, ScrapeError>;

    /// Human-readable server version (`SHOW server_version`).
    fn server_version(&mut self) -> Result<String, ScrapeError> {
        self.query("SHOW server_version")?
            .first()
            .and_then(|row| row.get_index(0))
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::Version(String::new()))
    }

    /// Numeric server version (`SHOW server_version_num`), if the server reports one.
    fn server_version_num(&mut self) -> Option<i32> {
        self.query("SHOW server_version_num")
            .ok()?
            .first()
            .and_then(|row| row.get_index(0))
            .and_then(|v| v.parse().ok())
    }
}

/// Opens sessions for a connection string.
pub trait Connector: Send + Sync {
    fn connect(&self, dsn: &str) -> Result<Box<dyn Session>, ScrapeError>;
}

/// Connector backed by the synchronous `postgres` client.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

impl Connector for PgConnector {
    fn connect(&self, dsn: &str) -> Result<Box<dyn Session>, ScrapeError> {
        let client = Client::connect(dsn, NoTls)
            .map_err(|e| ScrapeError::Connection(format_postgres_error(&e)))?;
        Ok(Box::new(PgSession { client }))
    }
}

struct PgSession {
    client: Client,
}

impl Session for PgSession {
    fn execute(&mut self, sql: &str) -> Result<(), ScrapeError> {
        self.client
            .batch_execute(sql)
            .map_err(|e| ScrapeError::Query(format_postgres_error(&e)))
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>, ScrapeError> {
        let messages = self
            .client
            .simple_query(sql)
            .map_err(|e| ScrapeError::Query(format_postgres_error(&e)))?;

        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                let values = (0..row.len())
                    .map(|i| row.get(i).map(str::to_string))
                    .collect();
                rows.push(Row::new(columns, values));
            }
        }
        Ok(rows)
    }
}

/// Formats a `postgres` error without connection internals.
pub(crate) fn format_postgres_error(e: &postgres::Error) -> String {
    if let Some(db_error) = e.as_db_error() {
        format!("{}: {}", db_error.severity(), db_error.message())
    } else {
        let msg = e.to_string();
        if msg.contains("Connection refused") {
            "connection refused".to_string()
        } else if msg.contains("password authentication failed") {
            "password authentication failed".to_string()
        } else {
            msg
        }
    }
}

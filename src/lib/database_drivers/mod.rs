use crate::config::{ConnectionParams, Database};
use crate::error::DatabaseError;
use chrono::NaiveDate;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

pub mod mysql;
pub mod postgres;
pub mod sqlite;
mod utils;

/// A bound parameter or a decoded column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

pub type Row = Vec<Value>;

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Text columns, with dates written back as `%Y-%m-%d`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Text(v) => Some(v.clone()),
            Value::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }

    // SQLite hands dates back as text
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            Value::Text(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

pub type ExecuteFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, DatabaseError>> + Send + 'a>>;

// Connector is the contract every database driver implements
pub trait Connector: Send + Sync {
    // which driver this connector speaks
    fn driver(&self) -> Database;

    // parameters the connector was built with
    fn params(&self) -> &ConnectionParams;

    // underlying connections currently open
    fn live_connections(&self) -> usize;

    // open a connection, run the query and close the connection again.
    // Rows are only returned when fetch is set, writes only persist when commit is set.
    fn execute<'a>(
        &'a self,
        query: &'a str,
        data: &'a [Value],
        fetch: bool,
        commit: bool,
    ) -> ExecuteFuture<'a, Option<Vec<Row>>>;

    // schema statements
    fn create<'a>(&'a self, query: &'a str) -> ExecuteFuture<'a, ()> {
        Box::pin(async move {
            self.execute(query, &[], false, true).await?;
            Ok(())
        })
    }

    // inserts and updates
    fn save<'a>(&'a self, query: &'a str, data: &'a [Value]) -> ExecuteFuture<'a, Vec<Row>> {
        Box::pin(async move {
            let rows = self.execute(query, data, true, true).await?;
            Ok(rows.unwrap_or_default())
        })
    }

    // read only queries
    fn fetch<'a>(&'a self, query: &'a str, data: &'a [Value]) -> ExecuteFuture<'a, Vec<Row>> {
        Box::pin(async move {
            let rows = self.execute(query, data, true, false).await?;
            Ok(rows.unwrap_or_default())
        })
    }
}

// Creates a new connector for the driver, no connection is opened here
pub fn new(driver: Database, params: ConnectionParams) -> Result<Arc<dyn Connector>, DatabaseError> {
    match driver {
        Database::SQLite => Ok(Arc::new(sqlite::SqliteConnector::new(params)?)),
        Database::MySQL => Ok(Arc::new(mysql::MySQLConnector::new(params))),
        Database::Postgres => Ok(Arc::new(postgres::PostgresConnector::new(params))),
    }
}

/// Hands out one shared connector for its whole lifetime.
///
/// The first successful `get_database` decides the driver and parameters, every
/// later call gets that same connector back whatever it asks for. Build one at
/// start-up and pass it to whatever needs the database.
#[derive(Default)]
pub struct DatabaseFactory {
    instance: Mutex<Option<Arc<dyn Connector>>>,
}

impl DatabaseFactory {
    pub fn new() -> DatabaseFactory {
        DatabaseFactory::default()
    }

    pub fn get_database(
        &self,
        driver: &str,
        params: ConnectionParams,
    ) -> Result<Arc<dyn Connector>, DatabaseError> {
        let mut instance = self
            .instance
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(connector) = instance.as_ref() {
            return Ok(Arc::clone(connector));
        }

        let driver = Database::new(driver)?;
        let connector = new(driver, params)?;
        log::info!("Using {} connector", driver.as_str());
        *instance = Some(Arc::clone(&connector));

        Ok(connector)
    }
}

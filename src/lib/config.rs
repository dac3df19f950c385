use crate::error::DatabaseError;
use std::{env, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    SQLite,
    MySQL,
    Postgres,
}

impl Database {
    pub fn new(s: &str) -> Result<Database, DatabaseError> {
        match s {
            "sqlite" | "sqlite3" => Ok(Database::SQLite),
            "mysql" => Ok(Database::MySQL),
            "psql" | "postgres" | "postgresql" => Ok(Database::Postgres),
            _ => Err(DatabaseError::UnsupportedDriver(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Database::SQLite => "sqlite",
            Database::MySQL => "mysql",
            Database::Postgres => "postgres",
        }
    }

    // SQLite has no stored procedures, profiles go through a view there
    pub fn supports_procedures(&self) -> bool {
        !matches!(self, Database::SQLite)
    }
}

/// Driver keyword parameters. For SQLite `database` is the file path.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl ConnectionParams {
    pub fn sqlite(path: impl Into<String>) -> ConnectionParams {
        ConnectionParams {
            database: Some(path.into()),
            ..Default::default()
        }
    }

    /// Splits a database url into the driver kind and its parameters.
    pub fn from_url(db_url: &str) -> Result<(Database, ConnectionParams), DatabaseError> {
        let parsed_db_url =
            url::Url::parse(db_url).map_err(|e| DatabaseError::InvalidParams(e.to_string()))?;
        let driver = Database::new(parsed_db_url.scheme())?;

        if driver == Database::SQLite {
            let path = match db_url.split_once("://") {
                Some((_, path)) => path,
                None => db_url.split_once(':').map(|(_, p)| p).unwrap_or(db_url),
            };
            return Ok((driver, ConnectionParams::sqlite(path)));
        }

        let database = parsed_db_url.path().trim_start_matches('/');
        let user = parsed_db_url.username();

        Ok((
            driver,
            ConnectionParams {
                database: non_empty(database),
                user: non_empty(user),
                password: parsed_db_url.password().map(|p| p.to_string()),
                host: parsed_db_url.host_str().map(|h| h.to_string()),
                port: parsed_db_url.port(),
            },
        ))
    }

    pub fn from_env() -> Result<ConnectionParams, DatabaseError> {
        let port = match env_value("DATABASE_PORT") {
            Some(v) => Some(v.parse::<u16>().map_err(|_| {
                DatabaseError::InvalidParams(format!("DATABASE_PORT is not a port: {}", v))
            })?),
            None => None,
        };

        Ok(ConnectionParams {
            database: env_value("DATABASE_NAME"),
            user: env_value("DATABASE_USER"),
            password: env_value("DATABASE_PASSWORD"),
            host: env_value("DATABASE_HOST"),
            port,
        })
    }
}

pub fn driver_from_env() -> String {
    env_value("DATABASE_DRIVER").unwrap_or_else(|| "mysql".to_string())
}

fn env_value(key: &str) -> Option<String> {
    if let Ok(v) = env::var(key) {
        if !v.is_empty() {
            return Some(v);
        }
    }

    None
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

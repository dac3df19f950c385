use crate::config::{ConnectionParams, Database};
use crate::database_drivers::{Connector, ExecuteFuture, Row, Value};
use chrono::NaiveDate;
use log::{debug, error, info};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Connection, Executor, MySqlConnection, Row as _};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MySQLConnector {
    params: ConnectionParams,
    options: MySqlConnectOptions,
    live: AtomicUsize,
}

impl MySQLConnector {
    pub fn new(params: ConnectionParams) -> MySQLConnector {
        let mut options = MySqlConnectOptions::new();

        if let Some(host) = &params.host {
            options = options.host(host);
        }
        if let Some(port) = params.port {
            options = options.port(port);
        }
        if let Some(user) = &params.user {
            options = options.username(user);
        }
        if let Some(password) = &params.password {
            options = options.password(password);
        }
        if let Some(database) = &params.database {
            options = options.database(database);
        }

        MySQLConnector {
            params,
            options,
            live: AtomicUsize::new(0),
        }
    }
}

impl Connector for MySQLConnector {
    fn driver(&self) -> Database {
        Database::MySQL
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn live_connections(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn execute<'a>(
        &'a self,
        query: &'a str,
        data: &'a [Value],
        fetch: bool,
        commit: bool,
    ) -> ExecuteFuture<'a, Option<Vec<Row>>> {
        let fut = async move {
            let mut conn = MySqlConnection::connect_with(&self.options).await?;
            self.live.fetch_add(1, Ordering::SeqCst);
            info!("Opened mysql connection");
            debug!("Executing query: {}", query);

            let outcome = run(&mut conn, query, data, fetch, commit).await;

            let closed = conn.close().await;
            self.live.fetch_sub(1, Ordering::SeqCst);

            if let Err(e) = &outcome {
                error!("Error executing query: {}", e);
            }

            let rows = outcome?;
            closed?;
            Ok(rows)
        };

        Box::pin(fut)
    }
}

async fn run(
    conn: &mut MySqlConnection,
    query: &str,
    data: &[Value],
    fetch: bool,
    commit: bool,
) -> Result<Option<Vec<Row>>, sqlx::Error> {
    let mut tx = conn.begin().await?;

    // without arguments the text protocol is used, which CREATE PROCEDURE needs
    let rows = if data.is_empty() {
        if fetch {
            Some((&mut *tx).fetch_all(query).await?)
        } else {
            (&mut *tx).execute(query).await?;
            None
        }
    } else {
        let bound = bind_values(sqlx::query(query), data);
        if fetch {
            Some(bound.fetch_all(&mut *tx).await?)
        } else {
            bound.execute(&mut *tx).await?;
            None
        }
    };

    if commit {
        tx.commit().await?;
    } else {
        tx.rollback().await?;
    }

    rows.map(|rows| rows.iter().map(decode_row).collect::<Result<Vec<Row>, _>>())
        .transpose()
}

fn bind_values<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    data: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in data {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Date(v) => query.bind(*v),
        };
    }

    query
}

fn decode_row(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

fn decode_value(row: &MySqlRow, index: usize) -> Result<Value, sqlx::Error> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<u64>, _>(index) {
        return Ok(v.map(|v| Value::Int(v as i64)).unwrap_or(Value::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(index) {
        return Ok(v.into());
    }

    row.try_get::<Option<String>, _>(index).map(Value::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_params() {
        let params = ConnectionParams {
            database: Some("profiles".to_string()),
            user: Some("root".to_string()),
            password: Some("password".to_string()),
            host: Some("127.0.0.1".to_string()),
            port: Some(3306),
        };
        let connector = MySQLConnector::new(params.clone());

        assert_eq!(connector.driver(), Database::MySQL);
        assert_eq!(connector.params(), &params);
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_driver_error() {
        let connector = MySQLConnector::new(ConnectionParams {
            database: Some("profiles".to_string()),
            user: Some("root".to_string()),
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            ..Default::default()
        });

        let result = connector.fetch("SELECT 1", &[]).await;
        assert!(matches!(
            result,
            Err(crate::error::DatabaseError::Driver(_))
        ));
        assert_eq!(connector.live_connections(), 0);
    }
}

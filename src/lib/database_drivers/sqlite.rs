use crate::config::{ConnectionParams, Database};
use crate::database_drivers::{Connector, ExecuteFuture, Row, Value};
use crate::error::DatabaseError;
use chrono::NaiveDate;
use log::{debug, error, info};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column, Connection, Executor, Row as _, SqliteConnection, TypeInfo, ValueRef};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct SqliteConnector {
    params: ConnectionParams,
    options: SqliteConnectOptions,
    live: AtomicUsize,
}

impl SqliteConnector {
    pub fn new(params: ConnectionParams) -> Result<SqliteConnector, DatabaseError> {
        let path = match params.database.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => {
                return Err(DatabaseError::InvalidParams(
                    "sqlite needs a database file path".to_string(),
                ))
            }
        };

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        Ok(SqliteConnector {
            params,
            options,
            live: AtomicUsize::new(0),
        })
    }
}

impl Connector for SqliteConnector {
    fn driver(&self) -> Database {
        Database::SQLite
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
            let mut conn = SqliteConnection::connect_with(&self.options).await?;
            self.live.fetch_add(1, Ordering::SeqCst);
            info!("Opened sqlite connection");
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
    conn: &mut SqliteConnection,
    query: &str,
    data: &[Value],
    fetch: bool,
    commit: bool,
) -> Result<Option<Vec<Row>>, sqlx::Error> {
    let mut tx = conn.begin().await?;

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
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    data: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
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

fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

// SQLite stores dates as text, so the declared column type picks the decoder
fn decode_value(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }

    match row.column(index).type_info().name() {
        "TEXT" => return row.try_get::<String, _>(index).map(Value::Text),
        "DATE" => {
            if let Ok(v) = row.try_get::<NaiveDate, _>(index) {
                return Ok(Value::Date(v));
            }
        }
        _ => {}
    }

    if let Ok(v) = row.try_get::<i64, _>(index) {
        return Ok(Value::Int(v));
    }
    if let Ok(v) = row.try_get::<f64, _>(index) {
        return Ok(Value::Float(v));
    }

    row.try_get::<String, _>(index).map(Value::Text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::database_test_utils::sqlite_connector;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_save_fetch() {
        let tmp_dir = tempdir().unwrap();
        let connector = sqlite_connector(&tmp_dir);

        connector
            .create("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL, score REAL)")
            .await
            .unwrap();

        let returned = connector
            .save(
                "INSERT INTO notes (body, score) VALUES (?, ?) RETURNING id",
                &[Value::from("first"), Value::from(1.5_f64)],
            )
            .await
            .unwrap();
        assert_eq!(returned, vec![vec![Value::Int(1)]]);

        let rows = connector
            .fetch("SELECT id, body, score FROM notes WHERE body = ?", &["first".into()])
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Int(1), Value::from("first"), Value::Float(1.5)]]
        );
    }

    #[tokio::test]
    async fn test_fetch_without_match_is_empty() {
        let tmp_dir = tempdir().unwrap();
        let connector = sqlite_connector(&tmp_dir);
        connector
            .create("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
            .await
            .unwrap();

        let rows = connector
            .fetch("SELECT id FROM notes WHERE body = ?", &["missing".into()])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_execute_without_commit_is_rolled_back() {
        let tmp_dir = tempdir().unwrap();
        let connector = sqlite_connector(&tmp_dir);
        connector
            .create("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
            .await
            .unwrap();

        let result = connector
            .execute("INSERT INTO notes (body) VALUES (?)", &["lost".into()], false, false)
            .await
            .unwrap();
        assert!(result.is_none());

        let rows = connector.fetch("SELECT id FROM notes", &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_failing_query_closes_connection() {
        let tmp_dir = tempdir().unwrap();
        let connector = sqlite_connector(&tmp_dir);

        let result = connector.fetch("SELECT * FROM missing_table", &[]).await;
        assert!(matches!(result, Err(DatabaseError::Driver(_))));
        assert_eq!(connector.live_connections(), 0);

        // the connector stays usable after a failure
        connector.create("CREATE TABLE ok (id INTEGER)").await.unwrap();
        assert_eq!(connector.live_connections(), 0);
    }

    #[tokio::test]
    async fn test_nulls_and_dates_decode() {
        let tmp_dir = tempdir().unwrap();
        let connector = sqlite_connector(&tmp_dir);
        connector
            .create("CREATE TABLE events (name TEXT, day DATE)")
            .await
            .unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        connector
            .save(
                "INSERT INTO events (name, day) VALUES (?, ?)",
                &[Value::Null, Value::Date(day)],
            )
            .await
            .unwrap();

        let rows = connector.fetch("SELECT name, day FROM events", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0][0].is_null());
        assert_eq!(rows[0][1].as_date(), Some(day));
    }

    #[tokio::test]
    async fn test_date_shaped_text_stays_text() {
        let tmp_dir = tempdir().unwrap();
        let connector = sqlite_connector(&tmp_dir);
        connector
            .create("CREATE TABLE tags (label TEXT, day DATE, note)")
            .await
            .unwrap();

        connector
            .save(
                "INSERT INTO tags (label, day, note) VALUES (?, ?, ?)",
                &["2000-01-01".into(), "not a date".into(), "1999-12-31".into()],
            )
            .await
            .unwrap();

        let rows = connector
            .fetch("SELECT label, day, note FROM tags", &[])
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![
                Value::from("2000-01-01"),
                Value::from("not a date"),
                Value::from("1999-12-31"),
            ]]
        );
    }
}

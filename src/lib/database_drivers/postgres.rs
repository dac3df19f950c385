use crate::config::{ConnectionParams, Database};
use crate::database_drivers::{utils, Connector, ExecuteFuture, Row, Value};
use chrono::NaiveDate;
use log::{debug, error, info};
use sqlx::encode::IsNull;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgConnectOptions, PgRow, PgTypeInfo, Postgres};
use sqlx::query::Query;
use sqlx::{Connection, Encode, Executor, PgConnection, Row as _, Type};
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct PostgresConnector {
    params: ConnectionParams,
    options: PgConnectOptions,
    live: AtomicUsize,
}

impl PostgresConnector {
    pub fn new(params: ConnectionParams) -> PostgresConnector {
        // unset fields fall back to the PG* environment variables
        let mut options = PgConnectOptions::new();

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

        PostgresConnector {
            params,
            options,
            live: AtomicUsize::new(0),
        }
    }
}

impl Connector for PostgresConnector {
    fn driver(&self) -> Database {
        Database::Postgres
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
            let query = utils::numbered_placeholders(query);

            let mut conn = PgConnection::connect_with(&self.options).await?;
            self.live.fetch_add(1, Ordering::SeqCst);
            info!("Opened postgres connection");
            debug!("Executing query: {}", query);

            let outcome = run(&mut conn, &query, data, fetch, commit).await;

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
    conn: &mut PgConnection,
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

// A NULL parameter with no declared type, so the server infers it from the
// query the same way it does for a bare NULL literal.
struct UntypedNull;

impl Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> IsNull {
        IsNull::Yes
    }
}

fn bind_values<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    data: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for value in data {
        query = match value {
            Value::Null => query.bind(UntypedNull),
            Value::Bool(v) => query.bind(*v),
            Value::Int(v) => query.bind(*v),
            Value::Float(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.clone()),
            Value::Date(v) => query.bind(*v),
        };
    }

    query
}

fn decode_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    (0..row.len()).map(|index| decode_value(row, index)).collect()
}

// postgres is strict about widths, so every integer and float size is tried
fn decode_value(row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return Ok(v.into());
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
        return Ok(v.into());
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
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return Ok(v.into());
    }

    row.try_get::<Option<String>, _>(index).map(Value::from)
}

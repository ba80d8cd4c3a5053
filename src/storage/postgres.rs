//! PostgreSQL store over `tokio-postgres`.

use super::sql;
use crate::connection::config::ConnectionConfig;
use crate::connection::{ConnectionState, Connector, Selection, StoreConnection};
use crate::core::{ColumnDescriptor, DbError, ID_COLUMN, Identifier, Result, SqlType, Value};
use crate::result::RowSet;
use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::error::Error;
use tokio::task::JoinHandle;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error};

type BoxError = Box<dyn Error + Sync + Send>;

/// Opens one `tokio-postgres` connection per call.
#[derive(Debug, Clone)]
pub struct PgConnector {
    config: ConnectionConfig,
}

impl PgConnector {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ConnectionConfig::from_env()?))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = PgConnection;

    async fn connect(&self) -> Result<PgConnection> {
        let (client, connection) = self
            .config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("{}: {}", self.target(), e)))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "PostgreSQL connection error");
            }
        });

        Ok(PgConnection {
            client: Some(client),
            driver: Some(driver),
            database: self.config.database.clone(),
            state: ConnectionState::Idle,
        })
    }

    fn target(&self) -> String {
        self.config.to_url()
    }
}

pub struct PgConnection {
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
    database: String,
    state: ConnectionState,
}

impl PgConnection {
    fn client(&self) -> Result<&Client> {
        self.client.as_ref().ok_or(DbError::ConnectionClosed)
    }

    /// Open the implicit transaction before the first statement.
    async fn begin_if_idle(&mut self) -> Result<&Client> {
        match self.state {
            ConnectionState::Closed => return Err(DbError::ConnectionClosed),
            ConnectionState::Idle => {
                self.client()?.batch_execute("BEGIN").await?;
                self.state = ConnectionState::InTransaction;
            }
            ConnectionState::InTransaction => {}
            ConnectionState::Aborted => return Err(DbError::TransactionAborted),
        }
        self.client()
    }

    /// An error raised by the server aborts the open transaction; client
    /// side failures such as a value that cannot be bound do not.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(DbError::Postgres(e)) = &result {
            if e.as_db_error().is_some() && self.state == ConnectionState::InTransaction {
                self.state = ConnectionState::Aborted;
            }
        }
        result
    }

    async fn batch(&mut self, statement: &str) -> Result<()> {
        self.begin_if_idle().await?.batch_execute(statement).await?;
        Ok(())
    }

    async fn fetch(&mut self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<RowSet> {
        let client = self.begin_if_idle().await?;
        let statement = client.prepare(sql).await?;
        let rows = client.query(&statement, params).await?;

        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        let id_index = columns.iter().position(|c| c == ID_COLUMN).ok_or_else(|| {
            DbError::ColumnNotFound(ID_COLUMN.to_string(), sql.to_string())
        })?;

        let mut result = RowSet::new(
            columns
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != id_index)
                .map(|(_, name)| name.clone())
                .collect(),
        );

        for row in &rows {
            let id = decode_value(row, id_index)?
                .as_i64()
                .ok_or_else(|| DbError::TypeMismatch("row id is not an integer".into()))?;
            let mut values = Vec::with_capacity(columns.len() - 1);
            for idx in (0..columns.len()).filter(|i| *i != id_index) {
                values.push(decode_value(row, idx)?);
            }
            result.push(id, values);
        }

        Ok(result)
    }
}

#[async_trait]
impl StoreConnection for PgConnection {
    async fn table_exists(&mut self, table: &Identifier) -> Result<bool> {
        let database = self.database.clone();
        let result: Result<bool> = async {
            let client = self.begin_if_idle().await?;
            let row = client
                .query_one(sql::TABLE_EXISTS, &[&database, &table.as_str()])
                .await?;
            Ok(row.try_get(0)?)
        }
        .await;
        self.track(result)
    }

    async fn column_types(&mut self, table: &Identifier) -> Result<Vec<ColumnDescriptor>> {
        let database = self.database.clone();
        let result: Result<Vec<ColumnDescriptor>> = async {
            let client = self.begin_if_idle().await?;
            let rows = client
                .query(sql::COLUMN_TYPES, &[&database, &table.as_str()])
                .await?;

            rows.iter()
                .map(|row| {
                    let name: String = row.try_get(0)?;
                    let data_type: String = row.try_get(1)?;
                    let nullable: String = row.try_get(2)?;
                    let column = ColumnDescriptor::new(name, SqlType::from_catalog(&data_type));
                    Ok(if nullable == "YES" {
                        column
                    } else {
                        column.not_null()
                    })
                })
                .collect()
        }
        .await;
        self.track(result)
    }

    async fn create_table(
        &mut self,
        table: &Identifier,
        columns: &[(Identifier, SqlType)],
    ) -> Result<()> {
        let statement = sql::create_table(table, columns)?;
        debug!(sql = %statement, "create table");
        let result = self.batch(&statement).await;
        self.track(result)
    }

    async fn drop_table(&mut self, table: &Identifier) -> Result<()> {
        let statement = sql::drop_table(table);
        let result = self.batch(&statement).await;
        self.track(result)
    }

    async fn insert(
        &mut self,
        table: &Identifier,
        columns: &[Identifier],
        values: &[Value],
    ) -> Result<()> {
        let statement = sql::insert(table, columns);
        let params: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let result: Result<()> = async {
            self.begin_if_idle()
                .await?
                .execute(statement.as_str(), &params)
                .await?;
            Ok(())
        }
        .await;
        self.track(result)
    }

    async fn count(&mut self, table: &Identifier) -> Result<i64> {
        let statement = sql::count(table);
        let result: Result<i64> = async {
            let row = self.begin_if_idle().await?.query_one(statement.as_str(), &[]).await?;
            Ok(row.try_get(0)?)
        }
        .await;
        self.track(result)
    }

    async fn select(&mut self, table: &Identifier, selection: Selection) -> Result<RowSet> {
        let statement = sql::select(table, selection);

        let result = match selection {
            Selection::All => self.fetch(&statement, &[]).await,
            Selection::ById(id) => self.fetch(&statement, &[&id]).await,
            Selection::Range { limit, offset } => {
                let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                let offset = i64::try_from(offset).unwrap_or(i64::MAX);
                self.fetch(&statement, &[&limit, &offset]).await
            }
        };
        self.track(result)
    }

    async fn commit(&mut self) -> Result<()> {
        match self.state {
            ConnectionState::Closed => Err(DbError::ConnectionClosed),
            ConnectionState::Idle => Ok(()),
            // the server answers COMMIT of an aborted transaction with a rollback
            ConnectionState::InTransaction | ConnectionState::Aborted => {
                self.client()?.batch_execute("COMMIT").await?;
                self.state = ConnectionState::Idle;
                Ok(())
            }
        }
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.state == ConnectionState::Closed {
            return Err(DbError::ConnectionClosed);
        }
        self.client()?.batch_execute("ROLLBACK").await?;
        self.state = ConnectionState::Idle;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the client ends the session; the server discards any
        // open transaction.
        self.client = None;
        self.state = ConnectionState::Closed;

        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                error!(error = %e, "PostgreSQL connection task failed");
            }
        }
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

/// Decode one cell by its PostgreSQL type. NUMERIC reads back as a float.
fn decode_value(row: &Row, idx: usize) -> Result<Value> {
    let ty = row.columns()[idx].type_();

    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(i64::from).into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(i64::from).into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(f64::from).into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.into(),
        Type::NUMERIC => match row.try_get::<_, Option<Decimal>>(idx)? {
            Some(decimal) => Value::Float(decimal.to_f64().ok_or_else(|| {
                DbError::TypeMismatch(format!("numeric {} does not fit a float", decimal))
            })?),
            None => Value::Null,
        },
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            row.try_get::<_, Option<String>>(idx)?.into()
        }
        Type::TIMESTAMP => row.try_get::<_, Option<NaiveDateTime>>(idx)?.into(),
        Type::TIMESTAMPTZ => row.try_get::<_, Option<DateTime<Utc>>>(idx)?.into(),
        _ => {
            return Err(DbError::TypeMismatch(format!(
                "column '{}' has unsupported type {}",
                row.columns()[idx].name(),
                ty
            )));
        }
    };

    Ok(value)
}

fn mismatch(value: &Value, ty: &Type) -> BoxError {
    format!("cannot bind {} value to a {} parameter", value.type_name(), ty).into()
}

/// Binds a [`Value`] to whatever type the server inferred for the
/// parameter, so one insert statement serves every column type.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::INT8 => i.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*i).to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                Type::FLOAT8 => f.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*f)?.to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Text(s) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                    s.as_str().to_sql(ty, out)
                }
                _ => Err(mismatch(self, ty)),
            },
            Value::Boolean(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => ts.naive_utc().to_sql(ty, out),
                Type::TIMESTAMPTZ => ts.to_sql(ty, out),
                _ => Err(mismatch(self, ty)),
            },
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

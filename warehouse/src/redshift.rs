use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeZone, Utc};
use config_store::AwsSettings;
use redditlens_core::{
    ConnectionProbe, CoreError, DataSource, DatabaseError, ExtractionSource, Freshness,
    HealthTarget,
};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Where the warehouse lives. Redshift speaks the Postgres wire protocol.
#[derive(Clone)]
pub struct RedshiftTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl From<&AwsSettings> for RedshiftTarget {
    fn from(aws: &AwsSettings) -> Self {
        Self {
            host: aws.redshift_hostname.clone(),
            port: aws.redshift_port,
            database: aws.redshift_database.clone(),
            username: aws.redshift_username.clone(),
            password: aws.redshift_password.clone(),
        }
    }
}

impl fmt::Debug for RedshiftTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedshiftTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for RedshiftTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}

pub struct RedshiftWarehouse {
    pool: PgPool,
    target: RedshiftTarget,
    table: String,
}

impl RedshiftWarehouse {
    /// Builds the pool without opening a connection; the first query connects.
    pub fn connect_lazy(
        target: RedshiftTarget,
        table: &str,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let table = quote_table_name(table)?;

        let options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .database(&target.database)
            .username(&target.username)
            .password(&target.password)
            .application_name("redditlens");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_lazy_with(options);

        debug!("Prepared warehouse pool for {} (table {})", target, table);
        Ok(Self {
            pool,
            target,
            table,
        })
    }

    pub fn target(&self) -> &RedshiftTarget {
        &self.target
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl ExtractionSource for RedshiftWarehouse {
    fn kind(&self) -> DataSource {
        DataSource::Warehouse
    }

    async fn freshness(&self) -> Result<Freshness, CoreError> {
        let query = format!(
            "SELECT MIN(created_utc), MAX(created_utc), COUNT(*) FROM {}",
            self.table
        );
        let start_time = Instant::now();

        let (oldest, newest, row_count): (Option<NaiveDateTime>, Option<NaiveDateTime>, i64) =
            sqlx::query_as(&query)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    error!("Freshness query on {} failed: {}", self.table, e);
                    map_sqlx_error(e)
                })?;

        info!(
            "Warehouse table {} holds {} rows (query took {:?})",
            self.table,
            row_count,
            start_time.elapsed()
        );

        Ok(Freshness {
            source: DataSource::Warehouse,
            oldest: oldest.map(|ts| Utc.from_utc_datetime(&ts)),
            newest: newest.map(|ts| Utc.from_utc_datetime(&ts)),
            row_count: u64::try_from(row_count).unwrap_or(0),
        })
    }
}

#[async_trait]
impl ConnectionProbe for RedshiftWarehouse {
    fn target(&self) -> HealthTarget {
        HealthTarget::Warehouse
    }

    async fn ping(&self) -> Result<String, CoreError> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("Warehouse answered SELECT 1 with {}", one);
        Ok(format!("Connected to {}", self.target))
    }
}

/// Connection-level failures become `ConnectionFailed`; everything else keeps the SQL error.
fn map_sqlx_error(err: sqlx::Error) -> CoreError {
    let database_error = match err {
        sqlx::Error::PoolTimedOut => DatabaseError::ConnectionFailed {
            reason: "no connection could be opened in time".to_string(),
        },
        sqlx::Error::Io(e) => DatabaseError::ConnectionFailed {
            reason: e.to_string(),
        },
        sqlx::Error::Tls(e) => DatabaseError::ConnectionFailed {
            reason: format!("TLS: {}", e),
        },
        sqlx::Error::Configuration(e) => DatabaseError::ConnectionFailed {
            reason: e.to_string(),
        },
        other => DatabaseError::Sql(other),
    };
    CoreError::Database(database_error)
}

/// Accepts `table` or `schema.table` and returns it double-quoted for SQL.
pub fn quote_table_name(raw: &str) -> Result<String, CoreError> {
    let invalid = || {
        CoreError::Database(DatabaseError::InvalidTable {
            table: raw.to_string(),
        })
    };

    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() > 2 {
        return Err(invalid());
    }

    let mut quoted = Vec::with_capacity(parts.len());
    for part in parts {
        let mut chars = part.chars();
        let valid_start = chars
            .next()
            .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid());
        }
        quoted.push(format!("\"{}\"", part));
    }

    Ok(quoted.join("."))
}

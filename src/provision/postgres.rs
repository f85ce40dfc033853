use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Executor};

use super::engine::DatabaseEngine;
use crate::error::{HarnessError, HarnessResult};
use crate::utils::config::{DbmsKind, RunConfig};

/// Maintenance database the administrative connection is opened on
const ADMIN_DATABASE: &str = "postgres";

/// PostgreSQL administration over a single connection.
///
/// `CREATE DATABASE` can't run inside a transaction, statements are sent as
/// plain queries on an autocommit connection.
pub struct PostgresEngine {
    options: PgConnectOptions,
    conn: Option<PgConnection>,
}

impl PostgresEngine {
    pub fn new(config: &RunConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(ADMIN_DATABASE);

        Self {
            options,
            conn: None,
        }
    }

    fn connection(&mut self) -> HarnessResult<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| HarnessError::provisioning("not connected to postgres"))
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl DatabaseEngine for PostgresEngine {
    fn kind(&self) -> DbmsKind {
        DbmsKind::Postgres
    }

    async fn connect(&mut self) -> HarnessResult<()> {
        if self.conn.is_none() {
            self.conn = Some(self.options.connect().await?);
        }
        Ok(())
    }

    async fn create_database(&mut self, name: &str) -> HarnessResult<()> {
        let sql = format!("CREATE DATABASE {}", quote_identifier(name));
        self.connection()?.execute(sql.as_str()).await?;
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> HarnessResult<()> {
        let sql = format!("DROP DATABASE {}", quote_identifier(name));
        self.connection()?.execute(sql.as_str()).await?;
        Ok(())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().await?;
        }
        Ok(())
    }
}

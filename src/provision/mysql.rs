use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};

use super::engine::DatabaseEngine;
use crate::error::{HarnessError, HarnessResult};
use crate::utils::config::{DbmsKind, RunConfig};

/// MySQL / MariaDB administration over a single connection
pub struct MySqlEngine {
    options: MySqlConnectOptions,
    conn: Option<MySqlConnection>,
}

impl MySqlEngine {
    pub fn new(config: &RunConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password);

        Self {
            options,
            conn: None,
        }
    }

    fn connection(&mut self) -> HarnessResult<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| HarnessError::provisioning("not connected to mysql"))
    }
}

fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[async_trait]
impl DatabaseEngine for MySqlEngine {
    fn kind(&self) -> DbmsKind {
        DbmsKind::Mysql
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

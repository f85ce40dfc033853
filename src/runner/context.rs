use crate::client::HttpSession;
use crate::error::HarnessResult;
use crate::flows::api::ApiKeyRecord;
use crate::utils::config::{AdminCredentials, DbmsKind, RunConfig};

/// Connection settings submitted to the install wizard
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub dbms: DbmsKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl DatabaseSettings {
    pub fn from_config(config: &RunConfig, database: &str) -> Self {
        Self {
            dbms: config.dbms,
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            database: database.to_string(),
        }
    }
}

/// State shared by every step of the install and API flows.
///
/// One [`HttpSession`] lives here for the whole run, so the login performed
/// by the API flow is carried by the requests that follow it.
pub struct FlowContext {
    pub session: HttpSession,
    pub admin: AdminCredentials,
    pub database: DatabaseSettings,

    /// Key created by the API flow, consumed by refresh and revoke
    pub api_key: Option<ApiKeyRecord>,
}

impl FlowContext {
    pub fn new(
        base_url: &str,
        admin: AdminCredentials,
        database: DatabaseSettings,
    ) -> HarnessResult<Self> {
        Ok(Self {
            session: HttpSession::new(base_url)?,
            admin,
            database,
            api_key: None,
        })
    }

    pub fn from_config(config: &RunConfig, database: &str) -> HarnessResult<Self> {
        Self::new(
            &config.base_url,
            config.admin.clone(),
            DatabaseSettings::from_config(config, database),
        )
    }
}

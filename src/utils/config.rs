use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "http://localhost/";
pub const DEFAULT_APP_ROOT: &str = "..";
pub const ADMIN_USERNAME: &str = "Administrator";
const ADMIN_PASSWORD_LENGTH: usize = 16;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DbmsKind {
    Mysql,
    Postgres,
}

impl DbmsKind {
    pub const ALL: [DbmsKind; 2] = [DbmsKind::Mysql, DbmsKind::Postgres];

    pub fn default_port(self) -> u16 {
        match self {
            DbmsKind::Mysql => 3306,
            DbmsKind::Postgres => 5432,
        }
    }

    /// Value of the `type` field the install wizard expects
    pub fn as_str(self) -> &'static str {
        match self {
            DbmsKind::Mysql => "mysql",
            DbmsKind::Postgres => "postgres",
        }
    }
}

impl fmt::Display for DbmsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbmsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DbmsKind::Mysql),
            "postgres" | "postgresql" => Ok(DbmsKind::Postgres),
            _ => Err(format!(
                "Unsupported dbms '{}'. Supported values: {}",
                s,
                DbmsKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Credentials of the administrator account created by the install flow.
///
/// Generated once per run and handed to every flow that needs them.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl AdminCredentials {
    pub fn generate() -> Self {
        Self {
            username: ADMIN_USERNAME.to_string(),
            password: random_string(ADMIN_PASSWORD_LENGTH),
        }
    }
}

/// Configuration for one harness run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dbms: DbmsKind,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    /// Existing database to install into. `None` creates a temporary one.
    pub database: Option<String>,

    /// Delete leftover configuration files instead of aborting
    pub force: bool,

    /// Root URL of the application under test
    pub base_url: String,

    /// Application checkout, config artifacts are resolved against it
    pub app_root: PathBuf,

    pub output_dir: PathBuf,
    pub report: bool,

    pub admin: AdminCredentials,
}

impl RunConfig {
    pub fn new(dbms: DbmsKind) -> Self {
        Self {
            dbms,
            host: "localhost".to_string(),
            port: dbms.default_port(),
            username: "root".to_string(),
            password: String::new(),
            database: None,
            force: false,
            base_url: DEFAULT_BASE_URL.to_string(),
            app_root: PathBuf::from(DEFAULT_APP_ROOT),
            output_dir: PathBuf::from("./output"),
            report: false,
            admin: AdminCredentials::generate(),
        }
    }
}

/// Random string of ASCII letters and digits
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Random string of lowercase ASCII letters
pub fn random_lowercase(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| rng.gen_range(b'a'..=b'z') as char)
        .collect()
}

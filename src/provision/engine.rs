use async_trait::async_trait;
use log::warn;

use crate::error::{HarnessError, HarnessResult};
use crate::runner::EventEmitter;
use crate::utils::config::{random_lowercase, DbmsKind};

pub const DATABASE_PREFIX: &str = "webbase_test_";
const DATABASE_SUFFIX_LENGTH: usize = 6;

/// Administrative access to one database engine.
///
/// The provisioner only ever talks to an engine through this trait.
#[async_trait]
pub trait DatabaseEngine: Send {
    fn kind(&self) -> DbmsKind;

    /// Open the administrative connection
    async fn connect(&mut self) -> HarnessResult<()>;

    async fn create_database(&mut self, name: &str) -> HarnessResult<()>;

    async fn drop_database(&mut self, name: &str) -> HarnessResult<()>;

    /// Close the administrative connection. A no-op when not connected.
    async fn close(&mut self) -> HarnessResult<()>;
}

/// Name for a temporary database, e.g. `webbase_test_qzkfwa`
pub fn generate_database_name() -> String {
    format!("{}{}", DATABASE_PREFIX, random_lowercase(DATABASE_SUFFIX_LENGTH))
}

/// Names end up inside DDL statements, so only plain identifiers pass
pub fn validate_database_name(name: &str) -> HarnessResult<()> {
    let valid = !name.is_empty()
        && name.len() <= 63
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if !valid {
        return Err(HarnessError::Config(format!(
            "Invalid database name '{}': use letters, digits and underscores",
            name
        )));
    }
    Ok(())
}

/// A database created for one run only.
///
/// Must be handed back through [`EphemeralDatabase::release`], which drops
/// it and closes the administrative connection.
pub struct EphemeralDatabase {
    name: String,
    engine: Box<dyn DatabaseEngine>,
    released: bool,
}

impl EphemeralDatabase {
    /// Connect to the engine and create `name`
    pub async fn create(
        mut engine: Box<dyn DatabaseEngine>,
        name: String,
        emitter: &EventEmitter,
    ) -> HarnessResult<Self> {
        validate_database_name(&name)?;

        emitter.log(format!("[ ] Connecting to {}…", engine.kind()));
        engine.connect().await.map_err(|e| {
            HarnessError::provisioning(format!("Cannot connect to {}: {}", engine.kind(), e))
        })?;
        emitter.log("[+] Success");

        emitter.log(format!("[ ] Creating temporary database {}", name));
        if let Err(e) = engine.create_database(&name).await {
            if let Err(close) = engine.close().await {
                warn!("Failed to close {} connection: {}", engine.kind(), close);
            }
            return Err(HarnessError::provisioning(format!(
                "Cannot create database {}: {}",
                name, e
            )));
        }
        emitter.log("[+] Success");

        Ok(Self {
            name,
            engine,
            released: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DbmsKind {
        self.engine.kind()
    }

    /// Drop the database and close the connection. Every step is attempted;
    /// failures come back as messages.
    pub async fn release(mut self, emitter: &EventEmitter) -> Vec<String> {
        self.released = true;
        let mut errors = Vec::new();

        emitter.log("[ ] Deleting temporary database");
        match self.engine.drop_database(&self.name).await {
            Ok(()) => emitter.log("[+] Success"),
            Err(e) => {
                warn!("Failed to drop database {}: {}", self.name, e);
                errors.push(format!("Failed to drop database {}: {}", self.name, e));
            }
        }

        emitter.log("[ ] Closing connection…");
        if let Err(e) = self.engine.close().await {
            warn!("Failed to close {} connection: {}", self.engine.kind(), e);
            errors.push(format!("Failed to close {} connection: {}", self.engine.kind(), e));
        }

        errors
    }
}

impl Drop for EphemeralDatabase {
    fn drop(&mut self) {
        if !self.released {
            warn!(
                "Temporary database {} was not dropped, remove it manually",
                self.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        let a = generate_database_name();
        let b = generate_database_name();
        assert!(a.starts_with(DATABASE_PREFIX));
        assert_eq!(a.len(), DATABASE_PREFIX.len() + 6);
        assert!(validate_database_name(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn test_validate_database_name() {
        assert!(validate_database_name("webbase").is_ok());
        assert!(validate_database_name("web_base_2").is_ok());
        assert!(validate_database_name("").is_err());
        assert!(validate_database_name("1abc").is_err());
        assert!(validate_database_name("x; DROP DATABASE y").is_err());
        assert!(validate_database_name("a-b").is_err());
        assert!(validate_database_name(&"a".repeat(64)).is_err());
    }
}

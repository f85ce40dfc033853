//! Environment provisioning around a harness run.
//!
//! A run owns two resources: the clean-environment guard over the
//! application's configuration files, and (unless the caller named an
//! existing database) a temporary database. Both are released on every exit
//! path, and a release failure is reported next to the test outcome rather
//! than replacing it.

pub mod artifacts;
pub mod engine;
pub mod mysql;
pub mod postgres;

pub use artifacts::{artifact_paths, clean_artifacts, ArtifactGuard, CONFIG_FILES};
pub use engine::{
    generate_database_name, validate_database_name, DatabaseEngine, EphemeralDatabase,
    DATABASE_PREFIX,
};
pub use mysql::MySqlEngine;
pub use postgres::PostgresEngine;

use log::{info, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::runner::{self, EventEmitter, FlowContext, FlowExecutor, RunReport};
use crate::utils::config::{DbmsKind, RunConfig};

/// Engine adapter for the configured dbms
pub fn engine_for(config: &RunConfig) -> Box<dyn DatabaseEngine> {
    match config.dbms {
        DbmsKind::Mysql => Box::new(MySqlEngine::new(config)),
        DbmsKind::Postgres => Box::new(PostgresEngine::new(config)),
    }
}

/// What a provisioned run produced
pub struct RunOutcome {
    /// Database the application was installed into
    pub database: Option<String>,
    pub report: RunReport,
    pub result: HarnessResult<()>,
}

pub struct Provisioner {
    config: RunConfig,
    emitter: EventEmitter,
}

impl Provisioner {
    pub fn new(config: RunConfig, emitter: EventEmitter) -> Self {
        Self { config, emitter }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Provision, run the install and API flows, tear down.
    ///
    /// `engine` is only used when the configuration names no database.
    pub async fn run(&self, engine: Box<dyn DatabaseEngine>) -> RunOutcome {
        let mut executor = FlowExecutor::new(self.emitter.clone());

        let guard = match ArtifactGuard::acquire(&self.config.app_root, self.config.force, &self.emitter) {
            Ok(guard) => guard,
            Err(e) => return self.outcome(executor, None, Err(e)),
        };

        let (database, ephemeral) = match &self.config.database {
            Some(name) => {
                if let Err(e) = validate_database_name(name) {
                    let teardown = guard.release(&self.emitter);
                    return self.outcome(executor, None, Err(e.with_teardown(teardown)));
                }
                info!("Using existing database {}", name);
                (name.clone(), None)
            }
            None => {
                let name = generate_database_name();
                match EphemeralDatabase::create(engine, name.clone(), &self.emitter).await {
                    Ok(db) => (name, Some(db)),
                    Err(e) => {
                        let teardown = guard.release(&self.emitter);
                        return self.outcome(executor, None, Err(e.with_teardown(teardown)));
                    }
                }
            }
        };

        executor.start();
        let result = match FlowContext::from_config(&self.config, &database) {
            Ok(mut context) => {
                tokio::select! {
                    result = runner::run_suite(&mut executor, &mut context) => result,
                    Ok(()) = tokio::signal::ctrl_c() => Err(HarnessError::Interrupted),
                }
            }
            Err(e) => Err(e),
        };
        executor.finish();

        let mut teardown = Vec::new();
        if let Some(db) = ephemeral {
            teardown.extend(db.release(&self.emitter).await);
        }
        teardown.extend(guard.release(&self.emitter));

        let result = match result {
            Ok(()) if teardown.is_empty() => Ok(()),
            Ok(()) => Err(HarnessError::provisioning(format!(
                "teardown failed: {}",
                teardown.join("; ")
            ))),
            Err(e) => Err(e.with_teardown(teardown)),
        };

        self.outcome(executor, Some(database), result)
    }

    fn outcome(
        &self,
        executor: FlowExecutor,
        database: Option<String>,
        result: HarnessResult<()>,
    ) -> RunOutcome {
        RunOutcome {
            database,
            report: executor.state().to_report(),
            result,
        }
    }
}

/// Run the whole harness for `config`, printing progress to the console and
/// writing reports when asked to.
pub async fn run_tests(config: RunConfig) -> anyhow::Result<()> {
    use crate::report;
    use crate::runner::ConsoleEventListener;

    let (emitter, receiver) = EventEmitter::new();
    let listener = tokio::spawn(ConsoleEventListener::listen(receiver));

    let engine = engine_for(&config);
    let provisioner = Provisioner::new(config, emitter);
    let outcome = provisioner.run(engine).await;

    let Provisioner { config, emitter } = provisioner;
    drop(emitter);
    let _ = listener.await;

    if config.report {
        let results = report::build_results(outcome.report, config.dbms, outcome.database);
        if let Err(e) = report::write_reports(&results, &config.output_dir) {
            warn!("Failed to write reports to {}: {}", config.output_dir.display(), e);
        }
    }

    outcome.result.map_err(anyhow::Error::from)
}

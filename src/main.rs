use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use webbase_tester::provision::clean_artifacts;
use webbase_tester::utils::config::{DbmsKind, RunConfig, DEFAULT_APP_ROOT, DEFAULT_BASE_URL};
use webbase_tester::{generate_report, run_tests};

#[derive(Parser)]
#[command(name = "webbase-tester")]
#[command(author = "NL Team")]
#[command(version = "0.1.3")]
#[command(about = "Web-Base database test suite", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install Web-Base into a fresh database and exercise its API
    Run {
        /// The dbms to set up (mysql, postgres)
        dbms: DbmsKind,

        /// Username used for connecting to the dbms
        #[arg(short, long, default_value = "root")]
        username: String,

        /// Password used for connecting to the dbms
        #[arg(short, long, default_value = "")]
        password: String,

        /// Host the dbms is running on
        #[arg(short = 'H', long, default_value = "localhost")]
        host: String,

        /// Port the dbms is running on (default depends on dbms)
        #[arg(short = 'P', long)]
        port: Option<u16>,

        /// Existing database to install into. Randomly named and created if omitted
        #[arg(short, long)]
        database: Option<String>,

        /// Delete existing configuration files
        #[arg(long, default_value = "false")]
        force: bool,

        /// URL the application is served at
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        url: String,

        /// Application checkout the configuration files are written to
        #[arg(long, default_value = DEFAULT_APP_ROOT)]
        app_root: PathBuf,

        /// Output directory for reports
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Generate reports (JSON, JUnit)
        #[arg(long, default_value = "false")]
        report: bool,
    },

    /// Delete configuration files left behind by an earlier run
    Clean {
        #[arg(long, default_value = DEFAULT_APP_ROOT)]
        app_root: PathBuf,
    },

    /// Generate report from saved run results
    Report {
        /// Path to results.json
        results: PathBuf,

        /// Output format (json, junit)
        #[arg(short, long, default_value = "junit")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            dbms,
            username,
            password,
            host,
            port,
            database,
            force,
            url,
            app_root,
            output,
            report,
        } => {
            let mut config = RunConfig::new(dbms);
            config.username = username;
            config.password = password;
            config.host = host;
            config.port = port.unwrap_or_else(|| dbms.default_port());
            config.database = database;
            config.force = force;
            config.base_url = url;
            config.app_root = app_root;
            config.output_dir = output;
            config.report = report;

            println!(
                "{} Testing {} against {}",
                "▶".green().bold(),
                "Web-Base".bold(),
                config.base_url.cyan()
            );
            println!(
                "  DBMS: {} at {}:{}",
                config.dbms.to_string().cyan(),
                config.host,
                config.port
            );
            match &config.database {
                Some(name) => println!("  Database: {}", name.cyan()),
                None => println!("  Database: {}", "temporary".yellow()),
            }
            println!("  App root: {}", config.app_root.display().to_string().cyan());
            if config.force {
                println!("  Force: {}", "Enabled".yellow());
            }
            if config.report {
                println!(
                    "  Reports: {}",
                    config.output_dir.display().to_string().green()
                );
            }

            run_tests(config).await?;
            println!("{} All flows passed", "✅".green());
        }

        Commands::Clean { app_root } => {
            let removed = clean_artifacts(&app_root)?;
            if removed.is_empty() {
                println!("{} No configuration files found.", "ℹ".blue());
            }
            for path in removed {
                println!("{} Deleted {}", "✓".green(), path.display());
            }
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            generate_report(&results, &format, output.as_deref())?;
        }
    }

    Ok(())
}

pub mod json;
pub mod junit;
pub mod types;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::runner::RunReport;
use crate::utils::config::DbmsKind;

pub use types::TestResults;

pub fn build_results(report: RunReport, dbms: DbmsKind, database: Option<String>) -> TestResults {
    TestResults {
        session_id: report.session_id,
        dbms: dbms.to_string(),
        database,
        flows: report.flows,
        summary: report.summary,
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Write the JSON and JUnit reports for a run
pub fn write_reports(results: &TestResults, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    Ok(vec![
        json::write_report(results, output_dir)?,
        junit::write_report(results, output_dir)?,
    ])
}

/// Re-render a saved `results.json` in another format
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let results = json::read_results(results_path)?;

    let rendered = match format {
        "json" => serde_json::to_string_pretty(&results)?,
        "junit" => junit::generate_junit_xml(&results)?,
        _ => anyhow::bail!("Unknown format: {}", format),
    };

    if let Some(path) = output {
        std::fs::write(path, rendered)?;
        println!("Report saved to: {}", path.display());
    } else {
        println!("{}", rendered);
    }
    Ok(())
}

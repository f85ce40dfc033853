use super::types::TestResults;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Write `results.json` into `output_dir`
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(results)?;
    let path = output_dir.join("results.json");
    std::fs::write(&path, json)?;
    println!("    Generated JSON report: {}", path.display());
    Ok(path)
}

pub fn read_results(path: &Path) -> Result<TestResults> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

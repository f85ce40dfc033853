use crate::runner::state::{FlowStateReport, TestSummary};
use serde::{Deserialize, Serialize};

/// Run results for report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub session_id: String,
    pub dbms: String,
    pub database: Option<String>,
    pub flows: Vec<FlowStateReport>,
    pub summary: TestSummary,
    pub generated_at: String,
}

use super::types::TestResults;
use crate::runner::state::{FlowStateReport, StepStateReport, StepStatus};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::{Path, PathBuf};

fn seconds(ms: Option<u64>) -> String {
    (ms.unwrap_or(0) as f64 / 1000.0).to_string()
}

/// Generate JUnit XML report string from TestResults.
///
/// One `<testsuite>` per flow, one `<testcase>` per step.
pub fn generate_junit_xml(results: &TestResults) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = &results.summary;
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "webbase-tester-run"));
    suites_start.push_attribute(("tests", summary.total_steps.to_string().as_str()));
    suites_start.push_attribute(("failures", summary.failed.to_string().as_str()));
    suites_start.push_attribute(("skipped", summary.skipped.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(summary.total_duration_ms).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    for flow in &results.flows {
        write_test_suite(&mut writer, flow, results)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_suite<W: std::io::Write>(
    writer: &mut Writer<W>,
    flow: &FlowStateReport,
    results: &TestResults,
) -> Result<()> {
    let failures = flow
        .steps
        .iter()
        .filter(|s| matches!(s.status, StepStatus::Failed { .. }))
        .count();
    let skipped = flow
        .steps
        .iter()
        .filter(|s| matches!(s.status, StepStatus::Skipped { .. }))
        .count();

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", flow.flow_name.as_str()));
    suite_start.push_attribute(("tests", flow.steps.len().to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_start.push_attribute(("id", results.session_id.as_str()));
    suite_start.push_attribute(("time", seconds(flow.total_duration_ms).as_str()));
    suite_start.push_attribute(("timestamp", results.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for step in &flow.steps {
        write_test_case(writer, &flow.flow_name, step)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    flow_name: &str,
    step: &StepStateReport,
) -> Result<()> {
    let classname = format!("webbase.{}", flow_name.to_lowercase());
    let name = step.description.trim_end_matches('…');

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", name));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute(("time", seconds(step.duration_ms).as_str()));
    writer.write_event(Event::Start(case_start))?;

    match &step.status {
        StepStatus::Failed { error, kind } => {
            let headline = error.lines().next().unwrap_or("Unknown error");
            let kind = if kind.is_empty() { "Failure" } else { kind.as_str() };
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", headline));
            fail_start.push_attribute(("type", kind));
            writer.write_event(Event::Start(fail_start))?;
            writer.write_event(Event::Text(BytesText::new(error)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        StepStatus::Skipped { reason } => {
            let mut skipped = BytesStart::new("skipped");
            skipped.push_attribute(("message", reason.as_str()));
            writer.write_event(Event::Empty(skipped))?;
        }
        _ => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write `junit.xml` into `output_dir`
pub fn write_report(results: &TestResults, output_dir: &Path) -> Result<PathBuf> {
    let xml = generate_junit_xml(results)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(path)
}

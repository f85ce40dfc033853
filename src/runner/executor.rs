use log::debug;
use std::time::Instant;
use uuid::Uuid;

use super::events::{EventEmitter, TestEvent};
use super::flow::Flow;
use super::state::{FlowState, RunState, StepState, StepStatus, TestSummary};
use crate::error::HarnessResult;

const SKIP_REASON: &str = "previous step failed";

/// Runs flows one after another and records what happened.
///
/// The executor never swallows a step failure: the first `Err` a step returns
/// is recorded, the remaining steps are marked skipped and the error is
/// handed back to the caller unchanged.
pub struct FlowExecutor {
    emitter: EventEmitter,
    session: RunState,
}

impl FlowExecutor {
    pub fn new(emitter: EventEmitter) -> Self {
        Self {
            emitter,
            session: RunState::new(&Uuid::new_v4().to_string()),
        }
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub fn state(&self) -> &RunState {
        &self.session
    }

    pub fn start(&mut self) {
        self.session.start();
        self.emitter.emit(TestEvent::SessionStarted {
            session_id: self.session.session_id.clone(),
        });
    }

    /// Run every step of `flow` against `context`, stopping at the first failure
    pub async fn run_flow<C>(&mut self, flow: &Flow<C>, context: &mut C) -> HarnessResult<()> {
        let steps = flow
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| StepState::new(i, step.description))
            .collect();
        let mut state = FlowState::new(flow.name(), steps);
        state.start();

        self.emitter.emit(TestEvent::FlowStarted {
            flow_name: flow.name().to_string(),
            step_count: flow.len(),
        });

        let mut outcome = Ok(());
        for (index, step) in flow.steps().iter().enumerate() {
            self.emitter.emit(TestEvent::StepStarted {
                flow_name: flow.name().to_string(),
                index,
                description: step.description.to_string(),
            });
            state.steps[index].start();
            let started = Instant::now();

            let result = step.run(context).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(()) => {
                    state.steps[index].pass();
                    self.emitter.emit(TestEvent::StepPassed {
                        flow_name: flow.name().to_string(),
                        index,
                        duration_ms,
                    });
                }
                Err(e) => {
                    debug!("{} step {} failed: {:?}", flow.name(), index, e);
                    let message = e.to_string();
                    state.steps[index].fail(message.clone(), e.kind());
                    state.error = Some(message.clone());
                    self.emitter.emit(TestEvent::StepFailed {
                        flow_name: flow.name().to_string(),
                        index,
                        error: message,
                        duration_ms,
                    });

                    state.skip_after(index, SKIP_REASON);
                    for skipped in &state.steps[index + 1..] {
                        if let StepStatus::Skipped { reason } = &skipped.status {
                            self.emitter.emit(TestEvent::StepSkipped {
                                flow_name: flow.name().to_string(),
                                index: skipped.index,
                                reason: format!("{} ({})", skipped.description, reason),
                            });
                        }
                    }

                    outcome = Err(e);
                    break;
                }
            }
        }

        state.finish();
        self.emitter.emit(TestEvent::FlowFinished {
            flow_name: flow.name().to_string(),
            status: state.status.clone(),
            duration_ms: state.total_duration_ms,
        });
        self.session.add_flow(state);

        outcome
    }

    /// Register a flow that never got to run because an earlier one failed
    pub fn skip_flow<C>(&mut self, flow: &Flow<C>, reason: &str) {
        let steps = flow
            .steps()
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let mut s = StepState::new(i, step.description);
                s.skip(reason.to_string());
                s
            })
            .collect();
        let mut state = FlowState::new(flow.name(), steps);
        state.error = Some(reason.to_string());
        state.finish();
        self.session.add_flow(state);
    }

    pub fn finish(&mut self) -> TestSummary {
        self.session.finish();
        let summary = self.session.summary();
        self.emitter.emit(TestEvent::SessionFinished {
            summary: summary.clone(),
        });
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarnessError;
    use crate::runner::flow::StepFuture;
    use crate::runner::state::FlowStatus;

    fn first<'a>(log: &'a mut Vec<&'static str>) -> StepFuture<'a> {
        Box::pin(async move {
            log.push("first");
            Ok(())
        })
    }

    fn second<'a>(log: &'a mut Vec<&'static str>) -> StepFuture<'a> {
        Box::pin(async move {
            log.push("second");
            Ok(())
        })
    }

    fn failing<'a>(log: &'a mut Vec<&'static str>) -> StepFuture<'a> {
        Box::pin(async move {
            log.push("failing");
            Err(HarnessError::assertion("expected success"))
        })
    }

    #[tokio::test]
    async fn test_steps_run_in_registration_order() {
        let flow = Flow::new("Ordered")
            .step("one", second)
            .step("two", first)
            .step("three", second);
        let mut executor = FlowExecutor::new(EventEmitter::default());
        let mut log = Vec::new();

        executor.run_flow(&flow, &mut log).await.unwrap();

        assert_eq!(log, vec!["second", "first", "second"]);
        assert_eq!(executor.state().flows[0].status, FlowStatus::Passed);
    }

    #[tokio::test]
    async fn test_first_failure_aborts_flow() {
        let flow = Flow::new("Aborting")
            .step("one", first)
            .step("two", failing)
            .step("three", second);
        let mut executor = FlowExecutor::new(EventEmitter::default());
        let mut log = Vec::new();

        let err = executor.run_flow(&flow, &mut log).await.unwrap_err();

        assert!(matches!(err, HarnessError::Assertion(_)));
        assert_eq!(log, vec!["first", "failing"]);

        let state = &executor.state().flows[0];
        assert_eq!(state.status, FlowStatus::Failed);
        assert_eq!(state.steps[0].status, StepStatus::Passed);
        assert!(matches!(state.steps[1].status, StepStatus::Failed { .. }));
        assert!(matches!(state.steps[2].status, StepStatus::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_progress_events_wrap_each_step() {
        let flow = Flow::new("Events").step("one", first).step("two", failing);
        let emitter = EventEmitter::default();
        let mut rx = emitter.subscribe();
        let mut executor = FlowExecutor::new(emitter);
        let mut log = Vec::new();

        let _ = executor.run_flow(&flow, &mut log).await;

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                TestEvent::FlowStarted { .. } => "flow-start",
                TestEvent::StepStarted { .. } => "start",
                TestEvent::StepPassed { .. } => "done",
                TestEvent::StepFailed { .. } => "failed",
                TestEvent::FlowFinished { .. } => "flow-end",
                _ => "other",
            });
        }
        assert_eq!(
            kinds,
            vec!["flow-start", "start", "done", "start", "failed", "flow-end"]
        );
    }

    #[test]
    fn test_skipped_flow_is_recorded() {
        let flow = Flow::new("Later").step("one", first).step("two", second);
        let mut executor = FlowExecutor::new(EventEmitter::default());

        executor.skip_flow(&flow, "install flow failed");
        let summary = executor.finish();

        assert_eq!(summary.total_flows, 1);
        assert_eq!(summary.skipped, 2);
        assert_eq!(executor.state().flows[0].status, FlowStatus::Failed);
    }
}

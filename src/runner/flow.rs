//! Ordered step registry.
//!
//! A [`Flow`] is an ordered list of described actions over a shared context.
//! Later steps rely on the side effects of earlier ones, so a flow is always
//! executed front to back and never continues past a failing step.

use futures::future::BoxFuture;

use crate::error::HarnessResult;

pub type StepFuture<'a> = BoxFuture<'a, HarnessResult<()>>;

/// A step action borrows the flow context for the duration of the step
pub type StepAction<C> = for<'a> fn(&'a mut C) -> StepFuture<'a>;

pub struct FlowStep<C> {
    pub description: &'static str,
    action: StepAction<C>,
}

impl<C> FlowStep<C> {
    pub fn run<'a>(&self, context: &'a mut C) -> StepFuture<'a> {
        (self.action)(context)
    }
}

pub struct Flow<C> {
    name: &'static str,
    steps: Vec<FlowStep<C>>,
}

impl<C> Flow<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    /// Append a step. Steps run in the order they are registered.
    pub fn step(mut self, description: &'static str, action: StepAction<C>) -> Self {
        self.steps.push(FlowStep {
            description,
            action,
        });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &[FlowStep<C>] {
        &self.steps
    }

    pub fn descriptions(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.description).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

pub mod context;
pub mod events;
pub mod executor;
pub mod flow;
pub mod state;

pub use context::{DatabaseSettings, FlowContext};
pub use events::*;
pub use executor::FlowExecutor;
pub use flow::{Flow, FlowStep, StepAction, StepFuture};
pub use state::*;

use crate::error::HarnessResult;
use crate::flows;

/// Run the install flow, then the API flow, over one shared context.
///
/// Stops at the first failing step; a flow that never ran is still recorded
/// so the report lists it.
pub async fn run_suite(executor: &mut FlowExecutor, context: &mut FlowContext) -> HarnessResult<()> {
    let install = flows::install::flow();
    let api = flows::api::flow();

    if let Err(e) = executor.run_flow(&install, context).await {
        executor.skip_flow(&api, "install flow failed");
        return Err(e);
    }

    executor.run_flow(&api, context).await
}

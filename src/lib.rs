pub mod client;
pub mod error;
pub mod flows;
pub mod provision;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use error::{HarnessError, HarnessResult};
pub use provision::run_tests;
pub use report::generate_report;
pub use utils::config::{DbmsKind, RunConfig};
